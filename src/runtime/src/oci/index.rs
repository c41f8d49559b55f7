//! Combined image index loading.
//!
//! A Zarf package stores every image it carries in one OCI layout whose
//! `index.json` lists one descriptor per image. This module reads that
//! document and derives the single-entry indices written into isolated
//! layouts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trivy_zarf_core::error::{Result, ZarfError};

/// One manifest entry of an image index.
pub type ManifestDescriptor = oci_spec::image::Descriptor;

/// File name of the index document inside a layout.
pub const INDEX_FILE: &str = "index.json";

/// File name of the OCI layout marker.
pub const OCI_LAYOUT_FILE: &str = "oci-layout";

/// Directory holding content-addressed blobs.
pub const BLOBS_DIR: &str = "blobs";

/// Image index as found in `index.json`.
///
/// Manifest order is preserved and is the scan order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    /// Schema version marker, copied verbatim into derived indices
    pub schema_version: u32,

    /// Optional index media type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Image descriptors
    pub manifests: Vec<ManifestDescriptor>,

    /// Index-level annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<HashMap<String, String>>,
}

impl ImageIndex {
    /// Build the single-entry index for one descriptor of this index.
    ///
    /// Schema version and media type are kept; index annotations describe the
    /// combined package and are dropped.
    pub fn single(&self, descriptor: &ManifestDescriptor) -> ImageIndex {
        ImageIndex {
            schema_version: self.schema_version,
            media_type: self.media_type.clone(),
            manifests: vec![descriptor.clone()],
            annotations: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }
}

/// Path of the index document inside a layout directory.
pub fn index_path(layout_dir: &Path) -> PathBuf {
    layout_dir.join(INDEX_FILE)
}

/// Load and validate a combined index document.
///
/// An index without manifests is valid and yields an empty [`ImageIndex`].
pub fn load_index(path: &Path) -> Result<ImageIndex> {
    if !path.is_file() {
        return Err(ZarfError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ZarfError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ZarfError::IoError(e),
    })?;

    let index: ImageIndex =
        serde_json::from_slice(&content).map_err(|e| ZarfError::MalformedIndex {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    tracing::debug!(
        path = %path.display(),
        schema_version = index.schema_version,
        manifests = index.manifests.len(),
        "Loaded image index"
    );

    Ok(index)
}
