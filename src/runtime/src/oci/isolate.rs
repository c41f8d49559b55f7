//! Per-image isolated OCI layouts.
//!
//! Trivy scans the first manifest of an OCI layout, so each image of a
//! combined layout gets its own short-lived copy: the shared blob tree, the
//! layout marker, and an `index.json` listing only that image.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use trivy_zarf_core::error::{Result, ZarfError};

use super::index::{ImageIndex, ManifestDescriptor, BLOBS_DIR, INDEX_FILE, OCI_LAYOUT_FILE};

/// Prefix of isolated layout directories.
const LAYOUT_DIR_PREFIX: &str = "trivy-image-";

/// Materializes a self-contained layout for one descriptor.
pub trait Isolate: Send + Sync {
    /// Create an isolated layout for `descriptor` from the layout at `store_root`.
    fn isolate(
        &self,
        store_root: &Path,
        index: &ImageIndex,
        descriptor: &ManifestDescriptor,
    ) -> Result<IsolatedLayout>;
}

/// A single-image OCI layout, removed when dropped or closed.
#[derive(Debug)]
pub struct IsolatedLayout {
    dir: TempDir,
}

impl IsolatedLayout {
    /// Root directory of the layout.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the derived `index.json`.
    pub fn index_path(&self) -> PathBuf {
        self.dir.path().join(INDEX_FILE)
    }

    /// Remove the layout directory, reporting removal errors.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Copies the blob store into a fresh temporary directory per image.
#[derive(Debug, Clone, Default)]
pub struct ContentIsolator {
    /// Parent for isolated layouts; the system temp dir when unset
    work_dir: Option<PathBuf>,
}

impl ContentIsolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate isolated layouts under `dir` instead of the system temp dir.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    fn allocate(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(LAYOUT_DIR_PREFIX);

        let created = match &self.work_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };

        created.map_err(|e| ZarfError::WriteFailed {
            path: self
                .work_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            message: format!("failed to create isolated layout directory: {}", e),
        })
    }
}

impl Isolate for ContentIsolator {
    fn isolate(
        &self,
        store_root: &Path,
        index: &ImageIndex,
        descriptor: &ManifestDescriptor,
    ) -> Result<IsolatedLayout> {
        // Dropping `dir` on any early return removes the partial layout.
        let dir = self.allocate()?;

        let blobs = store_root.join(BLOBS_DIR);
        if blobs.is_dir() {
            copy_dir_recursive(&blobs, &dir.path().join(BLOBS_DIR)).map_err(|e| {
                ZarfError::CopyFailed {
                    path: blobs.clone(),
                    source: e,
                }
            })?;
        }

        let marker = store_root.join(OCI_LAYOUT_FILE);
        if marker.is_file() {
            std::fs::copy(&marker, dir.path().join(OCI_LAYOUT_FILE))
                .map_err(|e| ZarfError::CopyFailed {
                    path: marker.clone(),
                    source: e,
                })?;
        }

        let index_path = dir.path().join(INDEX_FILE);
        let data = serde_json::to_vec(&index.single(descriptor)).map_err(|e| {
            ZarfError::WriteFailed {
                path: index_path.clone(),
                message: e.to_string(),
            }
        })?;
        std::fs::write(&index_path, data).map_err(|e| ZarfError::WriteFailed {
            path: index_path.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            digest = %descriptor.digest(),
            layout = %dir.path().display(),
            "Isolated image layout"
        );

        Ok(IsolatedLayout { dir })
    }
}

/// Recursively copy a directory.
fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
