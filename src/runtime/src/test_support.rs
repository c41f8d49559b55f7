//! Fixtures and capability fakes shared by unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use trivy_zarf_core::error::{Result, ZarfError};

use crate::oci::{index_path, load_index, ImageIndex, ManifestDescriptor};
use crate::scan::{ReportFormat, ScanReport, ScanRequest, VulnScanner};

/// Build a manifest descriptor with the given digest and annotations.
pub fn descriptor(digest: &str, annotations: &[(&str, &str)]) -> ManifestDescriptor {
    let mut value = serde_json::json!({
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "digest": digest,
        "size": 1024,
    });
    if !annotations.is_empty() {
        let map: serde_json::Map<String, serde_json::Value> = annotations
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect();
        value["annotations"] = serde_json::Value::Object(map);
    }
    serde_json::from_value(value).unwrap()
}

/// Write a combined OCI layout containing one blob per descriptor.
pub fn write_layout(dir: &Path, manifests: &[ManifestDescriptor]) -> ImageIndex {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("oci-layout"), r#"{"imageLayoutVersion":"1.0.0"}"#).unwrap();
    for manifest in manifests {
        let path = blob_path(dir, manifest.digest());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("manifest {}", manifest.digest())).unwrap();
    }

    let index = ImageIndex {
        schema_version: 2,
        media_type: Some("application/vnd.oci.image.index.v1+json".to_string()),
        manifests: manifests.to_vec(),
        annotations: None,
    };
    std::fs::write(index_path(dir), serde_json::to_vec(&index).unwrap()).unwrap();
    index
}

/// Location of a blob inside a layout.
pub fn blob_path(layout: &Path, digest: &str) -> PathBuf {
    let (algorithm, hash) = digest.split_once(':').unwrap_or(("sha256", digest));
    layout.join("blobs").join(algorithm).join(hash)
}

/// What the fake scanner observed for one invocation.
#[derive(Debug, Clone)]
pub struct ScanCall {
    pub layout: PathBuf,
    pub format: ReportFormat,
    pub db_repository: Option<String>,
    pub index: ImageIndex,
    pub blob_present: bool,
}

/// Scanner fake that inspects the layout it is handed.
#[derive(Debug, Default)]
pub struct RecordingScanner {
    calls: Mutex<Vec<ScanCall>>,
    fail_digests: Vec<String>,
}

impl RecordingScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every scan whose sole manifest has `digest`.
    pub fn failing_on(digest: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_digests: vec![digest.to_string()],
        }
    }

    pub fn calls(&self) -> Vec<ScanCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl VulnScanner for RecordingScanner {
    fn scan(&self, layout_dir: &Path, request: &ScanRequest) -> Result<ScanReport> {
        let index = load_index(&index_path(layout_dir))?;
        let digest = index
            .manifests
            .first()
            .map(|d| d.digest().to_string())
            .unwrap_or_default();
        let blob_present = blob_path(layout_dir, &digest).is_file();

        self.calls.lock().unwrap().push(ScanCall {
            layout: layout_dir.to_path_buf(),
            format: request.format,
            db_repository: request.db_repository.clone(),
            index,
            blob_present,
        });

        if self.fail_digests.contains(&digest) {
            return Err(ZarfError::ScanFailed {
                image: layout_dir.display().to_string(),
                detail: "simulated scanner failure".to_string(),
            });
        }

        match request.format {
            ReportFormat::Json => Ok(ScanReport::Json(serde_json::json!({
                "SchemaVersion": 2,
                "ArtifactName": layout_dir.display().to_string(),
                "Metadata": { "ImageID": digest },
                "Results": [],
            }))),
            ReportFormat::Table => Ok(ScanReport::Streamed),
        }
    }
}
