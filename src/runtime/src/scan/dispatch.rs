//! Routes one isolated layout through the scanner and stores its report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use trivy_zarf_core::error::{Result, ZarfError};

use super::filename::sanitize_filename;
use super::scanner::{ReportFormat, ScanReport, ScanRequest, VulnScanner};
use crate::oci::IsolatedLayout;

/// Drives the scanner over isolated layouts.
#[derive(Clone)]
pub struct ScanDispatcher {
    scanner: Arc<dyn VulnScanner>,
    db_repository: Option<String>,
}

impl ScanDispatcher {
    pub fn new(scanner: Arc<dyn VulnScanner>, db_repository: Option<String>) -> Self {
        Self {
            scanner,
            db_repository,
        }
    }

    /// Path of the JSON report for `name` under `output_dir`.
    pub fn report_path(output_dir: &Path, name: &str) -> PathBuf {
        output_dir.join(format!("{}.json", sanitize_filename(name)))
    }

    /// Scan one layout.
    ///
    /// With `output_dir`, the JSON report is written to
    /// `<output_dir>/<sanitized name>.json` and its path returned. Without it,
    /// the scanner output goes to stdout and `None` is returned. Every error is
    /// scoped to this image.
    pub fn dispatch(
        &self,
        layout: &IsolatedLayout,
        name: &str,
        output_dir: Option<&Path>,
    ) -> Result<Option<PathBuf>> {
        let request = ScanRequest {
            format: if output_dir.is_some() {
                ReportFormat::Json
            } else {
                ReportFormat::Table
            },
            db_repository: self.db_repository.clone(),
        };

        let report = self
            .scanner
            .scan(layout.path(), &request)
            .map_err(|e| scan_failure(name, e))?;

        match (output_dir, report) {
            (Some(dir), ScanReport::Json(value)) => {
                let path = Self::report_path(dir, name);
                write_report(&path, &value)?;
                tracing::info!(image = %name, report = %path.display(), "Saved JSON results");
                Ok(Some(path))
            }
            (Some(_), ScanReport::Streamed) => Err(ZarfError::ScanFailed {
                image: name.to_string(),
                detail: "scanner streamed its output instead of returning a JSON report"
                    .to_string(),
            }),
            (None, ScanReport::Json(value)) => {
                let text = serde_json::to_string_pretty(&value)?;
                println!("{}", text);
                Ok(None)
            }
            (None, ScanReport::Streamed) => Ok(None),
        }
    }
}

impl std::fmt::Debug for ScanDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanDispatcher")
            .field("db_repository", &self.db_repository)
            .finish_non_exhaustive()
    }
}

/// Attribute a scanner error to the image by its resolved name.
fn scan_failure(name: &str, err: ZarfError) -> ZarfError {
    let detail = match err {
        ZarfError::ScanFailed { detail, .. } => detail,
        other => other.to_string(),
    };
    ZarfError::ScanFailed {
        image: name.to_string(),
        detail,
    }
}

fn write_report(path: &Path, report: &serde_json::Value) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).map_err(|e| ZarfError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    std::fs::write(path, data).map_err(|e| ZarfError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
