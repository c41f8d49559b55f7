//! From package reference to per-image scan summary.

use std::path::PathBuf;
use std::sync::Arc;

use trivy_zarf_core::error::{Result, ZarfError};
use trivy_zarf_core::ScanSettings;

use super::{PackageReference, PackageTool, PullOptions};
use crate::oci::ContentIsolator;
use crate::orchestrator::{Orchestrator, RunSummary};
use crate::scan::VulnScanner;

const WORK_DIR_PREFIX: &str = "trivy-zarf-";
const IMAGES_DIR: &str = "images";

/// Scans every image of a Zarf package.
pub struct PackageScanner {
    settings: ScanSettings,
    tool: Box<dyn PackageTool>,
    scanner: Arc<dyn VulnScanner>,
    work_dir: Option<PathBuf>,
}

impl PackageScanner {
    pub fn new(
        settings: ScanSettings,
        tool: Box<dyn PackageTool>,
        scanner: Arc<dyn VulnScanner>,
    ) -> Self {
        Self {
            settings,
            tool,
            scanner,
            work_dir: None,
        }
    }

    /// Allocate scratch directories under `dir` instead of the system temp dir.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Resolve, unpack and scan `reference`.
    ///
    /// Per-image failures are reported in the summary; package-level problems
    /// are returned as errors. The scratch directory is removed on return.
    pub fn scan(&self, reference: &str) -> Result<RunSummary> {
        if let Some(output) = &self.settings.output {
            std::fs::create_dir_all(output).map_err(|e| ZarfError::WriteFailed {
                path: output.clone(),
                message: format!("failed to create output directory: {}", e),
            })?;
        }

        let reference = PackageReference::parse(reference)?;
        let scratch = self.scratch_dir()?;
        tracing::debug!(path = %scratch.path().display(), "Created working directory");

        let archive = match &reference {
            PackageReference::Remote(oci_ref) => {
                let pull_dir = scratch.path().join("pull");
                std::fs::create_dir_all(&pull_dir)?;
                let options = PullOptions {
                    skip_signature_validation: self.settings.skip_signature_validation,
                    arch: self.settings.arch.clone(),
                };
                self.tool.pull(oci_ref, &pull_dir, &options)?
            }
            PackageReference::Local(path) => path.clone(),
        };

        if !archive.is_file() {
            return Err(ZarfError::PackageNotFound(archive));
        }

        let extract_dir = scratch.path().join("package");
        std::fs::create_dir_all(&extract_dir)?;
        tracing::info!(package = %archive.display(), "Decompressing Zarf package");
        self.tool.decompress(&archive, &extract_dir)?;

        let images_dir = extract_dir.join(IMAGES_DIR);
        if !images_dir.is_dir() {
            return Err(ZarfError::ImagesDirMissing(images_dir));
        }

        let orchestrator = Orchestrator::new(
            self.settings.clone(),
            Box::new(ContentIsolator::new()),
            Arc::clone(&self.scanner),
        );
        let summary = orchestrator.scan_layout(&images_dir);

        if let Err(e) = scratch.close() {
            tracing::warn!(error = %e, "Failed to remove working directory");
        }
        summary
    }

    fn scratch_dir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORK_DIR_PREFIX);
        let dir = match &self.work_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.map_err(|e| ZarfError::WriteFailed {
            path: self.work_dir.clone().unwrap_or_else(std::env::temp_dir),
            message: format!("failed to create working directory: {}", e),
        })
    }
}

impl std::fmt::Debug for PackageScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageScanner")
            .field("settings", &self.settings)
            .field("work_dir", &self.work_dir)
            .finish_non_exhaustive()
    }
}
