//! Sequential per-image scan orchestration.
//!
//! A run loads the combined index, then for every descriptor in order:
//! isolates a single-image layout, resolves a display name, dispatches the
//! scan and records the outcome. A failing image never stops the run; the
//! aggregate is decided only after every descriptor was attempted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use trivy_zarf_core::error::{ImageFailure, Result, ZarfError};
use trivy_zarf_core::ScanSettings;

use crate::oci::{
    index_path, load_index, resolve_name, ImageIndex, Isolate, ManifestDescriptor,
};
use crate::scan::{ScanDispatcher, VulnScanner};

const BANNER_RULE: &str = "==================================================";

/// Outcome of one descriptor.
#[derive(Debug)]
pub struct ScanOutcome {
    descriptor: ManifestDescriptor,
    name: String,
    report: Option<PathBuf>,
    error: Option<ZarfError>,
}

impl ScanOutcome {
    pub fn descriptor(&self) -> &ManifestDescriptor {
        &self.descriptor
    }

    /// Resolved display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn digest(&self) -> &str {
        self.descriptor.digest()
    }

    /// JSON report written for this image, if any.
    pub fn report(&self) -> Option<&Path> {
        self.report.as_deref()
    }

    pub fn error(&self) -> Option<&ZarfError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn failure(&self) -> Option<ImageFailure> {
        self.error.as_ref().map(|e| ImageFailure {
            image: self.name.clone(),
            digest: self.digest().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Every outcome of a run, in index order.
#[derive(Debug, Default)]
pub struct RunSummary {
    outcomes: Vec<ScanOutcome>,
}

impl RunSummary {
    pub fn new(outcomes: Vec<ScanOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[ScanOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Failed images with their reasons.
    pub fn failures(&self) -> Vec<ImageFailure> {
        self.outcomes.iter().filter_map(ScanOutcome::failure).collect()
    }

    /// Succeed only when no image failed.
    pub fn into_result(self) -> Result<Self> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(ZarfError::ImagesFailed(failures))
        }
    }
}

/// Splits a combined layout and scans its images one at a time.
pub struct Orchestrator {
    settings: ScanSettings,
    isolator: Box<dyn Isolate>,
    dispatcher: ScanDispatcher,
}

impl Orchestrator {
    pub fn new(
        settings: ScanSettings,
        isolator: Box<dyn Isolate>,
        scanner: Arc<dyn VulnScanner>,
    ) -> Self {
        let dispatcher = ScanDispatcher::new(scanner, Some(settings.db_repository.clone()));
        Self {
            settings,
            isolator,
            dispatcher,
        }
    }

    /// Scan every image of the layout at `layout_dir`.
    ///
    /// Only index errors are returned as `Err`; per-image failures are kept in
    /// the summary.
    pub fn scan_layout(&self, layout_dir: &Path) -> Result<RunSummary> {
        let index = load_index(&index_path(layout_dir))?;

        if index.is_empty() {
            tracing::info!("No images found in the Zarf package");
            return Ok(RunSummary::default());
        }

        tracing::info!(count = index.len(), "Found images to scan");
        let summary = RunSummary::new(self.scans(layout_dir, &index).collect());

        tracing::info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Finished scanning images"
        );
        Ok(summary)
    }

    /// Like [`Orchestrator::scan_layout`], failing if any image failed.
    pub fn run(&self, layout_dir: &Path) -> Result<RunSummary> {
        self.scan_layout(layout_dir)?.into_result()
    }

    /// Iterate over the descriptors of `index`, scanning one per step.
    pub fn scans<'a>(&'a self, store_root: &'a Path, index: &'a ImageIndex) -> ImageScans<'a> {
        ImageScans {
            orchestrator: self,
            store_root,
            index,
            position: 0,
        }
    }

    fn scan_one(
        &self,
        store_root: &Path,
        index: &ImageIndex,
        descriptor: &ManifestDescriptor,
    ) -> ScanOutcome {
        let name = resolve_name(descriptor);
        let output_dir = self.settings.output.as_deref();

        if output_dir.is_none() {
            println!("\n{}", BANNER_RULE);
            println!("Scanning image: {}", name);
            println!("Media type: {}", descriptor.media_type());
            println!("{}", BANNER_RULE);
        }
        tracing::info!(image = %name, digest = %descriptor.digest(), "Scanning image");

        let result = self
            .isolator
            .isolate(store_root, index, descriptor)
            .and_then(|layout| {
                let scanned = self.dispatcher.dispatch(&layout, &name, output_dir);
                let layout_dir = layout.path().to_path_buf();
                if let Err(e) = layout.close() {
                    tracing::warn!(
                        layout = %layout_dir.display(),
                        error = %e,
                        "Failed to remove isolated layout"
                    );
                }
                scanned
            });

        match result {
            Ok(report) => ScanOutcome {
                descriptor: descriptor.clone(),
                name,
                report,
                error: None,
            },
            Err(e) => {
                tracing::warn!(image = %name, error = %e, "Image scan failed");
                ScanOutcome {
                    descriptor: descriptor.clone(),
                    name,
                    report: None,
                    error: Some(e),
                }
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Yields one [`ScanOutcome`] per descriptor, in index order.
pub struct ImageScans<'a> {
    orchestrator: &'a Orchestrator,
    store_root: &'a Path,
    index: &'a ImageIndex,
    position: usize,
}

impl Iterator for ImageScans<'_> {
    type Item = ScanOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let descriptor = self.index.manifests.get(self.position)?;
        self.position += 1;
        Some(
            self.orchestrator
                .scan_one(self.store_root, self.index, descriptor),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.manifests.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}
