//! Trivy Zarf Runtime - per-image scanning of Zarf packages.
//!
//! This crate splits the combined OCI layout of a Zarf package into
//! single-image layouts, runs the vulnerability scanner over each one and
//! aggregates the outcomes.

#![allow(clippy::result_large_err)]

pub mod oci;
pub mod orchestrator;
pub mod package;
pub mod scan;

#[cfg(test)]
mod test_support;

// Re-export common types
pub use oci::{load_index, resolve_name, ContentIsolator, ImageIndex, Isolate, IsolatedLayout};
pub use orchestrator::{ImageScans, Orchestrator, RunSummary, ScanOutcome};
pub use package::{PackageReference, PackageScanner, PackageTool, PullOptions, ZarfCli};
pub use scan::{sanitize_filename, ReportFormat, ScanDispatcher, ScanReport, ScanRequest};
pub use scan::{TrivyCli, VulnScanner};

/// Trivy Zarf runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
