//! VulnScanner - Trait for vulnerability scanner backends.

use std::path::Path;

use trivy_zarf_core::error::Result;

/// Report format requested from the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable output streamed to the console.
    Table,
    /// Structured JSON report returned to the caller.
    Json,
}

/// Per-invocation scanner options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub format: ReportFormat,
    /// Vulnerability database source
    pub db_repository: Option<String>,
}

/// Result of a successful scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanReport {
    /// Output already went to the console.
    Streamed,
    /// Structured report.
    Json(serde_json::Value),
}

/// Trait for vulnerability scanner implementations.
///
/// Calls block until the scan finishes.
pub trait VulnScanner: Send + Sync {
    /// Scan the single-image OCI layout at `layout_dir`.
    fn scan(&self, layout_dir: &Path, request: &ScanRequest) -> Result<ScanReport>;
}
