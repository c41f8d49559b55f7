//! Vulnerability scanning of isolated layouts.

mod dispatch;
mod filename;
mod scanner;
mod trivy;

pub use dispatch::ScanDispatcher;
pub use filename::{sanitize_filename, DEFAULT_REPORT_NAME};
pub use scanner::{ReportFormat, ScanReport, ScanRequest, VulnScanner};
pub use trivy::TrivyCli;
