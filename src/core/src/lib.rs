//! Trivy Zarf Core - Shared Types
//!
//! Error taxonomy, layered configuration and logging setup used by the
//! runtime and the command-line front end.

pub mod config;
pub mod error;
pub mod log;

// Re-export commonly used types
pub use config::{LogLevel, PluginConfig, ScanSettings, ToolSettings};
pub use error::{ImageFailure, Result, ZarfError};
pub use log::{LogFormat, LogSettings};

/// Trivy Zarf plugin version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
