//! Logging format types and subscriber setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;
use crate::error::{Result, ZarfError};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable lines (default).
    Console,
    /// One JSON object per event.
    Json,
    /// Multi-line output with source locations.
    Dev,
    /// Disable logging entirely.
    None,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Console
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Json => write!(f, "json"),
            Self::Dev => write!(f, "dev"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            "dev" => Ok(Self::Dev),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown log format: '{}' (supported: console, json, dev, none)",
                other
            )),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub color: bool,
}

impl LogSettings {
    /// Filter directive; `RUST_LOG` wins when set.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
    }

    /// Install the global subscriber. Events are written to stderr.
    ///
    /// Returns `Ok(false)` when the format is `none` and nothing was installed.
    pub fn init(&self) -> Result<bool> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr)
            .with_ansi(self.color);

        let installed = match self.format {
            LogFormat::None => return Ok(false),
            LogFormat::Console => builder.compact().with_target(false).try_init(),
            LogFormat::Json => builder.json().with_ansi(false).try_init(),
            LogFormat::Dev => builder
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .try_init(),
        };

        installed.map_err(|e| ZarfError::ConfigError(format!("failed to init logging: {}", e)))?;
        tracing::debug!(level = %self.level, format = %self.format, "logger successfully initialized");
        Ok(true)
    }
}
