use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZarfError};
use crate::log::{LogFormat, LogSettings};

/// Prefix for every environment variable the plugin reads.
pub const ENV_PREFIX: &str = "TRIVY_PLUGIN_ZARF";

/// File name searched in the home directory when no config is given.
pub const DEFAULT_CONFIG_NAME: &str = ".trivy_plugin_zarf.yaml";

/// Default vulnerability database repository handed to Trivy.
pub const DEFAULT_DB_REPOSITORY: &str = "ghcr.io/aquasecurity/trivy-db";

/// Plugin configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    /// Log level
    pub log_level: LogLevel,

    /// Log output format
    pub log_format: LogFormat,

    /// Disable colorized log output
    pub no_color: bool,

    /// Scan settings
    pub scan: ScanSettings,

    /// External tool locations
    pub tools: ToolSettings,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Console,
            no_color: false,
            scan: ScanSettings::default(),
            tools: ToolSettings::default(),
        }
    }
}

/// Settings threaded into every scan run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScanSettings {
    /// Trivy DB repository
    pub db_repository: String,

    /// Directory for per-image JSON reports; stdout when unset
    #[serde(deserialize_with = "empty_as_none")]
    pub output: Option<PathBuf>,

    /// Skip signature validation when pulling from an OCI registry
    pub skip_signature_validation: bool,

    /// Architecture to pull; host architecture when unset
    #[serde(deserialize_with = "empty_as_none")]
    pub arch: Option<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            db_repository: DEFAULT_DB_REPOSITORY.to_string(),
            output: None,
            skip_signature_validation: false,
            arch: None,
        }
    }
}

/// Paths or names of the external executables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ToolSettings {
    pub zarf: PathBuf,
    pub trivy: PathBuf,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            zarf: PathBuf::from("zarf"),
            trivy: PathBuf::from("trivy"),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown log level: '{}' (supported: debug, info, warn, error)",
                other
            )),
        }
    }
}

impl PluginConfig {
    /// Read a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ZarfError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            ZarfError::ConfigError(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load the configuration file layer.
    ///
    /// An explicit path must exist. Without one, `$HOME/.trivy_plugin_zarf.yaml`
    /// is used when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ZarfError::ConfigError(format!(
                    "config file does not exist: {}",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "Using config file");
            return Self::from_file(path);
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(DEFAULT_CONFIG_NAME);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "Using config file");
                return Self::from_file(&path);
            }
        }

        tracing::debug!("Not using a config file");
        Ok(Self::default())
    }

    /// Overlay `TRIVY_PLUGIN_ZARF_*` variables from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay environment values obtained through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| lookup(&format!("{}_{}", ENV_PREFIX, suffix));

        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v.parse().map_err(ZarfError::ConfigError)?;
        }
        if let Some(v) = get("LOG_FORMAT") {
            self.log_format = v.parse().map_err(ZarfError::ConfigError)?;
        }
        if let Some(v) = get("NO_COLOR") {
            self.no_color = parse_bool("NO_COLOR", &v)?;
        }
        if let Some(v) = get("SCAN_DB_REPOSITORY") {
            self.scan.db_repository = v;
        }
        if let Some(v) = get("SCAN_OUTPUT") {
            self.scan.output = non_empty(v).map(PathBuf::from);
        }
        if let Some(v) = get("SCAN_SKIP_SIGNATURE_VALIDATION") {
            self.scan.skip_signature_validation =
                parse_bool("SCAN_SKIP_SIGNATURE_VALIDATION", &v)?;
        }
        if let Some(v) = get("SCAN_ARCH") {
            self.scan.arch = non_empty(v);
        }
        if let Some(v) = get("TOOLS_ZARF") {
            self.tools.zarf = PathBuf::from(v);
        }
        if let Some(v) = get("TOOLS_TRIVY") {
            self.tools.trivy = PathBuf::from(v);
        }

        Ok(())
    }

    /// Logging settings derived from this configuration.
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.log_level,
            format: self.log_format,
            color: !self.no_color,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: From<String>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(non_empty).map(T::from))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ZarfError::ConfigError(format!(
            "{}_{}: expected a boolean, got '{}'",
            ENV_PREFIX, key, other
        ))),
    }
}
