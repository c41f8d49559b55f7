//! CLI command definitions and dispatch.

mod scan;
mod version;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use trivy_zarf_core::config::ENV_PREFIX;
use trivy_zarf_core::{LogFormat, LogLevel, PluginConfig, Result};

pub use scan::ScanArgs;
pub use version::VersionArgs;

/// Trivy Zarf - scan the container images of a Zarf package.
#[derive(Parser, Debug)]
#[command(name = "trivy-zarf", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every command.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Config file (default: $HOME/.trivy_plugin_zarf.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: debug, info, warn, error
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format: console, json, dev, none
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan every image of a Zarf package (local path or oci:// reference)
    Scan(ScanArgs),
    /// Show version information
    Version(VersionArgs),
}

/// Layer defaults, config file, environment and global flags.
pub fn resolve_config<F>(global: &GlobalArgs, lookup: F) -> Result<PluginConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = global.config.clone().or_else(|| {
        lookup(&format!("{}_CONFIG", ENV_PREFIX))
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });

    let mut config = PluginConfig::load(config_path.as_deref())?;
    config.apply_env_from(&lookup)?;

    if let Some(level) = global.log_level {
        config.log_level = level;
    }
    if let Some(format) = global.log_format {
        config.log_format = format;
    }
    if global.no_color {
        config.no_color = true;
    }

    Ok(config)
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&cli.global, |key| std::env::var(key).ok())?;
    config.log_settings().init()?;

    match cli.command {
        Command::Scan(args) => scan::execute(args, config).await,
        Command::Version(args) => version::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_config(dir: &TempDir, yaml: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_parse_scan_minimal() {
        let cli = Cli::try_parse_from(["trivy-zarf", "scan", "pkg.tar.zst"]).unwrap();
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(args.package, "pkg.tar.zst");
                assert!(args.output.is_none());
                assert!(!args.skip_signature_validation);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scan_all_flags() {
        let cli = Cli::try_parse_from([
            "trivy-zarf",
            "scan",
            "-o",
            "results",
            "--db-repository",
            "mirror/db",
            "--skip-signature-validation",
            "-a",
            "arm64",
            "oci://ghcr.io/zarf-dev/packages/dos-games:1.2.0",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.global.log_level, Some(LogLevel::Debug));
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(args.output, Some(PathBuf::from("results")));
                assert_eq!(args.db_repository.as_deref(), Some("mirror/db"));
                assert!(args.skip_signature_validation);
                assert_eq!(args.arch.as_deref(), Some("arm64"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_before_command() {
        let cli = Cli::try_parse_from([
            "trivy-zarf",
            "--log-format",
            "json",
            "--no-color",
            "version",
        ])
        .unwrap();
        assert_eq!(cli.global.log_format, Some(LogFormat::Json));
        assert!(cli.global.no_color);
        assert!(matches!(cli.command, Command::Version(_)));
    }

    #[test]
    fn test_parse_scan_requires_package() {
        assert!(Cli::try_parse_from(["trivy-zarf", "scan"]).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["trivy-zarf", "-l", "loud", "version"]).is_err());
    }

    #[test]
    fn test_resolve_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            "log-level: warn\nlog-format: dev\nscan:\n  db-repository: from-file/db\n  arch: amd64\n",
        );
        let env = env_map(&[
            ("TRIVY_PLUGIN_ZARF_LOG_LEVEL", "error"),
            ("TRIVY_PLUGIN_ZARF_SCAN_DB_REPOSITORY", "from-env/db"),
        ]);
        let global = GlobalArgs {
            config: Some(path),
            log_level: Some(LogLevel::Debug),
            ..GlobalArgs::default()
        };

        let config = resolve_config(&global, |k| env.get(k).cloned()).unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_format, LogFormat::Dev);
        assert_eq!(config.scan.db_repository, "from-env/db");
        assert_eq!(config.scan.arch.as_deref(), Some("amd64"));
    }

    #[test]
    fn test_resolve_config_path_from_env() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "no-color: true\n");
        let env = env_map(&[("TRIVY_PLUGIN_ZARF_CONFIG", path.to_str().unwrap())]);

        let config = resolve_config(&GlobalArgs::default(), |k| env.get(k).cloned()).unwrap();
        assert!(config.no_color);
    }

    #[test]
    fn test_resolve_config_missing_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let global = GlobalArgs {
            config: Some(tmp.path().join("absent.yaml")),
            ..GlobalArgs::default()
        };
        let err = resolve_config(&global, no_env).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_config_no_color_flag() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "no-color: false\n");
        let global = GlobalArgs {
            config: Some(path),
            no_color: true,
            ..GlobalArgs::default()
        };
        let config = resolve_config(&global, no_env).unwrap();
        assert!(config.no_color);
        assert!(!config.log_settings().color);
    }

    #[tokio::test]
    async fn test_dispatch_version() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "log-format: none\n");
        let cli = Cli::try_parse_from([
            "trivy-zarf",
            "--config",
            path.to_str().unwrap(),
            "--log-format",
            "none",
            "version",
        ])
        .unwrap();
        assert!(dispatch(cli).await.is_ok());
    }
}
