//! `trivy-zarf scan` command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use trivy_zarf_core::{PluginConfig, ScanSettings};
use trivy_zarf_runtime::{PackageScanner, TrivyCli, ZarfCli};

use crate::output;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Zarf package: local .tar.zst path or oci:// reference
    pub package: String,

    /// Write one JSON report per image to this directory instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Trivy DB repository (default: ghcr.io/aquasecurity/trivy-db)
    #[arg(long)]
    pub db_repository: Option<String>,

    /// Skip signature validation when pulling from an OCI registry
    #[arg(long)]
    pub skip_signature_validation: bool,

    /// Architecture to pull for OCI packages (default: host architecture)
    #[arg(short, long)]
    pub arch: Option<String>,
}

impl ScanArgs {
    /// Overlay command-line values onto the resolved scan settings.
    pub fn apply(&self, settings: &mut ScanSettings) {
        if let Some(output) = &self.output {
            settings.output = Some(output.clone());
        }
        if let Some(repo) = &self.db_repository {
            settings.db_repository = repo.clone();
        }
        if self.skip_signature_validation {
            settings.skip_signature_validation = true;
        }
        if let Some(arch) = &self.arch {
            settings.arch = Some(arch.clone());
        }
    }
}

pub async fn execute(
    args: ScanArgs,
    mut config: PluginConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    args.apply(&mut config.scan);
    tracing::info!(package = %args.package, "Scanning Zarf package");

    let settings = config.scan.clone();
    let tools = config.tools.clone();
    let reference = args.package;

    // Zarf and Trivy are driven through blocking process calls.
    let summary = tokio::task::spawn_blocking(move || {
        PackageScanner::new(
            settings,
            Box::new(ZarfCli::new(tools.zarf)),
            Arc::new(TrivyCli::new(tools.trivy)),
        )
        .scan(&reference)
    })
    .await??;

    if !summary.is_empty() {
        println!();
        println!("{}", output::summary_table(&summary));
    }
    if let Some(dir) = &config.scan.output {
        println!("Reports written to {}", dir.display());
    }

    summary.into_result()?;
    Ok(())
}
