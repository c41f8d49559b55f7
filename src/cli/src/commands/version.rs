//! `trivy-zarf version` command.

use clap::Args;

#[derive(Args, Debug)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("trivy-zarf version {}", trivy_zarf_core::VERSION);
    Ok(())
}
