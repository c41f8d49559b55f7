//! Zarf package handling.
//!
//! Resolves a package reference to a local archive, unpacks it and hands the
//! embedded `images/` OCI layout to the orchestrator.

mod pipeline;
mod zarf;

pub use pipeline::PackageScanner;
pub use zarf::{find_package_file, ZarfCli, PACKAGE_EXTENSION};

use std::path::{Path, PathBuf};

use trivy_zarf_core::error::{Result, ZarfError};

/// Scheme prefix of remote package references.
pub const OCI_SCHEME: &str = "oci://";

/// Where a Zarf package comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageReference {
    /// Archive on the local filesystem.
    Local(PathBuf),
    /// Package in an OCI registry, kept with its `oci://` prefix.
    Remote(String),
}

impl PackageReference {
    /// Classify a user-supplied reference.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ZarfError::InvalidReference(
                "package reference is empty".to_string(),
            ));
        }

        match reference.strip_prefix(OCI_SCHEME) {
            Some("") => Err(ZarfError::InvalidReference(format!(
                "{} is missing a registry path",
                reference
            ))),
            Some(_) => Ok(Self::Remote(reference.to_string())),
            None => Ok(Self::Local(PathBuf::from(reference))),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl std::fmt::Display for PackageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(reference) => write!(f, "{}", reference),
        }
    }
}

/// Options forwarded to `zarf package pull`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOptions {
    pub skip_signature_validation: bool,
    pub arch: Option<String>,
}

/// Package tooling capability.
pub trait PackageTool: Send + Sync {
    /// Unpack `archive` into `dest`.
    fn decompress(&self, archive: &Path, dest: &Path) -> Result<()>;

    /// Download the remote package `reference` into `dest`, returning the
    /// archive path.
    fn pull(&self, reference: &str, dest: &Path, options: &PullOptions) -> Result<PathBuf>;
}
