//! Zarf process invocation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use trivy_zarf_core::error::{Result, ZarfError};

use super::{PackageTool, PullOptions, OCI_SCHEME};

/// File suffix of a Zarf package archive.
pub const PACKAGE_EXTENSION: &str = ".tar.zst";

/// Runs the `zarf` binary.
#[derive(Debug, Clone)]
pub struct ZarfCli {
    binary: PathBuf,
}

impl ZarfCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn pull_command(&self, reference: &str, dest: &Path, options: &PullOptions) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["package", "pull", reference]).arg("-o").arg(dest);

        if options.skip_signature_validation {
            cmd.arg("--skip-signature-validation");
        }
        if let Some(arch) = &options.arch {
            cmd.arg("-a").arg(arch);
        }
        cmd
    }

    fn decompress_command(&self, archive: &Path, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["tools", "archiver", "decompress"])
            .arg(archive)
            .arg(dest);
        cmd
    }

    fn spawn_detail(&self, e: std::io::Error) -> String {
        let hint = if e.kind() == std::io::ErrorKind::NotFound {
            " (is zarf installed?)"
        } else {
            ""
        };
        format!("failed to run {}: {}{}", self.binary.display(), e, hint)
    }
}

impl Default for ZarfCli {
    fn default() -> Self {
        Self::new("zarf")
    }
}

impl PackageTool for ZarfCli {
    fn decompress(&self, archive: &Path, dest: &Path) -> Result<()> {
        let mut cmd = self.decompress_command(archive, dest);
        tracing::debug!(command = ?cmd, "Running zarf decompress");

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ZarfError::DecompressFailed(self.spawn_detail(e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ZarfError::DecompressFailed(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn pull(&self, reference: &str, dest: &Path, options: &PullOptions) -> Result<PathBuf> {
        if !reference.starts_with(OCI_SCHEME) {
            return Err(ZarfError::InvalidReference(format!(
                "{} must start with {}",
                reference, OCI_SCHEME
            )));
        }

        let mut cmd = self.pull_command(reference, dest, options);
        tracing::info!(reference = %reference, "Pulling Zarf package");
        tracing::debug!(command = ?cmd, "Running zarf pull");

        // Pull progress is interactive output for the user.
        let status = cmd
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| ZarfError::PullFailed(self.spawn_detail(e)))?;

        if !status.success() {
            return Err(ZarfError::PullFailed(format!(
                "{} exited with {}",
                self.binary.display(),
                status
            )));
        }

        find_package_file(dest)
    }
}

/// First regular `*.tar.zst` file in `dir`, by file name.
pub fn find_package_file(dir: &Path) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if entry.file_type()?.is_file() && name.to_string_lossy().ends_with(PACKAGE_EXTENSION) {
            candidates.push(entry.path());
        }
    }
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        ZarfError::PullFailed(format!(
            "no {} package found in {}",
            PACKAGE_EXTENSION,
            dir.display()
        ))
    })
}
