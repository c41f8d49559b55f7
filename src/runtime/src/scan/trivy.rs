//! Trivy process invocation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use trivy_zarf_core::error::{Result, ZarfError};

use super::scanner::{ReportFormat, ScanReport, ScanRequest, VulnScanner};

/// Lines of Trivy stderr kept in a failure detail.
const STDERR_TAIL_LINES: usize = 20;

/// Runs `trivy image --input <layout>` for each scan.
#[derive(Debug, Clone)]
pub struct TrivyCli {
    binary: PathBuf,
}

impl TrivyCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Build the Trivy command for one layout.
    fn command(&self, layout_dir: &Path, request: &ScanRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("image").arg("--input").arg(layout_dir);

        if let Some(repo) = &request.db_repository {
            cmd.arg("--db-repository").arg(repo);
        }
        if request.format == ReportFormat::Json {
            cmd.arg("--format").arg("json");
        }

        cmd
    }

    fn spawn_error(&self, layout_dir: &Path, e: std::io::Error) -> ZarfError {
        let hint = if e.kind() == std::io::ErrorKind::NotFound {
            " (is trivy installed?)"
        } else {
            ""
        };
        ZarfError::ScanFailed {
            image: layout_dir.display().to_string(),
            detail: format!("failed to run {}: {}{}", self.binary.display(), e, hint),
        }
    }
}

impl Default for TrivyCli {
    fn default() -> Self {
        Self::new("trivy")
    }
}

impl VulnScanner for TrivyCli {
    fn scan(&self, layout_dir: &Path, request: &ScanRequest) -> Result<ScanReport> {
        let mut cmd = self.command(layout_dir, request);
        tracing::debug!(command = ?cmd, "Running trivy");

        match request.format {
            ReportFormat::Table => {
                let status = cmd
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(|e| self.spawn_error(layout_dir, e))?;

                if !status.success() {
                    return Err(ZarfError::ScanFailed {
                        image: layout_dir.display().to_string(),
                        detail: format!("trivy exited with {}", status),
                    });
                }
                Ok(ScanReport::Streamed)
            }
            ReportFormat::Json => {
                let output = cmd
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .map_err(|e| self.spawn_error(layout_dir, e))?;

                let stderr = String::from_utf8_lossy(&output.stderr);
                if !output.status.success() {
                    return Err(ZarfError::ScanFailed {
                        image: layout_dir.display().to_string(),
                        detail: failure_detail(&output.status.to_string(), &stderr),
                    });
                }
                if !stderr.trim().is_empty() {
                    tracing::debug!(stderr = %stderr.trim(), "trivy diagnostics");
                }

                let report = serde_json::from_slice(&output.stdout).map_err(|e| {
                    ZarfError::ScanFailed {
                        image: layout_dir.display().to_string(),
                        detail: format!("trivy report is not valid JSON: {}", e),
                    }
                })?;
                Ok(ScanReport::Json(report))
            }
        }
    }
}

/// Exit status followed by the tail of stderr.
fn failure_detail(status: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let tail = &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..];
    if tail.is_empty() {
        format!("trivy exited with {}", status)
    } else {
        format!("trivy exited with {}: {}", status, tail.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn test_command_table_mode() {
        let trivy = TrivyCli::default();
        let request = ScanRequest {
            format: ReportFormat::Table,
            db_repository: Some("ghcr.io/aquasecurity/trivy-db".to_string()),
        };
        let cmd = trivy.command(Path::new("/tmp/layout"), &request);

        assert_eq!(cmd.get_program(), OsStr::new("trivy"));
        assert_eq!(
            args(&cmd),
            vec![
                OsStr::new("image"),
                OsStr::new("--input"),
                OsStr::new("/tmp/layout"),
                OsStr::new("--db-repository"),
                OsStr::new("ghcr.io/aquasecurity/trivy-db"),
            ]
        );
    }

    #[test]
    fn test_command_json_mode_keeps_db_repository() {
        let trivy = TrivyCli::new("/opt/trivy");
        let request = ScanRequest {
            format: ReportFormat::Json,
            db_repository: Some("mirror/db".to_string()),
        };
        let cmd = trivy.command(Path::new("/tmp/layout"), &request);

        assert_eq!(cmd.get_program(), OsStr::new("/opt/trivy"));
        let args = args(&cmd);
        assert!(args.windows(2).any(|w| w == [OsStr::new("--format"), OsStr::new("json")]));
        assert!(args
            .windows(2)
            .any(|w| w == [OsStr::new("--db-repository"), OsStr::new("mirror/db")]));
    }

    #[test]
    fn test_command_without_db_repository() {
        let request = ScanRequest {
            format: ReportFormat::Table,
            db_repository: None,
        };
        let cmd = TrivyCli::default().command(Path::new("/l"), &request);
        assert!(!args(&cmd).contains(&OsStr::new("--db-repository")));
    }

    #[test]
    fn test_missing_binary_is_scan_failed() {
        let trivy = TrivyCli::new("/nonexistent/bin/trivy");
        let request = ScanRequest {
            format: ReportFormat::Json,
            db_repository: None,
        };
        let err = trivy.scan(Path::new("/tmp"), &request).unwrap_err();
        assert!(matches!(err, ZarfError::ScanFailed { .. }));
        assert!(err.to_string().contains("is trivy installed?"));
    }

    #[test]
    fn test_failure_detail_keeps_tail() {
        let stderr: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let detail = failure_detail("exit status: 1", &stderr);
        assert!(detail.starts_with("trivy exited with exit status: 1: "));
        assert!(detail.contains("line 29"));
        assert!(!detail.contains("line 9\n"));
    }

    #[test]
    fn test_failure_detail_without_stderr() {
        assert_eq!(
            failure_detail("exit status: 2", "\n  \n"),
            "trivy exited with exit status: 2"
        );
    }
}
