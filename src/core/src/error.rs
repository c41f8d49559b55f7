use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// One image that could not be scanned, as reported in the run aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    /// Resolved display name of the image
    pub image: String,
    /// Manifest digest from the combined index
    pub digest: String,
    /// Rendered cause
    pub reason: String,
}

impl fmt::Display for ImageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.image, self.digest, self.reason)
    }
}

/// Trivy Zarf error types
#[derive(Error, Debug)]
pub enum ZarfError {
    /// Combined index document is absent
    #[error("Index not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Combined index document is unparsable or has the wrong shape
    #[error("Malformed index {}: {message}", path.display())]
    MalformedIndex { path: PathBuf, message: String },

    /// Copying blobs or the layout marker into an isolated layout failed
    #[error("Copy failed for {}: {source}", path.display())]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisting a derived index or report failed
    #[error("Write failed for {}: {message}", path.display())]
    WriteFailed { path: PathBuf, message: String },

    /// External vulnerability scanner failed for one image
    #[error("Scan failed for image {image}: {detail}")]
    ScanFailed { image: String, detail: String },

    /// One or more images in a run failed
    #[error("{}", describe_failures(.0))]
    ImagesFailed(Vec<ImageFailure>),

    /// Package reference is not usable
    #[error("Invalid package reference: {0}")]
    InvalidReference(String),

    /// Local package file does not exist
    #[error("Zarf package {} does not exist", .0.display())]
    PackageNotFound(PathBuf),

    /// Pulling a remote package failed
    #[error("Zarf package pull failed: {0}")]
    PullFailed(String),

    /// Package decompression failed
    #[error("Zarf decompression failed: {0}")]
    DecompressFailed(String),

    /// Extracted package has no images directory
    #[error("Images directory not found in Zarf package: {}", .0.display())]
    ImagesDirMissing(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ZarfError {
    /// Failures of a single image that must not abort sibling images.
    pub fn is_per_image(&self) -> bool {
        matches!(
            self,
            Self::CopyFailed { .. } | Self::WriteFailed { .. } | Self::ScanFailed { .. }
        )
    }
}

fn describe_failures(failures: &[ImageFailure]) -> String {
    let mut out = format!("{} image(s) failed to scan", failures.len());
    for failure in failures {
        out.push_str("\n  - ");
        out.push_str(&failure.to_string());
    }
    out
}

impl From<serde_json::Error> for ZarfError {
    fn from(err: serde_json::Error) -> Self {
        ZarfError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ZarfError {
    fn from(err: serde_yaml::Error) -> Self {
        ZarfError::SerializationError(err.to_string())
    }
}

/// Result type alias for Trivy Zarf operations
pub type Result<T> = std::result::Result<T, ZarfError>;
