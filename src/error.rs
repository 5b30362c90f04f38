//! Error types for html2exe

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pack operations
pub type PackResult<T> = Result<T, PackError>;

/// Errors that can occur while packaging an HTML project
#[derive(Error, Debug)]
pub enum PackError {
    /// Input path does not exist or is neither a file nor a directory
    #[error("Input path does not exist: {0}")]
    InvalidInputKind(PathBuf),

    /// Input file does not carry the `.html` extension
    #[error("Input file must be HTML: {0}")]
    NotHtmlFile(PathBuf),

    /// Input directory has no `index.html`
    #[error("Directory must contain index.html: {0}")]
    MissingEntryFile(PathBuf),

    /// Copying an asset into the bundle failed
    #[error("Failed to bundle asset {path}: {source}")]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output directory could not be prepared
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Window dimensions must be positive
    #[error("Invalid window size {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    /// External packager failed
    #[error("Packaging failed: {0}")]
    PackagingFailed(String),

    /// Icon processing error
    #[error("Icon error: {0}")]
    Icon(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PackError {
    /// Wrap an I/O error raised while bundling `path`
    pub(crate) fn asset_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::AssetIo {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was caused by the caller's input rather than the environment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PackError::InvalidInputKind(_)
                | PackError::NotHtmlFile(_)
                | PackError::MissingEntryFile(_)
                | PackError::InvalidDimensions { .. }
        )
    }
}
