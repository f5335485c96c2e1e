//! Error types for b3stream
//!
//! The hashing core is pure arithmetic and has exactly one failure mode, a
//! negative requested output length. Everything else here belongs to the
//! file/stdin driver and the command line layer.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for b3stream operations
#[derive(Error, Debug)]
pub enum B3Error {
    /// Requested digest length was negative
    #[error("Invalid output length: {0} (must be zero or positive)")]
    InvalidOutputLength(i64),

    /// I/O error while reading input
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Report serialization error
    #[error("Output error: {0}")]
    OutputError(String),
}

impl B3Error {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Whether the error came from the hashing core rather than the driver
    pub fn is_core_error(&self) -> bool {
        matches!(self, Self::InvalidOutputLength(_))
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for b3stream operations
pub type Result<T> = std::result::Result<T, B3Error>;

impl From<std::io::Error> for B3Error {
    fn from(err: std::io::Error) -> Self {
        B3Error::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for B3Error {
    fn from(err: serde_json::Error) -> Self {
        B3Error::OutputError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| B3Error::io(path, e))
    }
}
