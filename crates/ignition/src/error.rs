//! Error types for the ignition crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, validating or decoding a config
#[derive(Error, Debug)]
pub enum Error {
    /// The `ignition.version` field names a schema we don't support
    #[error("unsupported config version: {0:?}")]
    UnsupportedVersion(String),

    /// The config violates the rules of its schema version
    #[error("invalid config ({version}): {message}")]
    Invalid {
        /// Schema version the config was validated against
        version: &'static str,
        /// What rule was violated
        message: String,
    },

    /// Inline file contents are not a valid data URL
    #[error("invalid data URL: {0}")]
    DataUrl(String),

    /// Inline file contents use a compression we can't handle
    #[error("unsupported compression: {0:?}")]
    UnsupportedCompression(String),

    /// Failed to read a config document
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for ignition operations
pub type Result<T> = std::result::Result<T, Error>;
