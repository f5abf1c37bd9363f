//! Errors raised by storage backends.

use std::path::PathBuf;

use thiserror::Error;
use wgmgr_config::ConfigError;

/// Errors that can occur while loading or saving a configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The configuration file does not exist.
    #[error("configuration not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Reading or writing the file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The enclosing document has no entry under the configured key.
    #[error("key {key:?} not found in {}", path.display())]
    MissingKey {
        /// Document path.
        path: PathBuf,
        /// Key that was looked up.
        key: String,
    },
    /// The enclosing document is not a JSON object.
    #[error("{} is not a JSON object", .0.display())]
    NotAnObject(PathBuf),
    /// The stored snapshot violates the configuration invariants.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
