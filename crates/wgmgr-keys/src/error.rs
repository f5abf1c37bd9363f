//! Error types for key handling and generation.

use thiserror::Error;

/// Errors that can occur while decoding or generating keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Invalid base64 encoding.
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(String),

    /// Invalid key length.
    #[error("invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),

    /// The key provider failed to produce a key.
    #[error("key generation failed: {0}")]
    Generation(String),
}

/// Result alias for key operations.
pub type Result<T> = std::result::Result<T, KeyError>;
