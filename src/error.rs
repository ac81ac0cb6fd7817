// Keymerge - Top-level error types
//
// Aggregates errors from the keychain and store modules into a single
// error enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all Keymerge operations.
#[derive(Debug, Error)]
pub enum KeymergeError {
    #[error("Keychain error: {0}")]
    Keychain(#[from] crate::keychain::KeychainError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KeymergeError>;
