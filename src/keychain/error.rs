// Keymerge - Keychain error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Backend(String),

    #[error("Access to the keychain was denied")]
    AccessDenied,

    #[error("Keychain item not found")]
    NoEntry,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
