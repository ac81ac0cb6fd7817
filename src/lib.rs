// Keymerge - Library root
//
// Re-exports the login model, keychain adapter, reconciler, metadata store,
// password store facade and CLI.

pub mod cli;
pub mod config;
pub mod error;
pub mod keychain;
pub mod login;
pub mod password_store;
pub mod reconcile;
pub mod store;

pub use error::{KeymergeError, Result};
