// Keymerge - Store Module
//
// SQLite-backed password metadata: everything about a saved login except the
// password, which lives only in the keychain.

mod db;
mod error;
mod repository;

pub use db::Database;
pub use error::StoreError;
pub use repository::{MetadataStore, SqliteMetadataStore};
