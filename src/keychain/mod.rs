// Keymerge - Keychain Module
//
// Presents the platform secure store in terms of password records. The store
// itself is reached only through the `KeychainBackend` trait. Item handles are
// borrowed per call and released through `ItemGuard`.

mod adapter;
mod backend;
mod error;
mod guard;
mod keyring_backend;

#[cfg(test)]
pub(crate) mod mock;

pub use adapter::KeychainAdapter;
pub use backend::{
    AuthType, CreatorCode, ItemAttribute, ItemAttributes, ItemQuery, KeychainBackend,
    DEFAULT_CREATOR_CODE,
};
pub use error::KeychainError;
pub use guard::ItemGuard;
pub use keyring_backend::{KeyringBackend, KeyringItem};
