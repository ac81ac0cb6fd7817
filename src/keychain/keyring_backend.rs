// Keymerge - Platform keyring backend
//
// Production `KeychainBackend` using the `keyring` crate, which dispatches to:
//   - macOS: Security.framework Keychain
//   - Linux: D-Bus Secret Service (GNOME Keyring / KDE Wallet)
//   - Windows: Windows Credential Manager
//
// The platform stores only (service, user) -> secret, with no search. Each
// item occupies two entries:
//   - `item:<uuid>` holds the password;
//   - `attrs:<uuid>` holds the non-secret attributes as JSON.
// Item ids are indexed per server under `index:<server>`, which is what
// `search` scans. Every entry stays small no matter how many logins exist,
// which matters on Windows where a secret is capped at 2560 bytes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::{ItemAttribute, ItemAttributes, ItemQuery, KeychainBackend, KeychainError};

/// Handle to one stored item. Remembers its server so `delete` can find the
/// index entry without another read.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyringItem {
    id: Uuid,
    server: String,
}

/// Ids of the items stored for one server.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ServerIndex {
    items: Vec<Uuid>,
}

fn index_user(server: &str) -> String {
    format!("index:{}", server)
}

fn password_user(id: &Uuid) -> String {
    format!("item:{}", id)
}

fn attributes_user(id: &Uuid) -> String {
    format!("attrs:{}", id)
}

pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    /// All entries are created under the keyring service name `service`.
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, user: &str) -> Result<keyring::Entry, KeychainError> {
        keyring::Entry::new(&self.service, user).map_err(map_keyring_error)
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, user: &str) -> Result<Option<T>, KeychainError> {
        match self.entry(user)?.get_password() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn write_json<T: Serialize>(&self, user: &str, value: &T) -> Result<(), KeychainError> {
        let json = serde_json::to_string(value)?;
        self.entry(user)?
            .set_password(&json)
            .map_err(map_keyring_error)
    }

    /// Delete an entry. A missing entry is not an error.
    fn remove_entry(&self, user: &str) -> Result<(), KeychainError> {
        match self.entry(user)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn load_index(&self, server: &str) -> Result<ServerIndex, KeychainError> {
        Ok(self.read_json(&index_user(server))?.unwrap_or_default())
    }

    fn save_index(&self, server: &str, index: &ServerIndex) -> Result<(), KeychainError> {
        if index.items.is_empty() {
            return self.remove_entry(&index_user(server));
        }
        self.write_json(&index_user(server), index)
    }

    fn load_attributes(&self, id: &Uuid) -> Result<ItemAttributes, KeychainError> {
        self.read_json(&attributes_user(id))?
            .ok_or(KeychainError::NoEntry)
    }

    /// Write both entries of a new item and index it.
    fn store_item(
        &self,
        id: &Uuid,
        server: &str,
        attributes: &ItemAttributes,
        password: &str,
    ) -> Result<(), KeychainError> {
        self.entry(&password_user(id))?
            .set_password(password)
            .map_err(map_keyring_error)?;
        self.write_json(&attributes_user(id), attributes)?;

        let mut index = self.load_index(server)?;
        index.items.push(*id);
        self.save_index(server, &index)
    }
}

fn map_keyring_error(e: keyring::Error) -> KeychainError {
    match e {
        keyring::Error::NoEntry => KeychainError::NoEntry,
        keyring::Error::NoStorageAccess(inner) => {
            tracing::debug!(error = %inner, "Keyring refused access");
            KeychainError::AccessDenied
        }
        other => KeychainError::Backend(other.to_string()),
    }
}

impl KeychainBackend for KeyringBackend {
    type Item = KeyringItem;

    fn search(&self, query: &ItemQuery) -> Result<Vec<KeyringItem>, KeychainError> {
        let index = self.load_index(&query.server)?;

        let mut hits = Vec::new();
        for id in index.items {
            match self.load_attributes(&id) {
                Ok(attributes) if query.matches(&attributes) => hits.push(KeyringItem {
                    id,
                    server: query.server.clone(),
                }),
                Ok(_) => {}
                Err(KeychainError::NoEntry) => {
                    tracing::debug!(item_id = %id, "Index names a keyring item that no longer exists");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(hits)
    }

    fn attributes(&self, item: &KeyringItem) -> Result<ItemAttributes, KeychainError> {
        self.load_attributes(&item.id)
    }

    fn password(&self, item: &KeyringItem) -> Result<Zeroizing<String>, KeychainError> {
        self.entry(&password_user(&item.id))?
            .get_password()
            .map(Zeroizing::new)
            .map_err(map_keyring_error)
    }

    fn create(&self, attributes: &ItemAttributes, password: &str) -> Result<KeyringItem, KeychainError> {
        let id = Uuid::new_v4();
        let server = attributes.server.clone().unwrap_or_default();

        if let Err(e) = self.store_item(&id, &server, attributes, password) {
            // An unindexed item is unreachable; drop whatever was written.
            for user in [password_user(&id), attributes_user(&id)] {
                if let Err(cleanup) = self.remove_entry(&user) {
                    tracing::warn!(error = %cleanup, "Failed to remove orphaned keyring entry");
                }
            }
            return Err(e);
        }

        tracing::debug!(item_id = %id, "Keyring item created");
        Ok(KeyringItem { id, server })
    }

    fn set_password(&self, item: &KeyringItem, password: &str) -> Result<(), KeychainError> {
        self.entry(&password_user(&item.id))?
            .set_password(password)
            .map_err(map_keyring_error)
    }

    fn set_attribute(&self, item: &KeyringItem, attribute: ItemAttribute) -> Result<(), KeychainError> {
        let mut attributes = self.load_attributes(&item.id)?;
        attributes.apply(attribute);
        self.write_json(&attributes_user(&item.id), &attributes)
    }

    fn delete(&self, item: &KeyringItem) -> Result<(), KeychainError> {
        let mut index = self.load_index(&item.server)?;
        let before = index.items.len();
        index.items.retain(|id| *id != item.id);
        if index.items.len() == before {
            return Err(KeychainError::NoEntry);
        }

        self.remove_entry(&password_user(&item.id))?;
        self.remove_entry(&attributes_user(&item.id))?;
        self.save_index(&item.server, &index)
    }

    fn release(&self, item: &KeyringItem) {
        // Handles are plain ids; nothing is held open on the platform side.
        tracing::trace!(item_id = %item.id, "Keyring item handle released");
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
