// Keymerge - In-memory keychain for tests
//
// Stores items in a map and counts handle acquisition and release so tests
// can assert that no handle leaks. Individual operations can be made to fail.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use zeroize::Zeroizing;

use super::{AuthType, ItemAttribute, ItemAttributes, ItemQuery, KeychainBackend, KeychainError};
use crate::login::Scheme;

/// Handle to an item in a `MemoryKeychain`. Deliberately not `Clone`.
#[derive(Debug)]
pub struct MemoryItem(u64);

/// Operations that should fail with a backend error.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub search: bool,
    pub create: bool,
    pub set_password: bool,
    pub set_attribute: bool,
    pub delete: bool,
}

#[derive(Default)]
struct State {
    items: BTreeMap<u64, (ItemAttributes, String)>,
    next_id: u64,
    acquired: usize,
    released: usize,
    failures: Failures,
    denied_passwords: HashSet<u64>,
    unreadable: HashSet<u64>,
}

pub struct MemoryKeychain {
    state: Mutex<State>,
}

impl MemoryKeychain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Insert an item directly, without handing out a handle.
    pub fn seed_attributes(&self, attributes: ItemAttributes, password: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.items.insert(id, (attributes, password.to_string()));
        id
    }

    /// Insert an item the way the adapter would lay it out for this identity.
    pub fn seed(&self, realm: &str, scheme: Scheme, account: &str, password: &str) -> u64 {
        let query = ItemQuery::for_realm(realm, scheme);
        self.seed_attributes(
            ItemAttributes {
                server: Some(query.server),
                port: query.port,
                protocol: query.protocol,
                security_domain: query.security_domain,
                auth_type: query.scheme.map(AuthType::for_scheme),
                account: Some(account.to_string()),
                ..ItemAttributes::default()
            },
            password,
        )
    }

    pub fn set_failures(&self, failures: Failures) {
        self.state.lock().unwrap().failures = failures;
    }

    /// Reading this item's password behaves like a refused authorization prompt.
    pub fn deny_password(&self, id: u64) {
        self.state.lock().unwrap().denied_passwords.insert(id);
    }

    /// Reading this item's attributes fails outright.
    pub fn make_unreadable(&self, id: u64) {
        self.state.lock().unwrap().unreadable.insert(id);
    }

    pub fn item_count(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    pub fn outstanding_handles(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.acquired - state.released
    }

    pub fn password_of(&self, id: u64) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.items.get(&id).map(|(_, password)| password.clone())
    }

    pub fn attributes_of(&self, id: u64) -> Option<ItemAttributes> {
        let state = self.state.lock().unwrap();
        state.items.get(&id).map(|(attributes, _)| attributes.clone())
    }

    /// Ids of all stored items, in creation order.
    pub fn item_ids(&self) -> Vec<u64> {
        self.state.lock().unwrap().items.keys().copied().collect()
    }
}

fn injected(operation: &str) -> KeychainError {
    KeychainError::Backend(format!("injected {} failure", operation))
}

impl KeychainBackend for MemoryKeychain {
    type Item = MemoryItem;

    fn search(&self, query: &ItemQuery) -> Result<Vec<MemoryItem>, KeychainError> {
        let mut state = self.state.lock().unwrap();
        if state.failures.search {
            return Err(injected("search"));
        }
        let hits: Vec<MemoryItem> = state
            .items
            .iter()
            .filter(|(_, (attributes, _))| query.matches(attributes))
            .map(|(id, _)| MemoryItem(*id))
            .collect();
        state.acquired += hits.len();
        Ok(hits)
    }

    fn attributes(&self, item: &MemoryItem) -> Result<ItemAttributes, KeychainError> {
        let state = self.state.lock().unwrap();
        if state.unreadable.contains(&item.0) {
            return Err(KeychainError::AccessDenied);
        }
        state
            .items
            .get(&item.0)
            .map(|(attributes, _)| attributes.clone())
            .ok_or(KeychainError::NoEntry)
    }

    fn password(&self, item: &MemoryItem) -> Result<Zeroizing<String>, KeychainError> {
        let state = self.state.lock().unwrap();
        if state.denied_passwords.contains(&item.0) {
            return Err(KeychainError::AccessDenied);
        }
        state
            .items
            .get(&item.0)
            .map(|(_, password)| Zeroizing::new(password.clone()))
            .ok_or(KeychainError::NoEntry)
    }

    fn create(&self, attributes: &ItemAttributes, password: &str) -> Result<MemoryItem, KeychainError> {
        if self.state.lock().unwrap().failures.create {
            return Err(injected("create"));
        }
        let id = self.seed_attributes(attributes.clone(), password);
        self.state.lock().unwrap().acquired += 1;
        Ok(MemoryItem(id))
    }

    fn set_password(&self, item: &MemoryItem, password: &str) -> Result<(), KeychainError> {
        let mut state = self.state.lock().unwrap();
        if state.failures.set_password {
            return Err(injected("set_password"));
        }
        let (_, stored) = state.items.get_mut(&item.0).ok_or(KeychainError::NoEntry)?;
        *stored = password.to_string();
        Ok(())
    }

    fn set_attribute(&self, item: &MemoryItem, attribute: ItemAttribute) -> Result<(), KeychainError> {
        let mut state = self.state.lock().unwrap();
        if state.failures.set_attribute {
            return Err(injected("set_attribute"));
        }
        let (attributes, _) = state.items.get_mut(&item.0).ok_or(KeychainError::NoEntry)?;
        attributes.apply(attribute);
        Ok(())
    }

    fn delete(&self, item: &MemoryItem) -> Result<(), KeychainError> {
        let mut state = self.state.lock().unwrap();
        if state.failures.delete {
            return Err(injected("delete"));
        }
        state.items.remove(&item.0).map(|_| ()).ok_or(KeychainError::NoEntry)
    }

    fn release(&self, _item: &MemoryItem) {
        self.state.lock().unwrap().released += 1;
    }
}
