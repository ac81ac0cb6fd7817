// Keymerge - Keychain Adapter
//
// Translates between password records and keychain items. The adapter borrows
// the backend and never keeps item handles between calls.
//
// IMPORTANT: any call that materializes a record reads item passwords, which
// can make the OS show an authorization prompt and block until it is
// dismissed. Do not hold locks across adapter calls.

use chrono::Utc;
use url::Url;
use zeroize::Zeroizing;

use crate::login::{PasswordRecord, RealmParts, RecordSource, BLACKLIST_PLACEHOLDER};

use super::{
    AuthType, CreatorCode, ItemAttribute, ItemAttributes, ItemGuard, ItemQuery, KeychainBackend,
    KeychainError, DEFAULT_CREATOR_CODE,
};

/// Password-record view over a `KeychainBackend`.
pub struct KeychainAdapter<'a, B: KeychainBackend + ?Sized> {
    keychain: &'a B,
    creator_code: CreatorCode,
}

impl<'a, B: KeychainBackend + ?Sized> KeychainAdapter<'a, B> {
    pub fn new(keychain: &'a B) -> Self {
        Self {
            keychain,
            creator_code: DEFAULT_CREATOR_CODE,
        }
    }

    /// Use `creator_code` for items created by `add_login`.
    pub fn with_creator_code(mut self, creator_code: CreatorCode) -> Self {
        self.creator_code = creator_code;
        self
    }

    /// Records for every keychain item usable for the query's realm and scheme.
    ///
    /// The username of `query` is not consulted. Items whose attributes cannot
    /// be read are skipped; items whose password cannot be read come back
    /// without a password. Every record carries the query's signon realm
    /// verbatim, since item attributes only hold its decomposition.
    pub fn find_matching(&self, query: &PasswordRecord) -> Result<Vec<PasswordRecord>, KeychainError> {
        let items = self.matching_items(ItemQuery::for_realm(&query.signon_realm, query.scheme))?;
        let records: Vec<PasswordRecord> = items
            .iter()
            .filter_map(|item| self.record_from_item(item))
            .map(|mut record| {
                record.signon_realm = query.signon_realm.clone();
                record
            })
            .collect();

        tracing::debug!(
            signon_realm = %query.signon_realm,
            scheme = %query.scheme,
            found = records.len(),
            "Keychain lookup finished"
        );
        Ok(records)
    }

    /// Store `form` in the keychain.
    ///
    /// Updates the password of an existing item with the same realm, scheme
    /// and username, or creates a new item. A failure to stamp the creator
    /// code on a new item is logged and otherwise ignored.
    ///
    /// A blacklist form never overwrites an existing item: it is a no-op if
    /// the realm already has a blacklist item, and creates one otherwise.
    pub fn add_login(&self, form: &PasswordRecord) -> Result<(), KeychainError> {
        if form.blacklisted {
            return self.add_blacklist_entry(form);
        }

        let password = Self::stored_password(form);
        if let Some(item) = self.matching_item(form)? {
            self.set_item_password(&item, &password)?;
            tracing::info!(
                signon_realm = %form.signon_realm,
                scheme = %form.scheme,
                "Updated password of existing keychain item"
            );
            return Ok(());
        }

        self.create_item(form, &password)
    }

    fn add_blacklist_entry(&self, form: &PasswordRecord) -> Result<(), KeychainError> {
        let query = ItemQuery::for_realm(&form.signon_realm, form.scheme).with_account("");
        let existing = self.matching_items(query)?;
        if existing.iter().any(|item| self.holds_placeholder(item)) {
            tracing::debug!(signon_realm = %form.signon_realm, "Realm already marked never-save");
            return Ok(());
        }

        self.create_item(form, &Self::stored_password(form))
    }

    fn holds_placeholder(&self, item: &B::Item) -> bool {
        self.keychain
            .password(item)
            .is_ok_and(|password| password.as_str() == BLACKLIST_PLACEHOLDER)
    }

    fn create_item(&self, form: &PasswordRecord, password: &str) -> Result<(), KeychainError> {
        let attributes = Self::attributes_for(form);
        let item = ItemGuard::new(self.keychain, self.keychain.create(&attributes, password)?);
        if let Err(e) = self.set_item_creator_code(&item, self.creator_code) {
            tracing::warn!(error = %e, "Could not set creator code on new keychain item");
        }

        tracing::info!(
            signon_realm = %form.signon_realm,
            scheme = %form.scheme,
            "Created keychain item"
        );
        Ok(())
    }

    /// Delete the item holding `form`'s credential. Returns true if it existed.
    pub fn remove_login(&self, form: &PasswordRecord) -> Result<bool, KeychainError> {
        match self.matching_item(form)? {
            Some(item) => {
                self.keychain.delete(&item)?;
                tracing::info!(signon_realm = %form.signon_realm, "Keychain item deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Change the password of `item`.
    pub fn set_item_password(&self, item: &B::Item, password: &str) -> Result<(), KeychainError> {
        self.keychain.set_password(item, password)
    }

    /// Stamp `item` with `creator_code`.
    pub fn set_item_creator_code(
        &self,
        item: &B::Item,
        creator_code: CreatorCode,
    ) -> Result<(), KeychainError> {
        self.keychain
            .set_attribute(item, ItemAttribute::Creator(creator_code))
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn matching_items(&self, query: ItemQuery) -> Result<Vec<ItemGuard<'a, B>>, KeychainError> {
        let keychain = self.keychain;
        Ok(keychain
            .search(&query)?
            .into_iter()
            .map(|item| ItemGuard::new(keychain, item))
            .collect())
    }

    /// The single item for `form`'s realm, scheme and username, if any.
    fn matching_item(&self, form: &PasswordRecord) -> Result<Option<ItemGuard<'a, B>>, KeychainError> {
        let query = ItemQuery::for_realm(&form.signon_realm, form.scheme).with_account(&form.username);
        let items = self.matching_items(query)?;
        if items.len() > 1 {
            tracing::debug!(
                signon_realm = %form.signon_realm,
                count = items.len(),
                "Multiple keychain items share one identity; using the first"
            );
        }
        Ok(items.into_iter().next())
    }

    /// Build a record from whatever the backend will tell us about `item`.
    fn record_from_item(&self, item: &B::Item) -> Option<PasswordRecord> {
        let attributes = match self.keychain.attributes(item) {
            Ok(attributes) => attributes,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping keychain item with unreadable attributes");
                return None;
            }
        };

        let mut record = PasswordRecord::default().with_source(RecordSource::Keychain);
        if let Some(auth_type) = attributes.auth_type {
            record.scheme = auth_type.scheme();
        }
        if let Some(server) = attributes.server {
            let parts = RealmParts {
                protocol: attributes.protocol,
                server,
                port: attributes.port,
                security_domain: attributes.security_domain,
            };
            record.signon_realm = parts.to_string();
            record.origin = parts.origin(attributes.path.as_deref());
        }
        record.username = attributes.account.unwrap_or_default();
        record.submit_element = attributes.comment;
        record.action = attributes.custom;
        record.date_created = attributes.creation_date;

        match self.keychain.password(item) {
            Ok(password) if password.as_str() == BLACKLIST_PLACEHOLDER && record.username.is_empty() => {
                record.blacklisted = true;
            }
            Ok(password) => record.set_password(Some(password)),
            Err(e) => {
                tracing::warn!(
                    signon_realm = %record.signon_realm,
                    error = %e,
                    "Keychain password unavailable; returning record without it"
                );
            }
        }

        Some(record)
    }

    fn attributes_for(form: &PasswordRecord) -> ItemAttributes {
        let parts = RealmParts::parse(&form.signon_realm, form.scheme);
        let path = Url::parse(&form.origin)
            .ok()
            .map(|origin| origin.path().to_string());

        ItemAttributes {
            server: Some(parts.server),
            port: parts.port,
            protocol: parts.protocol,
            security_domain: parts.security_domain,
            path,
            auth_type: Some(AuthType::for_scheme(form.scheme)),
            account: Some(form.username.clone()),
            creation_date: Some(form.date_created.unwrap_or_else(Utc::now)),
            comment: form.submit_element.clone(),
            custom: form.action.clone(),
            creator: None,
        }
    }

    fn stored_password(form: &PasswordRecord) -> Zeroizing<String> {
        if form.blacklisted {
            return Zeroizing::new(BLACKLIST_PLACEHOLDER.to_string());
        }
        Zeroizing::new(form.password().unwrap_or_default().to_string())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
