// Keymerge - Password Store
//
// Presents one view of saved logins over two sources: passwords come from the
// keychain, metadata comes from the database. Lookups merge the two. Writes
// keep them in step.

use crate::error::Result;
use crate::keychain::{KeychainAdapter, KeychainBackend};
use crate::login::{PasswordRecord, RecordSource};
use crate::reconcile::merge;
use crate::store::MetadataStore;

/// Logins known for one realm and scheme.
#[derive(Debug, Default)]
pub struct LoginSet {
    /// Usable logins: merged records plus keychain-only records.
    pub logins: Vec<PasswordRecord>,
    /// Sites the user asked never to save.
    pub never_saved: Vec<PasswordRecord>,
    /// Known logins whose password is not in the keychain.
    pub without_password: Vec<PasswordRecord>,
}

pub struct PasswordStore<'a, B, S>
where
    B: KeychainBackend + ?Sized,
    S: MetadataStore + ?Sized,
{
    keychain: KeychainAdapter<'a, B>,
    metadata: &'a S,
}

impl<'a, B, S> PasswordStore<'a, B, S>
where
    B: KeychainBackend + ?Sized,
    S: MetadataStore + ?Sized,
{
    pub fn new(keychain: KeychainAdapter<'a, B>, metadata: &'a S) -> Self {
        Self { keychain, metadata }
    }

    /// All logins for the realm and scheme of `query`.
    pub fn logins_for(&self, query: &PasswordRecord) -> Result<LoginSet> {
        let credentials = self.keychain.find_matching(query)?;
        let metadata: Vec<PasswordRecord> = self
            .metadata
            .logins_for_realm(&query.signon_realm)?
            .into_iter()
            .filter(|record| record.scheme == query.scheme)
            .collect();

        let outcome = merge(credentials, metadata);
        if !outcome.unused_credentials.is_empty() {
            tracing::debug!(
                signon_realm = %query.signon_realm,
                count = outcome.unused_credentials.len(),
                "Leaving foreign keychain entries unused"
            );
        }

        let (never_saved, without_password) = outcome
            .unmatched_metadata
            .into_iter()
            .partition(|record| record.blacklisted);

        Ok(LoginSet {
            logins: outcome.merged,
            never_saved,
            without_password,
        })
    }

    /// Save a login. Blacklist entries are recorded only in the database.
    pub fn add_login(&self, record: &PasswordRecord) -> Result<()> {
        if !record.blacklisted {
            self.keychain.add_login(record)?;
        }
        self.metadata.upsert(record)?;
        Ok(())
    }

    /// Remove a login from both sources. Returns true if either held it.
    ///
    /// The keychain item goes first, so a failed delete leaves the metadata
    /// in place and the login still merges on the next lookup.
    pub fn remove_login(&self, record: &PasswordRecord) -> Result<bool> {
        let removed_item = self.keychain.remove_login(record)?;
        let removed_rows =
            self.metadata
                .remove(&record.signon_realm, record.scheme, &record.username)?;
        Ok(removed_rows > 0 || removed_item)
    }

    /// Record metadata for logins that exist only in the keychain, so they
    /// show up as saved sites. Returns how many were imported.
    pub fn import_keychain_logins(&self, query: &PasswordRecord) -> Result<usize> {
        let set = self.logins_for(query)?;
        let mut imported = 0;
        for record in set
            .logins
            .iter()
            .filter(|record| record.source == RecordSource::Keychain && !record.blacklisted)
        {
            self.metadata.upsert(&record.metadata_only())?;
            imported += 1;
        }

        tracing::info!(
            signon_realm = %query.signon_realm,
            imported,
            "Keychain logins imported"
        );
        Ok(imported)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
