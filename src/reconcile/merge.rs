// Keymerge - Record merge
//
// Combines the passwords of credential records (from the keychain) with the
// metadata of database records into one deduplicated list.
//
// Matching is by signon realm, scheme and username. When several metadata
// records match one credential record, the first one in metadata order wins.
// Callers depend on that choice, so it must stay stable.

use crate::login::{PasswordRecord, RecordSource};

/// Result of a successful merge match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeMatch {
    /// The full origins are also identical.
    pub path_matches: bool,
}

/// The three disjoint results of `merge`.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// Merged and standalone records, in credential input order.
    pub merged: Vec<PasswordRecord>,
    /// Credential records deliberately not used (blacklist entries that
    /// matched a metadata record).
    pub unused_credentials: Vec<PasswordRecord>,
    /// Metadata records with no corresponding credential.
    pub unmatched_metadata: Vec<PasswordRecord>,
}

/// Returns `Some` if `a` and `b` describe the same credential and are suitable
/// for merging.
pub fn match_for_merge(a: &PasswordRecord, b: &PasswordRecord) -> Option<MergeMatch> {
    if !a.same_identity(b) {
        return None;
    }
    Some(MergeMatch {
        path_matches: a.origin == b.origin,
    })
}

pub fn is_merge_candidate(a: &PasswordRecord, b: &PasswordRecord) -> bool {
    match_for_merge(a, b).is_some()
}

/// Merge `credentials` against `metadata`.
///
/// - A credential with a matching metadata record produces one merged record:
///   the metadata record's fields, the credential's password, and the
///   credential's value for any metadata field the other record lacks.
/// - A credential with no match is kept as a standalone record.
/// - A blacklist credential that matches is not adopted. It goes to
///   `unused_credentials` and its match stays available.
/// - Metadata records never matched end up in `unmatched_metadata`.
pub fn merge(credentials: Vec<PasswordRecord>, metadata: Vec<PasswordRecord>) -> MergeOutcome {
    let mut remaining = metadata;
    let mut outcome = MergeOutcome::default();

    for credential in credentials {
        let position = remaining
            .iter()
            .position(|candidate| is_merge_candidate(&credential, candidate));

        match position {
            Some(_) if credential.blacklisted => {
                tracing::debug!(
                    signon_realm = %credential.signon_realm,
                    "Ignoring foreign blacklist entry"
                );
                outcome.unused_credentials.push(credential);
            }
            Some(index) => {
                let metadata = remaining.remove(index);
                outcome.merged.push(combine(credential, metadata));
            }
            None => outcome.merged.push(credential),
        }
    }

    outcome.unmatched_metadata = remaining;
    outcome
}

fn combine(mut credential: PasswordRecord, mut metadata: PasswordRecord) -> PasswordRecord {
    metadata.set_password(credential.take_password());
    if metadata.origin.is_empty() {
        metadata.origin = credential.origin;
    }
    metadata.username_element = metadata.username_element.or(credential.username_element);
    metadata.password_element = metadata.password_element.or(credential.password_element);
    metadata.submit_element = metadata.submit_element.or(credential.submit_element);
    metadata.action = metadata.action.or(credential.action);
    metadata.date_created = metadata.date_created.or(credential.date_created);
    metadata.date_last_used = metadata.date_last_used.or(credential.date_last_used);
    metadata.source = RecordSource::Merged;
    metadata
}

// ─── Tests ───────────────────────────────────────────────────────────────────
