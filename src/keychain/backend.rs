// Keymerge - Keychain backend boundary
//
// The secure store is opaque: it hands out item handles, and every read or
// write goes through the backend. Any call may fail independently, and
// password reads may block on an OS authorization prompt.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::login::{RealmParts, Scheme};

use super::KeychainError;

/// Creator code stamped on items this tool creates.
pub const DEFAULT_CREATOR_CODE: CreatorCode = CreatorCode(*b"kmrg");

// ─── Attribute Types ─────────────────────────────────────────────────────────

/// The keychain's authentication-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthType {
    HtmlForm,
    HttpBasic,
    HttpDigest,
    Default,
}

impl AuthType {
    pub fn for_scheme(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Html => AuthType::HtmlForm,
            Scheme::Basic => AuthType::HttpBasic,
            Scheme::Digest => AuthType::HttpDigest,
            Scheme::Other => AuthType::Default,
        }
    }

    pub fn scheme(self) -> Scheme {
        match self {
            AuthType::HtmlForm => Scheme::Html,
            AuthType::HttpBasic => Scheme::Basic,
            AuthType::HttpDigest => Scheme::Digest,
            AuthType::Default => Scheme::Other,
        }
    }

    pub fn is_compatible_with(self, scheme: Scheme) -> bool {
        self == AuthType::for_scheme(scheme)
    }
}

/// A four-character creator code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatorCode([u8; 4]);

impl CreatorCode {
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl FromStr for CreatorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("creator code must be exactly 4 bytes, got '{}'", s))?;
        if !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(format!("creator code must be printable ASCII, got '{}'", s));
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for CreatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for CreatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CreatorCode({})", self)
    }
}

/// Everything the backend can tell us about an item, short of its password.
/// A backend leaves a field `None` when it cannot supply it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    pub security_domain: Option<String>,
    pub path: Option<String>,
    pub auth_type: Option<AuthType>,
    pub account: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    /// Carries the form's submit element name.
    pub comment: Option<String>,
    /// Carries the form's action URL.
    pub custom: Option<String>,
    /// Set after creation, through `ItemAttribute::Creator`.
    pub creator: Option<CreatorCode>,
}

impl ItemAttributes {
    /// Apply a single attribute write.
    pub fn apply(&mut self, attribute: ItemAttribute) {
        match attribute {
            ItemAttribute::Creator(code) => self.creator = Some(code),
        }
    }
}

/// An auxiliary attribute written after an item exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAttribute {
    Creator(CreatorCode),
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Search criteria: the service identity, plus optional scheme and account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub server: String,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    pub security_domain: Option<String>,
    /// Only items whose auth type is compatible with this scheme.
    pub scheme: Option<Scheme>,
    pub account: Option<String>,
}

impl ItemQuery {
    /// Items usable for `signon_realm` under `scheme`.
    pub fn for_realm(signon_realm: &str, scheme: Scheme) -> Self {
        let parts = RealmParts::parse(signon_realm, scheme);
        Self {
            server: parts.server,
            port: parts.port,
            protocol: parts.protocol,
            security_domain: parts.security_domain,
            scheme: Some(scheme),
            account: None,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// True if an item with `attributes` satisfies this query.
    pub fn matches(&self, attributes: &ItemAttributes) -> bool {
        attributes.server.as_deref() == Some(self.server.as_str())
            && attributes.port == self.port
            && attributes.protocol == self.protocol
            && attributes.security_domain == self.security_domain
            && self.scheme.map_or(true, |scheme| {
                attributes
                    .auth_type
                    .is_some_and(|auth_type| auth_type.is_compatible_with(scheme))
            })
            && self
                .account
                .as_ref()
                .map_or(true, |wanted| attributes.account.as_ref() == Some(wanted))
    }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// An opaque store of credential items.
///
/// The backend owns its items. Callers receive handles from `search` and
/// `create` and must hand each one back through `release` when done.
/// `ItemGuard` does that automatically.
pub trait KeychainBackend {
    /// Handle to one stored item.
    type Item;

    /// Find all items matching `query`. No matches is `Ok(vec![])`.
    fn search(&self, query: &ItemQuery) -> Result<Vec<Self::Item>, KeychainError>;

    /// Read the non-secret attributes of an item.
    fn attributes(&self, item: &Self::Item) -> Result<ItemAttributes, KeychainError>;

    /// Read the password of an item.
    /// IMPORTANT: this may show an OS authorization prompt and block until
    /// the user dismisses it.
    fn password(&self, item: &Self::Item) -> Result<Zeroizing<String>, KeychainError>;

    /// Create a new item. The returned handle must be released.
    fn create(&self, attributes: &ItemAttributes, password: &str)
        -> Result<Self::Item, KeychainError>;

    fn set_password(&self, item: &Self::Item, password: &str) -> Result<(), KeychainError>;

    fn set_attribute(&self, item: &Self::Item, attribute: ItemAttribute)
        -> Result<(), KeychainError>;

    /// Remove an item from the store. The handle must still be released.
    fn delete(&self, item: &Self::Item) -> Result<(), KeychainError>;

    /// Give a handle back to the backend.
    fn release(&self, item: &Self::Item);
}

// ─── Tests ───────────────────────────────────────────────────────────────────
