// Keymerge - Password record
//
// SECURITY: the `password` field is private and wrapped in `Zeroizing`, so it
// is wiped on drop. It never appears in Debug output, Display output, or the
// serialized `LoginSummary`. Read it through `password()`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Password stored on keychain items that mark a site as "never save".
pub const BLACKLIST_PLACEHOLDER: &str = " ";

/// Authentication mechanism a credential is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// HTML form login.
    #[default]
    Html,
    /// HTTP Basic authentication.
    Basic,
    /// HTTP Digest authentication.
    Digest,
    /// Anything else.
    Other,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Html => "html",
            Scheme::Basic => "basic",
            Scheme::Digest => "digest",
            Scheme::Other => "other",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "form" => Ok(Scheme::Html),
            "basic" => Ok(Scheme::Basic),
            "digest" => Ok(Scheme::Digest),
            "other" => Ok(Scheme::Other),
            other => Err(format!(
                "unknown scheme '{}' (expected html, basic, digest or other)",
                other
            )),
        }
    }
}

/// Where a record instance came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Materialized from a keychain item.
    Keychain,
    /// Loaded from the metadata database.
    #[default]
    Database,
    /// Keychain password combined with database metadata.
    Merged,
}

/// A normalized credential entry.
///
/// `signon_realm`, `scheme` and `username` together identify a logical
/// credential. Everything else is metadata.
#[derive(Clone, Default)]
pub struct PasswordRecord {
    pub origin: String,
    pub signon_realm: String,
    pub scheme: Scheme,
    pub username: String,
    /// NEVER printed, logged, or Debug-displayed.
    password: Option<Zeroizing<String>>,
    pub username_element: Option<String>,
    pub password_element: Option<String>,
    pub submit_element: Option<String>,
    pub action: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_last_used: Option<DateTime<Utc>>,
    /// The user asked never to save credentials for this site.
    pub blacklisted: bool,
    pub source: RecordSource,
}

impl PasswordRecord {
    /// Create a record carrying only its identity.
    pub fn new(signon_realm: impl Into<String>, scheme: Scheme, username: impl Into<String>) -> Self {
        Self {
            signon_realm: signon_realm.into(),
            scheme,
            username: username.into(),
            ..Self::default()
        }
    }

    /// A "never save" entry for `signon_realm`.
    pub fn blacklist_entry(signon_realm: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            signon_realm: signon_realm.into(),
            blacklisted: true,
            ..Self::default()
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_submit_element(mut self, element: impl Into<String>) -> Self {
        self.submit_element = Some(element.into());
        self
    }

    pub fn with_source(mut self, source: RecordSource) -> Self {
        self.source = source;
        self
    }

    /// Access the raw password, if this record carries one.
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn set_password(&mut self, password: Option<Zeroizing<String>>) {
        self.password = password;
    }

    pub fn take_password(&mut self) -> Option<Zeroizing<String>> {
        self.password.take()
    }

    /// True if both records name the same logical credential.
    pub fn same_identity(&self, other: &PasswordRecord) -> bool {
        self.signon_realm == other.signon_realm
            && self.scheme == other.scheme
            && self.username == other.username
    }

    /// Copy of this record with the password stripped, as written to the
    /// metadata database.
    pub fn metadata_only(&self) -> PasswordRecord {
        let mut record = self.clone();
        record.password = None;
        record
    }
}

/// Custom Debug implementation that NEVER reveals the password.
impl fmt::Debug for PasswordRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordRecord")
            .field("origin", &self.origin)
            .field("signon_realm", &self.signon_realm)
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field(
                "password",
                &if self.password.is_some() { "[REDACTED]" } else { "<none>" },
            )
            .field("username_element", &self.username_element)
            .field("password_element", &self.password_element)
            .field("submit_element", &self.submit_element)
            .field("action", &self.action)
            .field("date_created", &self.date_created)
            .field("date_last_used", &self.date_last_used)
            .field("blacklisted", &self.blacklisted)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for PasswordRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blacklisted {
            return write!(f, "{} ({}) [never save]", self.signon_realm, self.scheme);
        }
        write!(f, "{} @ {} ({})", self.username, self.signon_realm, self.scheme)
    }
}

/// A listing view of a record. Never contains the password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSummary {
    pub origin: String,
    pub signon_realm: String,
    pub scheme: Scheme,
    pub username: String,
    pub has_password: bool,
    pub action: Option<String>,
    pub blacklisted: bool,
    pub source: RecordSource,
    pub date_created: Option<DateTime<Utc>>,
}

impl From<&PasswordRecord> for LoginSummary {
    fn from(record: &PasswordRecord) -> Self {
        Self {
            origin: record.origin.clone(),
            signon_realm: record.signon_realm.clone(),
            scheme: record.scheme,
            username: record.username.clone(),
            has_password: record.has_password(),
            action: record.action.clone(),
            blacklisted: record.blacklisted,
            source: record.source,
            date_created: record.date_created,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
