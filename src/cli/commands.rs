// Keymerge - CLI Command Handlers
//
// Each function handles one CLI subcommand. They open the metadata database
// and the platform keyring, then go through `PasswordStore` so that both
// sides stay consistent.

use serde::Serialize;

use crate::config::Config;
use crate::error::KeymergeError;
use crate::keychain::{KeychainAdapter, KeyringBackend};
use crate::login::{LoginSummary, PasswordRecord, RealmParts, Scheme};
use crate::password_store::{LoginSet, PasswordStore};
use crate::store::{Database, SqliteMetadataStore};

use super::{Cli, Commands};

/// Fields of the `add` subcommand.
struct NewLogin {
    realm: String,
    scheme: Scheme,
    username: String,
    password: Option<String>,
    origin: Option<String>,
    action: Option<String>,
    submit_element: Option<String>,
    never_save: bool,
}

/// JSON shape of `keymerge logins --json`.
#[derive(Debug, Serialize)]
struct LoginListing {
    logins: Vec<LoginSummary>,
    never_saved: Vec<LoginSummary>,
    without_password: Vec<LoginSummary>,
}

impl From<&LoginSet> for LoginListing {
    fn from(set: &LoginSet) -> Self {
        fn summarize(records: &[PasswordRecord]) -> Vec<LoginSummary> {
            records.iter().map(LoginSummary::from).collect()
        }
        Self {
            logins: summarize(&set.logins),
            never_saved: summarize(&set.never_saved),
            without_password: summarize(&set.without_password),
        }
    }
}

/// Execute the parsed CLI command.
pub fn execute(cli: Cli) -> Result<(), KeymergeError> {
    let config = Config::from_env()?.with_overrides(cli.data_dir, cli.keychain_service);

    match cli.command {
        Commands::Add {
            realm,
            scheme,
            username,
            password,
            origin,
            action,
            submit_element,
            never_save,
        } => cmd_add(
            &config,
            NewLogin {
                realm,
                scheme,
                username,
                password,
                origin,
                action,
                submit_element,
                never_save,
            },
        ),
        Commands::Logins { realm, scheme, json } => cmd_logins(&config, realm, scheme, json),
        Commands::Remove {
            realm,
            scheme,
            username,
        } => cmd_remove(&config, realm, scheme, username),
        Commands::Import { realm, scheme } => cmd_import(&config, realm, scheme),
    }
}

// ─── Add ─────────────────────────────────────────────────────────────────────

fn cmd_add(config: &Config, login: NewLogin) -> Result<(), KeymergeError> {
    let record = build_record(login)?;

    let db = open_db(config)?;
    let metadata = SqliteMetadataStore::new(&db);
    let keychain = KeyringBackend::new(&config.keychain_service);
    let store = password_store(config, &keychain, &metadata);

    store
        .add_login(&record)
        .map_err(|e| KeymergeError::Other(format!("could not save credential: {}", e)))?;

    if record.blacklisted {
        println!("✓ {} will never be saved", record.signon_realm);
    } else {
        println!("✓ Login saved");
        println!("  Realm:    {}", record.signon_realm);
        println!("  Username: {}", record.username);
    }

    Ok(())
}

fn build_record(login: NewLogin) -> Result<PasswordRecord, KeymergeError> {
    let origin = login
        .origin
        .unwrap_or_else(|| default_origin(&login.realm, login.scheme));

    if login.never_save {
        let mut entry = PasswordRecord::blacklist_entry(login.realm, origin);
        entry.scheme = login.scheme;
        return Ok(entry);
    }

    let password = login.password.ok_or_else(|| {
        KeymergeError::Other("--password is required unless --never-save is given".to_string())
    })?;

    let mut record = PasswordRecord::new(login.realm, login.scheme, login.username)
        .with_origin(origin)
        .with_password(password);
    record.action = login.action;
    record.submit_element = login.submit_element;
    Ok(record)
}

/// Origin to record when none was given: the realm's host part for URL
/// realms, empty otherwise.
fn default_origin(realm: &str, scheme: Scheme) -> String {
    let parts = RealmParts::parse(realm, scheme);
    if parts.protocol.is_some() {
        parts.origin(None)
    } else {
        String::new()
    }
}

// ─── Logins ──────────────────────────────────────────────────────────────────

fn cmd_logins(config: &Config, realm: String, scheme: Scheme, json: bool) -> Result<(), KeymergeError> {
    let db = open_db(config)?;
    let metadata = SqliteMetadataStore::new(&db);
    let keychain = KeyringBackend::new(&config.keychain_service);
    let store = password_store(config, &keychain, &metadata);

    let set = store.logins_for(&PasswordRecord::new(realm.clone(), scheme, ""))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&LoginListing::from(&set))?);
        return Ok(());
    }

    if set.logins.is_empty() && set.never_saved.is_empty() && set.without_password.is_empty() {
        println!("No logins found for {} ({}).", realm, scheme);
        return Ok(());
    }

    println!("Logins for {} ({}):\n", realm, scheme);
    for record in &set.logins {
        print_summary(&LoginSummary::from(record));
    }

    if !set.without_password.is_empty() {
        println!("\nKnown logins with no password in the keychain ({}):", set.without_password.len());
        for record in &set.without_password {
            print_summary(&LoginSummary::from(record));
        }
    }

    if !set.never_saved.is_empty() {
        println!("\nMarked as never save.");
    }

    Ok(())
}

fn print_summary(summary: &LoginSummary) {
    println!(
        "  {:24} │ {:<8?} │ {}",
        if summary.username.is_empty() { "(no username)" } else { summary.username.as_str() },
        summary.source,
        summary.action.as_deref().unwrap_or(&summary.origin),
    );
}

// ─── Remove ──────────────────────────────────────────────────────────────────

fn cmd_remove(config: &Config, realm: String, scheme: Scheme, username: String) -> Result<(), KeymergeError> {
    let db = open_db(config)?;
    let metadata = SqliteMetadataStore::new(&db);
    let keychain = KeyringBackend::new(&config.keychain_service);
    let store = password_store(config, &keychain, &metadata);

    let record = PasswordRecord::new(realm, scheme, username);
    if store.remove_login(&record)? {
        println!("✓ Removed {}", record);
    } else {
        println!("Login not found: {}", record);
    }

    Ok(())
}

// ─── Import ──────────────────────────────────────────────────────────────────

fn cmd_import(config: &Config, realm: String, scheme: Scheme) -> Result<(), KeymergeError> {
    let db = open_db(config)?;
    let metadata = SqliteMetadataStore::new(&db);
    let keychain = KeyringBackend::new(&config.keychain_service);
    let store = password_store(config, &keychain, &metadata);

    let imported = store.import_keychain_logins(&PasswordRecord::new(realm.clone(), scheme, ""))?;
    println!("✓ Imported {} keychain login(s) for {}", imported, realm);

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the metadata database, creating the data directory on first use.
fn open_db(config: &Config) -> Result<Database, KeymergeError> {
    config.ensure_data_dir()?;
    let path = config.db_path();
    let db = Database::open(&path)
        .map_err(|e| KeymergeError::Other(format!("Failed to open database at {}: {}", path.display(), e)))?;
    Ok(db)
}

fn password_store<'a>(
    config: &Config,
    keychain: &'a KeyringBackend,
    metadata: &'a SqliteMetadataStore<'a>,
) -> PasswordStore<'a, KeyringBackend, SqliteMetadataStore<'a>> {
    let adapter = KeychainAdapter::new(keychain).with_creator_code(config.creator_code);
    PasswordStore::new(adapter, metadata)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn new_login(realm: &str) -> NewLogin {
        NewLogin {
            realm: realm.to_string(),
            scheme: Scheme::Html,
            username: "alice".to_string(),
            password: Some("hunter2".to_string()),
            origin: None,
            action: Some("https://example.com/session".to_string()),
            submit_element: None,
            never_save: false,
        }
    }

    #[test]
    fn test_build_record_defaults_origin_from_realm() {
        let record = build_record(new_login("https://example.com/")).unwrap();

        assert_eq!(record.origin, "https://example.com/");
        assert_eq!(record.password(), Some("hunter2"));
        assert_eq!(record.action.as_deref(), Some("https://example.com/session"));
        assert!(!record.blacklisted);
    }

    #[test]
    fn test_build_record_without_url_realm_has_empty_origin() {
        let record = build_record(new_login("example.com")).unwrap();
        assert!(record.origin.is_empty());
    }

    #[test]
    fn test_build_record_requires_password() {
        let mut login = new_login("https://example.com/");
        login.password = None;
        assert!(matches!(build_record(login), Err(KeymergeError::Other(_))));
    }

    #[test]
    fn test_never_save_builds_blacklist_entry() {
        let mut login = new_login("https://example.com/");
        login.password = None;
        login.never_save = true;

        let record = build_record(login).unwrap();
        assert!(record.blacklisted);
        assert!(record.username.is_empty());
        assert!(!record.has_password());
    }

    #[test]
    fn test_listing_json_has_no_passwords() {
        let set = LoginSet {
            logins: vec![PasswordRecord::new("https://example.com/", Scheme::Html, "alice")
                .with_password("hunter2")],
            ..LoginSet::default()
        };

        let json = serde_json::to_string(&LoginListing::from(&set)).unwrap();
        assert!(json.contains("\"has_password\":true"));
        assert!(!json.contains("hunter2"));
    }
}
