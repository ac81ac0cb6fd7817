// Keymerge - Configuration
//
// Resolves where the metadata database lives and how keychain items are
// named. Environment variables set the defaults; CLI flags override them.

use std::path::{Path, PathBuf};

use crate::error::{KeymergeError, Result};
use crate::keychain::{CreatorCode, DEFAULT_CREATOR_CODE};

pub const DATA_DIR_VAR: &str = "KEYMERGE_DATA_DIR";
pub const KEYCHAIN_SERVICE_VAR: &str = "KEYMERGE_KEYCHAIN_SERVICE";
pub const CREATOR_CODE_VAR: &str = "KEYMERGE_CREATOR_CODE";

pub const DEFAULT_KEYCHAIN_SERVICE: &str = "keymerge";
const DB_FILE_NAME: &str = "logins.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Keyring service name every item is stored under.
    pub keychain_service: String,
    /// Stamped on keychain items this tool creates.
    pub creator_code: CreatorCode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            creator_code: DEFAULT_CREATOR_CODE,
        }
    }
}

/// Default directory for Keymerge data files.
fn default_data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("keymerge")
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup(DATA_DIR_VAR).filter(|v| !v.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(service) = lookup(KEYCHAIN_SERVICE_VAR).filter(|v| !v.is_empty()) {
            config.keychain_service = service;
        }
        if let Some(code) = lookup(CREATOR_CODE_VAR).filter(|v| !v.is_empty()) {
            config.creator_code = code
                .parse()
                .map_err(|e: String| KeymergeError::Config(format!("{}: {}", CREATOR_CODE_VAR, e)))?;
        }

        Ok(config)
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, keychain_service: Option<String>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(service) = keychain_service {
            self.keychain_service = service;
        }
        self
    }

    /// Path to the metadata database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Create the data directory if it doesn't exist.
    pub fn ensure_data_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(&self.data_dir)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.keychain_service, "keymerge");
        assert_eq!(config.creator_code, DEFAULT_CREATOR_CODE);
        assert!(config.data_dir.ends_with("keymerge"));
        assert!(config.db_path().ends_with("keymerge/logins.db"));
    }

    #[test]
    fn test_environment_values_are_used() {
        let config = Config::from_lookup(lookup_from(&[
            (DATA_DIR_VAR, "/tmp/km"),
            (KEYCHAIN_SERVICE_VAR, "km-test"),
            (CREATOR_CODE_VAR, "abcd"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/km"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/km/logins.db"));
        assert_eq!(config.keychain_service, "km-test");
        assert_eq!(config.creator_code.to_string(), "abcd");
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[(KEYCHAIN_SERVICE_VAR, "")])).unwrap();
        assert_eq!(config.keychain_service, DEFAULT_KEYCHAIN_SERVICE);
    }

    #[test]
    fn test_invalid_creator_code_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[(CREATOR_CODE_VAR, "toolong")]));
        assert!(matches!(result, Err(KeymergeError::Config(_))));
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = Config::from_lookup(lookup_from(&[(DATA_DIR_VAR, "/tmp/env")]))
            .unwrap()
            .with_overrides(Some(PathBuf::from("/tmp/flag")), Some("flag-service".to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/flag"));
        assert_eq!(config.keychain_service, "flag-service");
    }

    #[test]
    fn test_ensure_data_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default().with_overrides(Some(dir.path().join("nested/data")), None);

        config.ensure_data_dir().unwrap();
        assert!(config.data_dir.is_dir());
    }
}
