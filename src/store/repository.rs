// Keymerge - Login Metadata Repository
//
// CRUD over the `logins` table. Records handed in may carry a password; it is
// dropped on write, and records read back never have one.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::login::{PasswordRecord, RecordSource, Scheme};

use super::db::Database;
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the password metadata database.
pub trait MetadataStore {
    /// Insert a login, or update the stored one with the same realm, scheme,
    /// username and origin.
    fn upsert(&self, record: &PasswordRecord) -> Result<(), StoreError>;

    /// All logins for `signon_realm`, in insertion order.
    fn logins_for_realm(&self, signon_realm: &str) -> Result<Vec<PasswordRecord>, StoreError>;

    /// Every stored login, in insertion order.
    fn all_logins(&self) -> Result<Vec<PasswordRecord>, StoreError>;

    /// Remove every login with this identity. Returns how many were removed.
    fn remove(&self, signon_realm: &str, scheme: Scheme, username: &str) -> Result<usize, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

const SELECT_COLUMNS: &str = "SELECT origin, action, signon_realm, scheme, username,
        username_element, password_element, submit_element, blacklisted,
        date_created, date_last_used
     FROM logins";

pub struct SqliteMetadataStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteMetadataStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Parse a login row from the database.
    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PasswordRecord> {
        let scheme_str: String = row.get(3)?;
        let scheme: Scheme = scheme_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(StoreError::InvalidRecord(e)),
            )
        })?;

        let mut record = PasswordRecord::new(row.get::<_, String>(2)?, scheme, row.get::<_, String>(4)?)
            .with_origin(row.get::<_, String>(0)?);
        record.action = row.get(1)?;
        record.username_element = row.get(5)?;
        record.password_element = row.get(6)?;
        record.submit_element = row.get(7)?;
        record.blacklisted = row.get(8)?;
        record.date_created = parse_timestamp(row.get(9)?);
        record.date_last_used = parse_timestamp(row.get(10)?);
        record.source = RecordSource::Database;
        Ok(record)
    }

    fn query_records(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> Result<Vec<PasswordRecord>, StoreError> {
        let mut stmt = self.db.conn().prepare(sql)?;
        let rows = stmt.query_map(args, Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl<'a> MetadataStore for SqliteMetadataStore<'a> {
    fn upsert(&self, record: &PasswordRecord) -> Result<(), StoreError> {
        if record.signon_realm.is_empty() {
            return Err(StoreError::InvalidRecord("signon realm is empty".to_string()));
        }

        self.db.conn().execute(
            "INSERT INTO logins
                (id, origin, action, signon_realm, scheme, username, username_element,
                 password_element, submit_element, blacklisted, date_created, date_last_used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (signon_realm, scheme, username, origin) DO UPDATE SET
                action           = excluded.action,
                username_element = excluded.username_element,
                password_element = excluded.password_element,
                submit_element   = excluded.submit_element,
                blacklisted      = excluded.blacklisted,
                date_last_used   = COALESCE(excluded.date_last_used, logins.date_last_used)",
            params![
                Uuid::new_v4().to_string(),
                record.origin,
                record.action,
                record.signon_realm,
                record.scheme.as_str(),
                record.username,
                record.username_element,
                record.password_element,
                record.submit_element,
                record.blacklisted,
                record.date_created.unwrap_or_else(Utc::now).to_rfc3339(),
                record.date_last_used.map(|dt| dt.to_rfc3339()),
            ],
        )?;

        tracing::info!(
            signon_realm = %record.signon_realm,
            scheme = %record.scheme,
            "Login metadata stored"
        );
        Ok(())
    }

    fn logins_for_realm(&self, signon_realm: &str) -> Result<Vec<PasswordRecord>, StoreError> {
        self.query_records(
            &format!("{} WHERE signon_realm = ?1 ORDER BY rowid ASC", SELECT_COLUMNS),
            params![signon_realm],
        )
    }

    fn all_logins(&self) -> Result<Vec<PasswordRecord>, StoreError> {
        self.query_records(&format!("{} ORDER BY rowid ASC", SELECT_COLUMNS), params![])
    }

    fn remove(&self, signon_realm: &str, scheme: Scheme, username: &str) -> Result<usize, StoreError> {
        let affected = self.db.conn().execute(
            "DELETE FROM logins WHERE signon_realm = ?1 AND scheme = ?2 AND username = ?3",
            params![signon_realm, scheme.as_str(), username],
        )?;

        if affected > 0 {
            tracing::info!(signon_realm = %signon_realm, removed = affected, "Login metadata removed");
        }
        Ok(affected)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
