// Keymerge - SQLite Database Management
//
// Opens the metadata database and applies the schema. Passwords are never
// written here.

use rusqlite::Connection;

use super::StoreError;

/// Wrapper around the metadata SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS logins (
                id                  TEXT PRIMARY KEY,
                origin              TEXT NOT NULL DEFAULT '',
                action              TEXT,
                signon_realm        TEXT NOT NULL,
                scheme              TEXT NOT NULL,
                username            TEXT NOT NULL DEFAULT '',
                username_element    TEXT,
                password_element    TEXT,
                submit_element      TEXT,
                blacklisted         INTEGER NOT NULL DEFAULT 0,
                date_created        TEXT,
                date_last_used      TEXT,
                UNIQUE (signon_realm, scheme, username, origin)
            );

            CREATE INDEX IF NOT EXISTS idx_logins_signon_realm
                ON logins(signon_realm);
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_succeeds() {
        assert!(Database::open_in_memory().is_ok());
    }

    #[test]
    fn test_schema_migration_creates_logins_table() {
        let db = Database::open_in_memory().unwrap();

        let count: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='logins'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "logins table should exist");
    }

    #[test]
    fn test_schema_has_no_password_column() {
        let db = Database::open_in_memory().unwrap();

        let count: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM pragma_table_info('logins') WHERE name LIKE '%password%'
                 AND name != 'password_element'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0, "passwords must never be stored in the database");
    }

    #[test]
    fn test_schema_migration_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.run_migrations().is_ok(), "Migrations should be idempotent");
    }

    #[test]
    fn test_file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("logins.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO logins (id, signon_realm, scheme) VALUES ('x', 'a.com', 'html')",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT count(*) FROM logins", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
