#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` persistence for users, boundaries, and incidents.
//!
//! Opens (or creates) a `SQLite` database and implements the storage
//! traits from `precinct_access` on top of it. Uses `switchy_database`
//! for all database operations. Boundaries are stored as WKT text and
//! parsed back on read; containment is evaluated in-process, so no
//! spatial extension is needed.
//!
//! Every update and delete of a single incident is one statement keyed by
//! id, which gives per-record serialization for free: an update that
//! loses a race with a delete matches no row.

mod boundaries;
mod incidents;
mod users;

use std::path::Path;
use std::sync::Arc;

use precinct_access::StoreError;
use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Default path for the precinct database.
pub const DEFAULT_DB_PATH: &str = "data/precinct.db";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while opening the database.
#[derive(Debug, Error)]
pub enum DbError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed (e.g., creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        Self::Backend(e.to_string())
    }
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Database lifecycle
// ---------------------------------------------------------------------------

/// Opens (or creates) the `SQLite` database at `path` and ensures all
/// tables exist.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be created or the schema DDL
/// fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates all tables if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            role          TEXT NOT NULL,
            created_by    INTEGER,
            active        INTEGER NOT NULL DEFAULT 1,
            username      TEXT NOT NULL,
            email         TEXT,
            first_name    TEXT,
            last_name     TEXT,
            phone         TEXT,
            badge_number  TEXT,
            created_at    TEXT NOT NULL
        )",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    db.exec_raw("CREATE INDEX IF NOT EXISTS idx_users_created_by ON users (created_by)")
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS boundaries (
            user_id     INTEGER PRIMARY KEY,
            wkt         TEXT NOT NULL,
            srid        INTEGER NOT NULL,
            updated_at  TEXT NOT NULL
        )",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    // A user's boundary goes with the user in the same statement.
    db.exec_raw(
        "CREATE TRIGGER IF NOT EXISTS trg_users_delete_boundary
         AFTER DELETE ON users
         BEGIN
             DELETE FROM boundaries WHERE user_id = OLD.id;
         END",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS incidents (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            title          TEXT NOT NULL,
            description    TEXT,
            incident_type  TEXT NOT NULL,
            priority       TEXT NOT NULL,
            latitude       REAL NOT NULL,
            longitude      REAL NOT NULL,
            reported_by    INTEGER NOT NULL,
            occurred_at    TEXT NOT NULL
        )",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_incidents_reporter
         ON incidents (reported_by, occurred_at)",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(())
}

/// Storage traits implemented over one `SQLite` connection.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<dyn Database>,
}

impl SqliteStore {
    /// Wraps an already-open database. The schema must exist.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Opens the database at `path`, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// See [`open_db`].
    pub async fn open(path: &Path) -> Result<Self, DbError> {
        log::info!("Opening precinct database at {}", path.display());
        Ok(Self::new(Arc::from(open_db(path).await?)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use super::SqliteStore;

    /// Opens a fresh store backed by a file under the system temp dir.
    pub async fn fresh_store(name: &str) -> (SqliteStore, PathBuf) {
        let path = std::env::temp_dir().join(format!("precinct_db_test_{name}.db"));
        let _ = std::fs::remove_file(&path);
        let store = SqliteStore::open(&path).await.unwrap();
        (store, path)
    }
}

#[cfg(test)]
mod tests {
    use precinct_access::store::UserStore;

    use super::*;

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let (store, path) = test_support::fresh_store("schema").await;
        assert_eq!(store.count_users().await.unwrap(), 0);
        drop(store);

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(reopened.count_users().await.unwrap(), 0);

        let _ = std::fs::remove_file(&path);
    }
}
