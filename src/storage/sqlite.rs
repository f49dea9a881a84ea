//! SQLite storage implementation.
//!
//! The default backend. File-backed in production, in-memory for tests.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{AppError, Result};
use crate::models::TrackedRecord;
use crate::storage::RecordStore;

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS animals (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    age TEXT NOT NULL,
    available INTEGER NOT NULL DEFAULT 1
);";

/// SQLite-backed record store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).inspect_err(|e| {
            log::error!("Failed to open record store at {}: {}", path.display(), e);
        })?;
        let store = Self::bootstrap(conn)?;

        log::info!(
            "Opened record store at {} ({} ms)",
            path.display(),
            started_at.elapsed().as_millis()
        );
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    fn availability(&self, id: &str) -> Result<Option<bool>> {
        let available = self
            .conn
            .query_row(
                "SELECT available FROM animals WHERE id = ?1",
                params![id],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(available)
    }
}

impl RecordStore for SqliteStore {
    fn upsert_if_absent(&self, id: &str, name: &str, age: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO animals (id, name, age, available) VALUES (?1, ?2, ?3, 1)",
            params![id, name, age],
        )?;
        Ok(inserted > 0)
    }

    fn mark_unavailable(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE animals SET available = 0 WHERE id = ?1 AND available = 1",
            params![id],
        )?;
        Ok(())
    }

    fn is_available(&self, id: &str) -> Result<bool> {
        self.availability(id)?
            .ok_or_else(|| AppError::not_found(id))
    }

    fn name_of(&self, id: &str) -> Result<String> {
        self.conn
            .query_row(
                "SELECT name FROM animals WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or_else(|| AppError::not_found(id))
    }

    fn all_known_ids(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare("SELECT id FROM animals")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(ids)
    }

    fn records(&self) -> Result<Vec<TrackedRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, age, available FROM animals ORDER BY id")?;
        let records = stmt
            .query_map([], map_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<TrackedRecord> {
    Ok(TrackedRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        available: row.get(3)?,
    })
}
