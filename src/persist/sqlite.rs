//! SQLite-backed key-value store.

use std::path::Path;

use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use crate::types::now_ms;

use super::{KvStore, PersistError, PersistResult};

/// SQLite implementation of [`crate::persist::KvStore`].
pub struct SqliteKvStore {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteKvStore {
    /// Opens or creates a store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    /// Rejects values larger than `bytes` with [`PersistError::QuotaExceeded`].
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self {
            conn,
            quota_bytes: None,
        })
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        if let Some(limit) = self.quota_bytes {
            if value.len() > limit {
                return Err(PersistError::QuotaExceeded {
                    needed: value.len(),
                    limit,
                });
            }
        }

        self.conn
            .execute(
                "INSERT INTO kv(key, value, updated_ms) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_ms = excluded.updated_ms",
                params![key, value, now_ms() as i64],
            )
            .map_err(|err| quota_or_sqlite(err, value.len()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// SQLITE_FULL is the database-level equivalent of a storage quota.
fn quota_or_sqlite(err: rusqlite::Error, needed: usize) -> PersistError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::DiskFull => {
            PersistError::QuotaExceeded { needed, limit: 0 }
        }
        _ => PersistError::Sqlite(err),
    }
}
