/// Versioned journal blob codec with eviction and quota fallback.
pub mod codec;
/// In-memory key-value store.
pub mod memory;
/// SQLite-backed key-value store.
pub mod sqlite;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage quota exceeded: {needed} bytes needed, limit {limit}")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
}

impl PersistError {
    /// True when the store refused the write for lack of space.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Durable string key-value store backing the journal.
///
/// Writes replace the whole value for a key.
pub trait KvStore: Send {
    fn get(&self, key: &str) -> PersistResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> PersistResult<()>;
    fn remove(&mut self, key: &str) -> PersistResult<()>;
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        (**self).remove(key)
    }
}

impl<S: KvStore + ?Sized> KvStore for &mut S {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        (**self).remove(key)
    }
}
