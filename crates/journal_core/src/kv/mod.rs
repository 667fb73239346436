//! Local key-value stores behind the persistence facade.
//!
//! # Responsibility
//! - Define the string-to-string store contract the facade writes through.
//! - Provide a quota-bounded in-memory store and a SQLite-backed store.
//! - Pick the preferred store at startup, falling back to memory.
//!
//! # Invariants
//! - Stores never interpret values; (de)serialisation is the facade's job.
//! - A failed `set` leaves the previous value in place.

use crate::config::StorageConfig;
use crate::db::DbError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub type KvResult<T> = Result<T, KvError>;

#[derive(Debug)]
pub enum KvError {
    /// Write would push the store past its hard quota.
    QuotaExceeded { required: u64, quota: u64 },
    /// The store refuses access (locked, read-only, closed).
    Unavailable(String),
    Db(DbError),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded { required, quota } => write!(
                f,
                "storage quota exceeded: {required} bytes required, {quota} allowed"
            ),
            Self::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Statement(value))
    }
}

/// Batch removal that left some keys in place.
#[derive(Debug)]
pub struct RemoveKeysError {
    /// Indices into the requested keys that are still stored.
    pub kept: Vec<usize>,
    /// First failure encountered.
    pub source: KvError,
}

impl Display for RemoveKeysError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} key(s) not removed: {}", self.kept.len(), self.source)
    }
}

impl Error for RemoveKeysError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Which physical store backs the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Volatile, quota-bounded store (browser local storage).
    Local,
    /// Larger durable SQLite store.
    Database,
}

impl StoreKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "local storage only",
            Self::Database => "database + local storage",
        }
    }
}

/// Minimal string key-value contract.
pub trait KvStore {
    fn kind(&self) -> StoreKind;
    fn get(&self, key: &str) -> KvResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> KvResult<()>;
    /// Removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> KvResult<()>;
    /// Every stored key, including ones the journal does not own.
    fn keys(&self) -> KvResult<Vec<String>>;

    /// Removes every key in `keys`.
    ///
    /// Keys are attempted one by one; those that fail stay listed in the
    /// error. Stores with transactions override this to remove all or none.
    fn remove_keys(&mut self, keys: &[&str]) -> Result<(), RemoveKeysError> {
        let mut kept = Vec::new();
        let mut first_error = None;
        for (index, key) in keys.iter().enumerate() {
            if let Err(err) = self.remove(key) {
                kept.push(index);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            None => Ok(()),
            Some(source) => Err(RemoveKeysError { kept, source }),
        }
    }

    /// Sum of key and value lengths in bytes across every stored key.
    fn used_bytes(&self) -> KvResult<u64> {
        let mut total = 0u64;
        for key in self.keys()? {
            let value_len = self.get(&key)?.map_or(0, |value| value.len());
            total += (key.len() + value_len) as u64;
        }
        Ok(total)
    }
}

/// Store chosen at startup; enum dispatch keeps the facade monomorphic.
#[derive(Debug)]
pub enum AnyStore {
    Memory(MemoryKvStore),
    Database(SqliteKvStore),
}

impl KvStore for AnyStore {
    fn kind(&self) -> StoreKind {
        match self {
            Self::Memory(store) => store.kind(),
            Self::Database(store) => store.kind(),
        }
    }

    fn get(&self, key: &str) -> KvResult<Option<String>> {
        match self {
            Self::Memory(store) => store.get(key),
            Self::Database(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        match self {
            Self::Memory(store) => store.set(key, value),
            Self::Database(store) => store.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        match self {
            Self::Memory(store) => store.remove(key),
            Self::Database(store) => store.remove(key),
        }
    }

    fn remove_keys(&mut self, keys: &[&str]) -> Result<(), RemoveKeysError> {
        match self {
            Self::Memory(store) => store.remove_keys(keys),
            Self::Database(store) => store.remove_keys(keys),
        }
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        match self {
            Self::Memory(store) => store.keys(),
            Self::Database(store) => store.keys(),
        }
    }

    fn used_bytes(&self) -> KvResult<u64> {
        match self {
            Self::Memory(store) => store.used_bytes(),
            Self::Database(store) => store.used_bytes(),
        }
    }
}

/// Opens the database store when configured, else (or on failure) memory.
pub fn open_preferred_store(config: &StorageConfig) -> AnyStore {
    if let Some(path) = config.database_path.as_ref() {
        match SqliteKvStore::open(path) {
            Ok(store) => {
                info!("event=store_open module=kv status=ok kind=database");
                return AnyStore::Database(store);
            }
            Err(err) => {
                warn!(
                    "event=store_open module=kv status=fallback kind=memory error={}",
                    err
                );
            }
        }
    }

    let store = match config.memory_quota_bytes {
        Some(quota) => MemoryKvStore::with_quota(quota),
        None => MemoryKvStore::new(),
    };
    info!("event=store_open module=kv status=ok kind=memory");
    AnyStore::Memory(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_store_falls_back_to_memory_when_database_cannot_open() {
        let dir = tempfile::tempdir().unwrap();
        // A directory path cannot be opened as a database file.
        let config = StorageConfig {
            database_path: Some(dir.path().to_path_buf()),
            ..StorageConfig::default()
        };
        let store = open_preferred_store(&config);
        assert_eq!(store.kind(), StoreKind::Local);
    }

    #[test]
    fn preferred_store_uses_database_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: Some(dir.path().join("journal.sqlite3")),
            ..StorageConfig::default()
        };
        let mut store = open_preferred_store(&config);
        assert_eq!(store.kind(), StoreKind::Database);
        store.set("goals", "[]").unwrap();
        assert_eq!(store.get("goals").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn used_bytes_counts_keys_and_values() {
        let mut store = AnyStore::Memory(MemoryKvStore::new());
        store.set("ab", "1234").unwrap();
        store.set("c", "").unwrap();
        assert_eq!(store.used_bytes().unwrap(), 7);
    }
}
