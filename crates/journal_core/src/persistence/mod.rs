//! Persistence facade over a local key-value store.
//!
//! # Responsibility
//! - Be the single place that serialises collections into the store.
//! - Degrade every read failure to an empty/default value.
//! - Account storage size against the advisory capacity ceiling.
//!
//! # Invariants
//! - `load*` never fails: absent or malformed content yields the default.
//! - A failed `save` leaves the previously stored value in place.
//! - `clear_all` reports every key it left behind; on the database store it
//!   removes all keys or none.

use crate::codec::{self, CodecError};
use crate::config::StorageConfig;
use crate::kv::{KvError, KvStore, StoreKind};
use crate::model::record::Record;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod key;
mod report;

pub use report::StorageInfo;
pub use key::StorageKey;

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug)]
pub enum PersistError {
    Encode(CodecError),
    Store { key: StorageKey, source: KvError },
    ClearIncomplete { failed: Vec<StorageKey> },
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "{err}"),
            Self::Store { key, source } => write!(f, "failed to write `{key}`: {source}"),
            Self::ClearIncomplete { failed } => {
                let names = failed
                    .iter()
                    .map(|key| key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "failed to clear: {names}")
            }
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Store { source, .. } => Some(source),
            Self::ClearIncomplete { .. } => None,
        }
    }
}

impl From<CodecError> for PersistError {
    fn from(value: CodecError) -> Self {
        Self::Encode(value)
    }
}

/// Facade owning the active key-value store.
#[derive(Debug)]
pub struct Persistence<S: KvStore> {
    store: S,
    config: StorageConfig,
}

impl<S: KvStore> Persistence<S> {
    pub fn new(store: S, config: StorageConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Serialises `value` and writes it under `key`.
    ///
    /// # Errors
    /// - `Encode` when `value` cannot be serialised.
    /// - `Store` when the store rejects the write (quota, read-only).
    pub fn save<T: Serialize + ?Sized>(&mut self, key: StorageKey, value: &T) -> PersistResult<()> {
        let text = if self.config.compress_at_rest {
            codec::compress(value)?
        } else {
            serde_json::to_string(value).map_err(CodecError::Encode)?
        };

        match self.store.set(key.as_str(), &text) {
            Ok(()) => {
                debug!(
                    "event=kv_save module=persistence status=ok key={} bytes={}",
                    key,
                    text.len()
                );
                Ok(())
            }
            Err(source) => {
                error!(
                    "event=kv_save module=persistence status=error key={} bytes={} error={}",
                    key,
                    text.len(),
                    source
                );
                Err(PersistError::Store { key, source })
            }
        }
    }

    /// Writes `text` verbatim, bypassing the codec (flag values).
    pub fn save_raw(&mut self, key: StorageKey, text: &str) -> PersistResult<()> {
        self.store
            .set(key.as_str(), text)
            .map_err(|source| PersistError::Store { key, source })
    }

    /// Stored text under `key`, as written.
    pub fn load_raw(&self, key: StorageKey) -> Option<String> {
        self.store.get(key.as_str()).ok().flatten()
    }

    /// Raw JSON under `key`, or `None` when absent, unreadable or malformed.
    pub fn load_value(&self, key: StorageKey) -> Option<Value> {
        let text = match self.store.get(key.as_str()) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                warn!(
                    "event=kv_load module=persistence status=error key={} error={}",
                    key, err
                );
                return None;
            }
        };

        match codec::decompress(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=kv_load module=persistence status=malformed key={} error={}",
                    key, err
                );
                None
            }
        }
    }

    /// Typed value under `key`; `T::default()` when absent or malformed.
    pub fn load<T: DeserializeOwned + Default>(&self, key: StorageKey) -> T {
        let Some(value) = self.load_value(key) else {
            return T::default();
        };
        serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(
                "event=kv_load module=persistence status=malformed key={} error={}",
                key, err
            );
            T::default()
        })
    }

    /// Record list under `key`, keeping only elements that decode and validate.
    ///
    /// Elements that fail are dropped individually so one damaged record does
    /// not hide the rest of the collection.
    pub fn load_collection<R: Record + DeserializeOwned>(&self, key: StorageKey) -> Vec<R> {
        let items = match self.load_value(key) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                warn!("event=kv_load module=persistence status=malformed key={key} reason=not_a_list");
                return Vec::new();
            }
            None => return Vec::new(),
        };

        retain_valid_records(key, items)
    }

    /// Element count of the list under `key` (0 when absent or not a list).
    pub fn count_items(&self, key: StorageKey) -> usize {
        match self.load_value(key) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }

    /// Removes every well-known key.
    ///
    /// # Errors
    /// - `ClearIncomplete` listing keys still stored. The database store
    ///   removes all keys or none; the local store removes what it can.
    pub fn clear_all(&mut self) -> PersistResult<()> {
        let keys = StorageKey::ALL.map(StorageKey::as_str);
        match self.store.remove_keys(&keys) {
            Ok(()) => {
                info!("event=kv_clear module=persistence status=ok keys={}", keys.len());
                Ok(())
            }
            Err(err) => {
                let failed: Vec<StorageKey> = err
                    .kept
                    .iter()
                    .filter_map(|&index| StorageKey::ALL.get(index).copied())
                    .collect();
                error!(
                    "event=kv_clear module=persistence status=error kept={} error={}",
                    failed.len(),
                    err.source
                );
                Err(PersistError::ClearIncomplete { failed })
            }
        }
    }

    /// Size and count report; zeroed when the store cannot be read.
    pub fn storage_info(&self) -> StorageInfo {
        let kind = self.store.kind();
        let used = match self.store.used_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    "event=storage_info module=persistence status=error error={}",
                    err
                );
                return StorageInfo::empty(&self.config, kind);
            }
        };

        let estimate = match kind {
            StoreKind::Database => self.config.database_estimate_bytes,
            StoreKind::Local => 0,
        };

        StorageInfo::compute(
            &self.config,
            kind,
            used + estimate,
            [
                self.count_items(StorageKey::JournalEntries),
                self.count_items(StorageKey::Goals),
                self.count_items(StorageKey::HealthData),
                self.count_items(StorageKey::FinanceData),
            ],
        )
    }
}

/// Decodes list items into records, dropping ones that fail to decode,
/// fail validation or repeat an earlier id.
pub(crate) fn retain_valid_records<R: Record + DeserializeOwned>(
    key: StorageKey,
    items: Vec<Value>,
) -> Vec<R> {
    let total = items.len();
    let mut seen = HashSet::with_capacity(total);
    let records = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<R>(item).ok())
        .filter(|record| record.validate().is_ok())
        .filter(|record| seen.insert(record.record_id()))
        .collect::<Vec<_>>();

    if records.len() < total {
        warn!(
            "event=kv_load module=persistence status=partial key={} kept={} dropped={}",
            key,
            records.len(),
            total - records.len()
        );
    }
    records
}
