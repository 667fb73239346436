//! In-memory key-value store with an optional hard quota.

use super::{KvError, KvResult, KvStore, StoreKind};

/// Insertion-ordered string map; models browser local storage.
#[derive(Debug, Clone)]
pub struct MemoryKvStore {
    entries: Vec<(String, String)>,
    quota_bytes: Option<u64>,
    writable: bool,
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            quota_bytes: None,
            writable: true,
        }
    }

    /// Store that rejects writes once keys + values exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Toggles write access, as when a browser locks storage in private mode.
    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn ensure_writable(&self) -> KvResult<()> {
        if !self.writable {
            return Err(KvError::Unavailable("store is read-only".to_string()));
        }
        Ok(())
    }

    fn bytes_without(&self, key: &str) -> u64 {
        self.entries
            .iter()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum()
    }
}

impl KvStore for MemoryKvStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Local
    }

    fn get(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        self.ensure_writable()?;
        if let Some(quota) = self.quota_bytes {
            let required = self.bytes_without(key) + (key.len() + value.len()) as u64;
            if required > quota {
                return Err(KvError::QuotaExceeded { required, quota });
            }
        }

        match self.position(key) {
            Some(index) => self.entries[index].1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.ensure_writable()?;
        if let Some(index) = self.position(key) {
            self.entries.remove(index);
        }
        Ok(())
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        Ok(self.entries.iter().map(|(k, _)| k.clone()).collect())
    }

    fn used_bytes(&self) -> KvResult<u64> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum())
    }
}
