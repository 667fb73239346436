//! Desktop backend: one pretty-printed JSON file per key.
//!
//! # Invariants
//! - Files are replaced atomically (temp file in the same directory, then
//!   rename), so a crash never leaves a half-written collection.
//! - A missing file reads as "absent", never as an error.

use super::host::{read_text, FileDialogs};
use super::{BackendKind, StorageBackend, StorageStats};
use crate::codec;
use crate::persistence::StorageKey;
use crate::snapshot::{self, backup_file_name, StorageSnapshot};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct DesktopBackend {
    data_dir: PathBuf,
    dialogs: Box<dyn FileDialogs>,
    last_backup: Option<DateTime<Utc>>,
}

impl DesktopBackend {
    pub fn new(data_dir: impl Into<PathBuf>, dialogs: Box<dyn FileDialogs>) -> Self {
        Self {
            data_dir: data_dir.into(),
            dialogs,
            last_backup: None,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, key: StorageKey) -> PathBuf {
        self.data_dir.join(key.file_name())
    }

    fn read_value(&self, key: StorageKey) -> Option<Value> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(
                    "event=file_load module=backend status=error key={} error={}",
                    key, err
                );
                return None;
            }
        };
        match codec::decompress(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=file_load module=backend status=malformed key={} error={}",
                    key, err
                );
                None
            }
        }
    }
}

/// Replaces `path` with `text` via a sibling temp file.
fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

impl StorageBackend for DesktopBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Desktop
    }

    fn save(&mut self, key: StorageKey, value: &Value) -> bool {
        let text = match serde_json::to_string_pretty(value) {
            Ok(text) => text,
            Err(err) => {
                error!(
                    "event=file_save module=backend status=error key={} error={}",
                    key, err
                );
                return false;
            }
        };
        match write_atomic(&self.path_for(key), &text) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "event=file_save module=backend status=error key={} error={}",
                    key, err
                );
                false
            }
        }
    }

    fn load(&self, key: StorageKey) -> Option<Value> {
        self.read_value(key)
    }

    fn export(&mut self, snapshot: &StorageSnapshot) -> bool {
        let now = Utc::now();
        let Some(path) = self.dialogs.save_path(&backup_file_name(now.date_naive())) else {
            info!("event=export module=backend status=cancelled kind=desktop");
            return false;
        };
        let written = snapshot::export_snapshot_at(snapshot, now)
            .map_err(|err| err.to_string())
            .and_then(|text| write_atomic(&path, &text).map_err(|err| err.to_string()));
        match written {
            Ok(()) => {
                self.last_backup = Some(now);
                info!("event=export module=backend status=ok kind=desktop");
                true
            }
            Err(err) => {
                error!(
                    "event=export module=backend status=error kind=desktop error={}",
                    err
                );
                false
            }
        }
    }

    fn import(&mut self) -> Option<StorageSnapshot> {
        let Some(path) = self.dialogs.open_path() else {
            info!("event=import module=backend status=cancelled kind=desktop");
            return None;
        };
        let text = read_text(&path)?;
        snapshot::import_snapshot(&text).ok()
    }

    fn stats(&self) -> StorageStats {
        let mut stats = StorageStats::empty(BackendKind::Desktop, self.last_backup);
        for key in StorageKey::COLLECTIONS {
            let path = self.path_for(key);
            let size = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
            let count = match self.read_value(key) {
                Some(Value::Array(items)) => items.len(),
                _ => 0,
            };
            stats.total_size += size;
            match key {
                StorageKey::JournalEntries => stats.entries_count = count,
                StorageKey::Goals => stats.goals_count = count,
                StorageKey::HealthData => stats.health_data_count = count,
                StorageKey::FinanceData => stats.finance_data_count = count,
                _ => {}
            }
        }
        stats
    }

    fn clear_all(&mut self) -> bool {
        let mut ok = true;
        for key in StorageKey::ALL {
            match fs::remove_file(self.path_for(key)) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    error!(
                        "event=file_clear module=backend status=error key={} error={}",
                        key, err
                    );
                    ok = false;
                }
            }
        }
        if ok {
            info!("event=file_clear module=backend status=ok kind=desktop");
        }
        ok
    }
}
