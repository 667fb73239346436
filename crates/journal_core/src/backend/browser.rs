//! Browser backend: key-value store facade plus download/upload seams.

use super::host::{DownloadSink, FilePicker};
use super::{BackendKind, StorageBackend, StorageStats};
use crate::kv::KvStore;
use crate::persistence::{Persistence, StorageInfo, StorageKey};
use crate::snapshot::{self, backup_file_name, StorageSnapshot};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde_json::Value;

pub struct BrowserBackend<S: KvStore> {
    persistence: Persistence<S>,
    downloads: Box<dyn DownloadSink>,
    picker: Box<dyn FilePicker>,
    last_backup: Option<DateTime<Utc>>,
}

impl<S: KvStore> BrowserBackend<S> {
    pub fn new(
        persistence: Persistence<S>,
        downloads: Box<dyn DownloadSink>,
        picker: Box<dyn FilePicker>,
    ) -> Self {
        Self {
            persistence,
            downloads,
            picker,
            last_backup: None,
        }
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut Persistence<S> {
        &mut self.persistence
    }
}

impl<S: KvStore> StorageBackend for BrowserBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::Browser
    }

    fn save(&mut self, key: StorageKey, value: &Value) -> bool {
        self.persistence.save(key, value).is_ok()
    }

    fn load(&self, key: StorageKey) -> Option<Value> {
        self.persistence.load_value(key)
    }

    fn export(&mut self, snapshot: &StorageSnapshot) -> bool {
        let now = Utc::now();
        let text = match snapshot::export_snapshot_at(snapshot, now) {
            Ok(text) => text,
            Err(err) => {
                error!(
                    "event=export module=backend status=error kind=browser error={}",
                    err
                );
                return false;
            }
        };
        match self
            .downloads
            .deliver(&backup_file_name(now.date_naive()), &text)
        {
            Ok(()) => {
                self.last_backup = Some(now);
                info!("event=export module=backend status=ok kind=browser");
                true
            }
            Err(err) => {
                error!(
                    "event=export module=backend status=error kind=browser error={}",
                    err
                );
                false
            }
        }
    }

    fn import(&mut self) -> Option<StorageSnapshot> {
        let Some(text) = self.picker.pick_text() else {
            info!("event=import module=backend status=cancelled kind=browser");
            return None;
        };
        snapshot::import_snapshot(&text).ok()
    }

    fn stats(&self) -> StorageStats {
        let info = self.persistence.storage_info();
        StorageStats {
            total_size: info.total_size,
            entries_count: info.entries_count,
            goals_count: info.goals_count,
            health_data_count: info.health_data_count,
            finance_data_count: info.finance_data_count,
            last_backup: self.last_backup,
            storage_type: BackendKind::Browser,
        }
    }

    fn clear_all(&mut self) -> bool {
        self.persistence.clear_all().is_ok()
    }

    fn storage_info(&self) -> Option<StorageInfo> {
        Some(self.persistence.storage_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FixedPaths, NoHost};
    use crate::config::StorageConfig;
    use crate::kv::MemoryKvStore;
    use serde_json::json;

    fn backend_with(paths: FixedPaths) -> BrowserBackend<MemoryKvStore> {
        BrowserBackend::new(
            Persistence::new(MemoryKvStore::new(), StorageConfig::default()),
            Box::new(paths.clone()),
            Box::new(paths),
        )
    }

    #[test]
    fn save_and_load_go_through_the_facade() {
        let mut backend = backend_with(FixedPaths::default());
        assert!(backend.save(StorageKey::Goals, &json!([{"id": 3}])));
        assert_eq!(backend.load(StorageKey::Goals), Some(json!([{"id": 3}])));
        assert_eq!(backend.stats().goals_count, 1);
    }

    #[test]
    fn export_delivers_named_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = backend_with(FixedPaths {
            save: Some(dir.path().to_path_buf()),
            open: None,
        });

        assert!(backend.export(&StorageSnapshot::default()));
        let delivered = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].starts_with("journal-backup-"));
        assert!(backend.stats().last_backup.is_some());
    }

    #[test]
    fn import_without_picked_file_is_none() {
        let mut backend = BrowserBackend::new(
            Persistence::new(MemoryKvStore::new(), StorageConfig::default()),
            Box::new(NoHost),
            Box::new(NoHost),
        );
        assert!(backend.import().is_none());
        assert!(!backend.export(&StorageSnapshot::default()));
    }
}
