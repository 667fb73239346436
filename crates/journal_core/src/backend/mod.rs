//! Environment-aware storage backends.
//!
//! # Responsibility
//! - Offer one save/load/export/import/stats/clear contract for both the
//!   desktop (file per collection) and browser (key-value store) hosts.
//! - Probe the environment once at startup and build the matching backend.
//!
//! # Invariants
//! - Backend operations never panic and never return `Err`; failures surface
//!   as `false` / `None` and are logged.
//! - Transfers take `&mut self`, so one export or import resolves before the
//!   next can begin.
//!
//! # See also
//! - `crate::persistence` for the browser store facade.
//! - `crate::snapshot` for the backup document format.

use crate::config::StorageConfig;
use crate::kv::open_preferred_store;
use crate::persistence::{Persistence, StorageInfo, StorageKey};
use crate::snapshot::StorageSnapshot;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

mod browser;
mod desktop;
mod host;

pub use browser::BrowserBackend;
pub use desktop::DesktopBackend;
pub use host::{DownloadSink, FileDialogs, FilePicker, FixedPaths, HostIo, NoHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Desktop,
    Browser,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Browser => "browser",
        }
    }
}

/// Counts and size reported by either backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_size: u64,
    pub entries_count: usize,
    pub goals_count: usize,
    pub health_data_count: usize,
    pub finance_data_count: usize,
    /// Time of the last successful export from this backend, if any.
    pub last_backup: Option<DateTime<Utc>>,
    pub storage_type: BackendKind,
}

impl StorageStats {
    pub fn empty(kind: BackendKind, last_backup: Option<DateTime<Utc>>) -> Self {
        Self {
            total_size: 0,
            entries_count: 0,
            goals_count: 0,
            health_data_count: 0,
            finance_data_count: 0,
            last_backup,
            storage_type: kind,
        }
    }
}

/// Storage operations shared by every host environment.
pub trait StorageBackend {
    fn kind(&self) -> BackendKind;
    /// Writes `value` under `key`; `false` on any failure.
    fn save(&mut self, key: StorageKey, value: &Value) -> bool;
    /// Stored value, or `None` when absent or unreadable.
    fn load(&self, key: StorageKey) -> Option<Value>;
    /// Hands an exported snapshot to the host; `false` when cancelled or failed.
    fn export(&mut self, snapshot: &StorageSnapshot) -> bool;
    /// Reads and validates a snapshot chosen by the host.
    fn import(&mut self) -> Option<StorageSnapshot>;
    fn stats(&self) -> StorageStats;
    fn clear_all(&mut self) -> bool;

    /// Capacity report, for backends that account against a quota.
    fn storage_info(&self) -> Option<StorageInfo> {
        None
    }
}

/// Host environment detected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEnvironment {
    Desktop { data_dir: PathBuf },
    Browser,
}

impl StorageEnvironment {
    /// Desktop when a data directory is configured, browser otherwise.
    pub fn detect(config: &StorageConfig) -> Self {
        match config.desktop_data_dir.as_ref() {
            Some(dir) => Self::Desktop {
                data_dir: dir.clone(),
            },
            None => Self::Browser,
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Desktop { .. } => BackendKind::Desktop,
            Self::Browser => BackendKind::Browser,
        }
    }
}

/// Builds the backend for the detected environment.
pub fn open_backend(config: &StorageConfig, host: HostIo) -> Box<dyn StorageBackend> {
    let environment = StorageEnvironment::detect(config);
    info!(
        "event=backend_open module=backend status=ok kind={}",
        environment.kind().as_str()
    );
    match environment {
        StorageEnvironment::Desktop { data_dir } => {
            Box::new(DesktopBackend::new(data_dir, host.dialogs))
        }
        StorageEnvironment::Browser => {
            let persistence = Persistence::new(open_preferred_store(config), config.clone());
            Box::new(BrowserBackend::new(persistence, host.downloads, host.picker))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_prefers_desktop_when_data_dir_is_configured() {
        let config = StorageConfig {
            desktop_data_dir: Some(PathBuf::from("/tmp/journal")),
            ..StorageConfig::default()
        };
        assert_eq!(
            StorageEnvironment::detect(&config),
            StorageEnvironment::Desktop {
                data_dir: PathBuf::from("/tmp/journal")
            }
        );
        assert_eq!(
            StorageEnvironment::detect(&StorageConfig::default()),
            StorageEnvironment::Browser
        );
    }

    #[test]
    fn open_backend_builds_browser_backend_by_default() {
        let backend = open_backend(&StorageConfig::default(), HostIo::none());
        assert_eq!(backend.kind(), BackendKind::Browser);
        assert!(backend.storage_info().is_some());
    }

    #[test]
    fn stats_serialise_storage_type_in_lowercase() {
        let json = serde_json::to_value(StorageStats::empty(BackendKind::Desktop, None)).unwrap();
        assert_eq!(json["storageType"], "desktop");
        assert_eq!(json["healthDataCount"], 0);
        assert!(json["lastBackup"].is_null());
    }
}
