//! Core storage layer for the personal journal.
//! This crate owns record shapes, on-disk formats and storage invariants.

pub mod backend;
pub mod codec;
pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod service;
pub mod snapshot;

pub use backend::{
    open_backend, BackendKind, BrowserBackend, DesktopBackend, FixedPaths, HostIo,
    StorageBackend, StorageEnvironment, StorageStats,
};
pub use codec::{compress, decompress, CodecError, CodecResult};
pub use config::StorageConfig;
pub use kv::{open_preferred_store, AnyStore, KvError, KvStore, MemoryKvStore, SqliteKvStore, StoreKind};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{EntryCategory, EntryDraft, EntryPatch, JournalEntry};
pub use model::finance::FinanceRecord;
pub use model::goal::{Goal, GoalCategory, GoalDraft, GoalPatch, Milestone, Priority};
pub use model::health::HealthRecord;
pub use model::id::{RecordId, RecordIdGenerator};
pub use model::profile::{OnboardingData, ProfileData};
pub use model::record::{Record, RecordKind, ValidationError};
pub use persistence::{PersistError, PersistResult, Persistence, StorageInfo, StorageKey};
pub use service::session::{ImportSummary, SessionError, SessionResult, StorageSession, WriteReceipt};
pub use snapshot::{
    backup_file_name, backup_snapshot, export_snapshot, import_snapshot, parse_stored_value,
    restore_snapshot, ImportError, StorageSnapshot, SNAPSHOT_VERSION,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
