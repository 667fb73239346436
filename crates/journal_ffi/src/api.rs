//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose journal storage use cases to Dart via FRB.
//! - Translate core results into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call opens the configured backend, runs one session operation and
//!   closes it; calls are serialised by a process-wide lock.
//! - Payloads are UTF-8 JSON strings in the stored wire shape.

use journal_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_backend,
    parse_stored_value, ping as ping_inner, EntryCategory, EntryDraft, FixedPaths, HostIo,
    OnboardingData, StorageConfig, StorageKey, StorageSession,
};
use log::warn;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const DEFAULT_DB_FILE_NAME: &str = "journal_store.sqlite3";
static STORAGE_CONFIG: OnceLock<StorageConfig> = OnceLock::new();
static SESSION_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the operation succeeded and reached storage.
    pub ok: bool,
    /// Id of the created or affected record, when there is one.
    pub record_id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, record_id: Option<i64>) -> Self {
        Self {
            ok: true,
            record_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

/// JSON payload response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadResponse {
    pub ok: bool,
    /// JSON text; `"[]"` / `"null"` when nothing is stored.
    pub payload: String,
    pub message: String,
}

/// Storage statistics envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageStatsResponse {
    pub total_size: u64,
    pub entries_count: u32,
    pub goals_count: u32,
    pub health_data_count: u32,
    pub finance_data_count: u32,
    /// `desktop` or `browser`.
    pub storage_type: String,
    /// Percentage of the advisory capacity; `0.0` for desktop storage.
    pub usage_percentage: f64,
    pub is_near_limit: bool,
}

/// Creates a journal entry.
///
/// # FFI contract
/// - `category` is one of `general|business|personal|goals|ideas`.
/// - Returns the new entry id; `ok=false` with reason on validation or
///   storage failure.
#[flutter_rust_bridge::frb(sync)]
pub fn add_entry(
    title: String,
    content: String,
    mood: u8,
    energy: u8,
    category: String,
    tags: Vec<String>,
) -> ActionResponse {
    add_entry_with(
        resolve_storage_config(),
        title,
        content,
        mood,
        energy,
        category,
        tags,
    )
}

/// Reads a stored collection (or object) as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn load_collection(key: String) -> PayloadResponse {
    load_collection_with(resolve_storage_config(), &key)
}

/// Replaces the value stored under `key` with `json`.
///
/// # FFI contract
/// - `key` must be a well-known storage key.
/// - `json` must parse; nothing is written otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn save_collection(key: String, json: String) -> ActionResponse {
    save_collection_with(resolve_storage_config(), &key, &json)
}

#[flutter_rust_bridge::frb(sync)]
pub fn storage_stats() -> StorageStatsResponse {
    storage_stats_with(resolve_storage_config())
}

/// Writes a backup file to `path` (a file or an existing directory).
#[flutter_rust_bridge::frb(sync)]
pub fn export_backup(path: String) -> ActionResponse {
    export_backup_with(resolve_storage_config(), &path)
}

/// Validates the backup at `path` and replaces stored collections with it.
#[flutter_rust_bridge::frb(sync)]
pub fn import_backup(path: String) -> ActionResponse {
    import_backup_with(resolve_storage_config(), &path)
}

/// Removes every stored collection, profile and onboarding state.
#[flutter_rust_bridge::frb(sync)]
pub fn clear_all_data() -> ActionResponse {
    clear_all_data_with(resolve_storage_config())
}

#[flutter_rust_bridge::frb(sync)]
pub fn complete_onboarding(name: String, age: u32, occupation: String) -> ActionResponse {
    complete_onboarding_with(resolve_storage_config(), name, age, occupation)
}

#[flutter_rust_bridge::frb(sync)]
pub fn skip_onboarding() -> ActionResponse {
    with_session(resolve_storage_config(), HostIo::none(), |session| {
        if session.skip_onboarding() {
            ActionResponse::success("Onboarding skipped.", None)
        } else {
            ActionResponse::failure("skip_onboarding failed: storage rejected the write")
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_completed() -> bool {
    with_session(resolve_storage_config(), HostIo::none(), |session| {
        session.onboarding_completed()
    })
}

fn add_entry_with(
    config: &StorageConfig,
    title: String,
    content: String,
    mood: u8,
    energy: u8,
    category: String,
    tags: Vec<String>,
) -> ActionResponse {
    let Some(category) = parse_category(&category) else {
        return ActionResponse::failure(format!("add_entry failed: unknown category `{category}`"));
    };
    let draft = EntryDraft {
        title: title.trim().to_string(),
        content,
        mood,
        energy,
        category,
        tags: tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
    };

    with_session(config, HostIo::none(), |session| {
        match session.add_entry(draft) {
            Ok(receipt) if receipt.persisted => {
                ActionResponse::success("Entry saved.", Some(receipt.id))
            }
            Ok(receipt) => ActionResponse {
                ok: false,
                record_id: Some(receipt.id),
                message: "add_entry failed: storage rejected the write".to_string(),
            },
            Err(err) => ActionResponse::failure(format!("add_entry failed: {err}")),
        }
    })
}

fn load_collection_with(config: &StorageConfig, key: &str) -> PayloadResponse {
    let Some(key) = StorageKey::parse(key) else {
        return PayloadResponse {
            ok: false,
            payload: String::new(),
            message: format!("load_collection failed: unknown key `{key}`"),
        };
    };
    with_session(config, HostIo::none(), |session| {
        let value = session.backend().load(key).unwrap_or_else(|| empty_value(key));
        PayloadResponse {
            ok: true,
            payload: value.to_string(),
            message: String::new(),
        }
    })
}

fn save_collection_with(config: &StorageConfig, key: &str, json: &str) -> ActionResponse {
    let Some(key) = StorageKey::parse(key) else {
        return ActionResponse::failure(format!("save_collection failed: unknown key `{key}`"));
    };
    let value = match parse_stored_value(key, json) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "event=ffi_save module=ffi status=rejected key={} error={}",
                key, err
            );
            return ActionResponse::failure(format!("save_collection failed: {err}"));
        }
    };

    let _guard = lock_session();
    let mut backend = open_backend(config, HostIo::none());
    if backend.save(key, &value) {
        ActionResponse::success("Saved.", None)
    } else {
        ActionResponse::failure("save_collection failed: storage rejected the write")
    }
}

fn storage_stats_with(config: &StorageConfig) -> StorageStatsResponse {
    with_session(config, HostIo::none(), |session| {
        let stats = session.stats();
        let info = session.storage_info();
        StorageStatsResponse {
            total_size: stats.total_size,
            entries_count: count_u32(stats.entries_count),
            goals_count: count_u32(stats.goals_count),
            health_data_count: count_u32(stats.health_data_count),
            finance_data_count: count_u32(stats.finance_data_count),
            storage_type: stats.storage_type.as_str().to_string(),
            usage_percentage: info.as_ref().map_or(0.0, |info| info.usage_percentage),
            is_near_limit: info.as_ref().is_some_and(|info| info.is_near_limit),
        }
    })
}

fn export_backup_with(config: &StorageConfig, path: &str) -> ActionResponse {
    let Some(path) = non_empty_path(path) else {
        return ActionResponse::failure("export_backup failed: empty path");
    };
    let host = HostIo::fixed(FixedPaths {
        save: Some(path),
        open: None,
    });
    with_session(config, host, |session| {
        if session.export() {
            ActionResponse::success("Backup exported.", None)
        } else {
            ActionResponse::failure("export_backup failed: backup could not be written")
        }
    })
}

fn import_backup_with(config: &StorageConfig, path: &str) -> ActionResponse {
    let Some(path) = non_empty_path(path) else {
        return ActionResponse::failure("import_backup failed: empty path");
    };
    let host = HostIo::fixed(FixedPaths {
        save: None,
        open: Some(path),
    });
    with_session(config, host, |session| match session.import() {
        Some(summary) if summary.persisted => ActionResponse::success(
            format!(
                "Imported {} entries and {} goals.",
                summary.entries, summary.goals
            ),
            None,
        ),
        Some(_) => ActionResponse::failure("import_backup failed: storage rejected the write"),
        None => ActionResponse::failure("import_backup failed: invalid or unreadable backup"),
    })
}

fn clear_all_data_with(config: &StorageConfig) -> ActionResponse {
    with_session(config, HostIo::none(), |session| {
        if session.clear_all() {
            ActionResponse::success("All data cleared.", None)
        } else {
            ActionResponse::failure("clear_all_data failed: storage could not be cleared")
        }
    })
}

fn complete_onboarding_with(
    config: &StorageConfig,
    name: String,
    age: u32,
    occupation: String,
) -> ActionResponse {
    let data = OnboardingData {
        name: name.trim().to_string(),
        age,
        occupation: occupation.trim().to_string(),
    };
    with_session(config, HostIo::none(), |session| {
        match session.complete_onboarding(data) {
            Ok(true) => ActionResponse::success("Onboarding completed.", None),
            Ok(false) => {
                ActionResponse::failure("complete_onboarding failed: storage rejected the write")
            }
            Err(err) => ActionResponse::failure(format!("complete_onboarding failed: {err}")),
        }
    })
}

fn with_session<T>(
    config: &StorageConfig,
    host: HostIo,
    f: impl FnOnce(&mut StorageSession) -> T,
) -> T {
    let _guard = lock_session();
    let mut session = StorageSession::open(open_backend(config, host));
    let result = f(&mut session);
    session.close();
    result
}

fn lock_session() -> std::sync::MutexGuard<'static, ()> {
    SESSION_LOCK.lock().unwrap_or_else(|poisoned| {
        warn!("event=ffi_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    })
}

fn resolve_storage_config() -> &'static StorageConfig {
    STORAGE_CONFIG.get_or_init(|| {
        let mut config = StorageConfig::from_env();
        if config.desktop_data_dir.is_none() && config.database_path.is_none() {
            config.database_path = Some(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        }
        config
    })
}

fn parse_category(raw: &str) -> Option<EntryCategory> {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Some(EntryCategory::default());
    }
    serde_json::from_value(Value::String(normalized)).ok()
}

fn empty_value(key: StorageKey) -> Value {
    if StorageKey::COLLECTIONS.contains(&key) {
        Value::Array(Vec::new())
    } else {
        Value::Null
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
