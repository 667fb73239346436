//! Storage configuration.
//!
//! # Responsibility
//! - Hold the advisory capacity numbers used by storage accounting.
//! - Decide where desktop files and the database store live.
//!
//! # Invariants
//! - Defaults reproduce the historical behaviour: 5 MiB ceiling, warning
//!   above 80%, 1 MiB database estimate.
//! - Environment overrides never fail; unparsable values are ignored.

use log::warn;
use serde::Deserialize;
use std::path::PathBuf;

/// Advisory storage ceiling in bytes.
pub const DEFAULT_CAPACITY_BYTES: u64 = 5 * 1024 * 1024;
/// Usage percentage above which storage is reported as near its limit.
pub const DEFAULT_NEAR_LIMIT_PERCENT: f64 = 80.0;
/// Size credited to the database store in storage accounting.
pub const DEFAULT_DATABASE_ESTIMATE_BYTES: u64 = 1024 * 1024;

pub const ENV_DATA_DIR: &str = "JOURNAL_DATA_DIR";
pub const ENV_DB_PATH: &str = "JOURNAL_DB_PATH";
pub const ENV_CAPACITY_BYTES: &str = "JOURNAL_CAPACITY_BYTES";
pub const ENV_NEAR_LIMIT_PERCENT: &str = "JOURNAL_NEAR_LIMIT_PERCENT";
pub const ENV_COMPRESS_AT_REST: &str = "JOURNAL_COMPRESS_AT_REST";

/// Runtime storage settings shared by every backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Advisory ceiling; writes are never rejected because of it.
    pub capacity_bytes: u64,
    /// Near-limit threshold as a percentage of `capacity_bytes`.
    pub near_limit_percent: f64,
    /// Flat estimate added to the total when the database store is active.
    pub database_estimate_bytes: u64,
    /// Write values through the compression codec.
    pub compress_at_rest: bool,
    /// When set, the desktop backend stores one file per collection here.
    pub desktop_data_dir: Option<PathBuf>,
    /// When set, the browser backend prefers a SQLite store at this path.
    pub database_path: Option<PathBuf>,
    /// Hard quota for the in-memory store, mimicking a browser quota.
    pub memory_quota_bytes: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            near_limit_percent: DEFAULT_NEAR_LIMIT_PERCENT,
            database_estimate_bytes: DEFAULT_DATABASE_ESTIMATE_BYTES,
            compress_at_rest: true,
            desktop_data_dir: None,
            database_path: None,
            memory_quota_bytes: None,
        }
    }
}

impl StorageConfig {
    /// Defaults overlaid with `JOURNAL_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = non_empty(lookup(ENV_DATA_DIR)) {
            self.desktop_data_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = non_empty(lookup(ENV_DB_PATH)) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = non_empty(lookup(ENV_CAPACITY_BYTES)) {
            match raw.parse::<u64>() {
                Ok(value) if value > 0 => self.capacity_bytes = value,
                _ => warn!("event=config_override module=config status=ignored var={ENV_CAPACITY_BYTES}"),
            }
        }
        if let Some(raw) = non_empty(lookup(ENV_NEAR_LIMIT_PERCENT)) {
            match raw.parse::<f64>() {
                Ok(value) if (0.0..=100.0).contains(&value) => self.near_limit_percent = value,
                _ => warn!(
                    "event=config_override module=config status=ignored var={ENV_NEAR_LIMIT_PERCENT}"
                ),
            }
        }
        if let Some(raw) = non_empty(lookup(ENV_COMPRESS_AT_REST)) {
            match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.compress_at_rest = true,
                "0" | "false" | "no" | "off" => self.compress_at_rest = false,
                _ => warn!(
                    "event=config_override module=config status=ignored var={ENV_COMPRESS_AT_REST}"
                ),
            }
        }
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_historical_limits() {
        let config = StorageConfig::default();
        assert_eq!(config.capacity_bytes, 5 * 1024 * 1024);
        assert_eq!(config.near_limit_percent, 80.0);
        assert_eq!(config.database_estimate_bytes, 1024 * 1024);
        assert!(config.desktop_data_dir.is_none());
    }

    #[test]
    fn overrides_apply_valid_values_and_skip_garbage() {
        let config = StorageConfig::default().with_overrides(lookup_from(&[
            (ENV_DATA_DIR, " /tmp/journal "),
            (ENV_CAPACITY_BYTES, "not-a-number"),
            (ENV_NEAR_LIMIT_PERCENT, "90"),
            (ENV_COMPRESS_AT_REST, "off"),
        ]));

        assert_eq!(config.desktop_data_dir, Some(PathBuf::from("/tmp/journal")));
        assert_eq!(config.capacity_bytes, DEFAULT_CAPACITY_BYTES);
        assert_eq!(config.near_limit_percent, 90.0);
        assert!(!config.compress_at_rest);
    }

    #[test]
    fn config_deserializes_with_partial_fields() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"capacity_bytes": 1024, "database_path": "/x/db"}"#).unwrap();
        assert_eq!(config.capacity_bytes, 1024);
        assert_eq!(config.database_path, Some(PathBuf::from("/x/db")));
        assert_eq!(config.near_limit_percent, DEFAULT_NEAR_LIMIT_PERCENT);
    }
}
