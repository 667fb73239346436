//! Storage usage report.

use crate::config::StorageConfig;
use crate::kv::StoreKind;
use serde::Serialize;

/// Size and count snapshot of the active store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub total_size: u64,
    pub max_size: u64,
    /// Percentage of `max_size`, rounded to two decimals.
    pub usage_percentage: f64,
    pub entries_count: usize,
    pub goals_count: usize,
    pub health_data_count: usize,
    pub finance_data_count: usize,
    pub is_near_limit: bool,
    pub storage_type: String,
    #[serde(skip)]
    pub kind: StoreKind,
}

impl StorageInfo {
    /// Report for `total` bytes and `[entries, goals, health, finance]` counts.
    pub fn compute(config: &StorageConfig, kind: StoreKind, total: u64, counts: [usize; 4]) -> Self {
        let usage = usage_percentage(total, config.capacity_bytes);
        let [entries, goals, health, finance] = counts;
        Self {
            total_size: total,
            max_size: config.capacity_bytes,
            usage_percentage: usage,
            entries_count: entries,
            goals_count: goals,
            health_data_count: health,
            finance_data_count: finance,
            is_near_limit: usage > config.near_limit_percent,
            storage_type: kind.label().to_string(),
            kind,
        }
    }

    /// Zeroed report used when the store cannot be read.
    pub fn empty(config: &StorageConfig, kind: StoreKind) -> Self {
        Self::compute(config, kind, 0, [0; 4])
    }
}

fn usage_percentage(total: u64, capacity: u64) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    let raw = total as f64 / capacity as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_rounded_to_two_decimals() {
        let config = StorageConfig {
            capacity_bytes: 3,
            ..StorageConfig::default()
        };
        let info = StorageInfo::compute(&config, StoreKind::Local, 1, [0; 4]);
        assert_eq!(info.usage_percentage, 33.33);
    }

    #[test]
    fn near_limit_is_strictly_above_threshold() {
        let config = StorageConfig {
            capacity_bytes: 100,
            ..StorageConfig::default()
        };
        assert!(!StorageInfo::compute(&config, StoreKind::Local, 80, [0; 4]).is_near_limit);
        assert!(StorageInfo::compute(&config, StoreKind::Local, 81, [0; 4]).is_near_limit);
    }

    #[test]
    fn serialises_camel_case_with_type_label() {
        let info = StorageInfo::empty(&StorageConfig::default(), StoreKind::Database);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["maxSize"], 5 * 1024 * 1024);
        assert_eq!(json["storageType"], "database + local storage");
        assert_eq!(json["isNearLimit"], false);
        assert!(json.get("kind").is_none());
    }
}
