//! Backup snapshots: export, validated import, backup and restore.
//!
//! # Responsibility
//! - Bundle every collection into one versioned, timestamped document.
//! - Reject malformed imports before anything is written.
//! - Restore a snapshot into the facade without touching absent sections.
//!
//! # Invariants
//! - `import_snapshot` returns either a fully validated snapshot or an error;
//!   it never has side effects.
//! - Only `entries` and `goals` are mandatory on import; both must be lists.
//!
//! # See also
//! - `crate::codec` for the on-disk text form.

use crate::codec::{self, CodecError, CodecResult};
use crate::kv::KvStore;
use crate::model::entry::JournalEntry;
use crate::model::finance::FinanceRecord;
use crate::model::goal::Goal;
use crate::model::health::HealthRecord;
use crate::model::profile::{OnboardingData, ProfileData};
use crate::model::record::{validate_collection, CollectionError, Record};
use crate::persistence::{PersistResult, Persistence, StorageKey};
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version stamped into every exported snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Full backup document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSnapshot {
    pub entries: Vec<JournalEntry>,
    pub goals: Vec<Goal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_data: Option<Vec<HealthRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finance_data: Option<Vec<FinanceRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_data: Option<ProfileData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl StorageSnapshot {
    /// Copy stamped with `now` and the current snapshot version.
    pub fn stamped(&self, now: DateTime<Utc>) -> Self {
        Self {
            export_date: Some(now),
            version: Some(SNAPSHOT_VERSION.to_string()),
            ..self.clone()
        }
    }
}

#[derive(Debug)]
pub enum ImportError {
    Codec(CodecError),
    /// Top level is not a JSON object.
    NotAnObject,
    MissingCollection(&'static str),
    NotAList(&'static str),
    /// A section does not decode into its record type.
    InvalidRecord {
        section: &'static str,
        source: serde_json::Error,
    },
    /// A record decoded but failed boundary validation.
    Validation {
        section: &'static str,
        source: CollectionError,
    },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Codec(err) => write!(f, "{err}"),
            Self::NotAnObject => write!(f, "backup must be a JSON object"),
            Self::MissingCollection(name) => write!(f, "backup has no `{name}` list"),
            Self::NotAList(name) => write!(f, "backup `{name}` must be a list"),
            Self::InvalidRecord { section, source } => {
                write!(f, "backup `{section}` is malformed: {source}")
            }
            Self::Validation { section, source } => {
                write!(f, "backup `{section}` is invalid: {source}")
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            Self::InvalidRecord { source, .. } => Some(source),
            Self::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CodecError> for ImportError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Stamps `snapshot` with the current time and encodes it.
pub fn export_snapshot(snapshot: &StorageSnapshot) -> CodecResult<String> {
    export_snapshot_at(snapshot, Utc::now())
}

/// `export_snapshot` with an explicit clock reading.
pub fn export_snapshot_at(snapshot: &StorageSnapshot, now: DateTime<Utc>) -> CodecResult<String> {
    let text = codec::compress(&snapshot.stamped(now))?;
    info!(
        "event=snapshot_export module=snapshot status=ok entries={} goals={} bytes={}",
        snapshot.entries.len(),
        snapshot.goals.len(),
        text.len()
    );
    Ok(text)
}

/// Parses and validates backup text (compressed or plain).
///
/// # Errors
/// - `Codec` when the text is not JSON.
/// - `MissingCollection` / `NotAList` when `entries` or `goals` is absent or
///   not a list.
/// - `InvalidRecord` / `Validation` when any record is malformed.
pub fn import_snapshot(text: &str) -> Result<StorageSnapshot, ImportError> {
    let result = decode_snapshot(text);
    match &result {
        Ok(snapshot) => info!(
            "event=snapshot_import module=snapshot status=ok entries={} goals={}",
            snapshot.entries.len(),
            snapshot.goals.len()
        ),
        Err(err) => warn!(
            "event=snapshot_import module=snapshot status=rejected error={}",
            err
        ),
    }
    result
}

fn decode_snapshot(text: &str) -> Result<StorageSnapshot, ImportError> {
    let mut map = match codec::decompress(text)? {
        Value::Object(map) => map,
        _ => return Err(ImportError::NotAnObject),
    };

    let entries = required_list::<JournalEntry>(&mut map, "entries")?;
    let goals = required_list::<Goal>(&mut map, "goals")?;
    let health_data = optional_list::<HealthRecord>(&mut map, "healthData")?;
    let finance_data = optional_list::<FinanceRecord>(&mut map, "financeData")?;
    let profile_data = match map.remove("profileData") {
        None | Some(Value::Null) => None,
        Some(value) => Some(decode_section(value, "profileData")?),
    };
    let export_date = map
        .remove("exportDate")
        .and_then(|value| serde_json::from_value(value).ok());
    let version = map
        .remove("version")
        .and_then(|value| value.as_str().map(str::to_string));

    Ok(StorageSnapshot {
        entries,
        goals,
        health_data,
        finance_data,
        profile_data,
        export_date,
        version,
    })
}

fn required_list<R: Record + DeserializeOwned>(
    map: &mut Map<String, Value>,
    section: &'static str,
) -> Result<Vec<R>, ImportError> {
    match map.remove(section) {
        Some(value @ Value::Array(_)) => decode_records(value, section),
        Some(_) => Err(ImportError::NotAList(section)),
        None => Err(ImportError::MissingCollection(section)),
    }
}

fn optional_list<R: Record + DeserializeOwned>(
    map: &mut Map<String, Value>,
    section: &'static str,
) -> Result<Option<Vec<R>>, ImportError> {
    match map.remove(section) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Array(_)) => decode_records(value, section).map(Some),
        Some(_) => Err(ImportError::NotAList(section)),
    }
}

fn decode_records<R: Record + DeserializeOwned>(
    value: Value,
    section: &'static str,
) -> Result<Vec<R>, ImportError> {
    let records: Vec<R> = decode_section(value, section)?;
    validate_collection(&records).map_err(|source| ImportError::Validation { section, source })?;
    Ok(records)
}

fn decode_section<T: DeserializeOwned>(value: Value, section: &'static str) -> Result<T, ImportError> {
    serde_json::from_value(value).map_err(|source| ImportError::InvalidRecord { section, source })
}

/// Parses `text` as the value stored under `key`, validating it like an
/// import section, and returns it in canonical stored form.
///
/// # Errors
/// - `Codec` when the text is not JSON.
/// - `NotAList` when a collection key is given anything but a list.
/// - `InvalidRecord` / `Validation` when the value does not decode into the
///   key's record type, fails a range check, or repeats an id.
pub fn parse_stored_value(key: StorageKey, text: &str) -> Result<Value, ImportError> {
    let value = codec::decompress(text)?;
    let section = key.as_str();
    if StorageKey::COLLECTIONS.contains(&key) && !value.is_array() {
        return Err(ImportError::NotAList(section));
    }

    match key {
        StorageKey::JournalEntries => canonical(&decode_records::<JournalEntry>(value, section)?, section),
        StorageKey::Goals => canonical(&decode_records::<Goal>(value, section)?, section),
        StorageKey::HealthData => canonical(&decode_records::<HealthRecord>(value, section)?, section),
        StorageKey::FinanceData => canonical(&decode_records::<FinanceRecord>(value, section)?, section),
        StorageKey::ProfileData => canonical(&decode_section::<ProfileData>(value, section)?, section),
        StorageKey::OnboardingData => {
            let data: OnboardingData = decode_section(value, section)?;
            data.validate().map_err(|source| ImportError::Validation {
                section,
                source: CollectionError { index: 0, source },
            })?;
            canonical(&data, section)
        }
        StorageKey::OnboardingCompleted => canonical(&decode_section::<bool>(value, section)?, section),
    }
}

fn canonical<T: Serialize + ?Sized>(value: &T, section: &'static str) -> Result<Value, ImportError> {
    serde_json::to_value(value).map_err(|source| ImportError::InvalidRecord { section, source })
}

/// Snapshot of what is currently stored behind `persistence`.
pub fn backup_snapshot<S: KvStore>(persistence: &Persistence<S>) -> StorageSnapshot {
    StorageSnapshot {
        entries: persistence.load_collection(StorageKey::JournalEntries),
        goals: persistence.load_collection(StorageKey::Goals),
        health_data: Some(persistence.load_collection(StorageKey::HealthData)),
        finance_data: Some(persistence.load_collection(StorageKey::FinanceData)),
        profile_data: persistence
            .load_value(StorageKey::ProfileData)
            .and_then(|value| serde_json::from_value(value).ok()),
        export_date: None,
        version: None,
    }
}

/// Writes `entries`, `goals` and every optional section that is present.
///
/// # Errors
/// Stops at the first failed write; sections written before it stay written.
pub fn restore_snapshot<S: KvStore>(
    snapshot: &StorageSnapshot,
    persistence: &mut Persistence<S>,
) -> PersistResult<()> {
    persistence.save(StorageKey::JournalEntries, &snapshot.entries)?;
    persistence.save(StorageKey::Goals, &snapshot.goals)?;
    if let Some(health) = &snapshot.health_data {
        persistence.save(StorageKey::HealthData, health)?;
    }
    if let Some(finance) = &snapshot.finance_data {
        persistence.save(StorageKey::FinanceData, finance)?;
    }
    if let Some(profile) = &snapshot.profile_data {
        persistence.save(StorageKey::ProfileData, profile)?;
    }
    info!(
        "event=snapshot_restore module=snapshot status=ok entries={} goals={}",
        snapshot.entries.len(),
        snapshot.goals.len()
    );
    Ok(())
}

/// Download name for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("journal-backup-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn export_stamps_version_and_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let text = export_snapshot_at(&StorageSnapshot::default(), now).unwrap();
        let snapshot = import_snapshot(&text).unwrap();
        assert_eq!(snapshot.version.as_deref(), Some(SNAPSHOT_VERSION));
        assert_eq!(snapshot.export_date, Some(now));
        assert!(snapshot.health_data.is_none());
    }

    #[test]
    fn import_requires_entries_and_goals_lists() {
        assert!(matches!(
            import_snapshot(r#"{"goals": []}"#),
            Err(ImportError::MissingCollection("entries"))
        ));
        assert!(matches!(
            import_snapshot(r#"{"entries": "not-a-list", "goals": []}"#),
            Err(ImportError::NotAList("entries"))
        ));
        assert!(matches!(import_snapshot("[]"), Err(ImportError::NotAnObject)));
        assert!(matches!(import_snapshot("not json"), Err(ImportError::Codec(_))));
    }

    #[test]
    fn import_rejects_records_failing_validation() {
        let text = r#"{"entries": [
            {"id": 1, "title": "a", "mood": 5, "energy": 5, "timestamp": "2024-01-01T00:00:00Z"},
            {"id": 1, "title": "b", "mood": 5, "energy": 5, "timestamp": "2024-01-01T00:00:00Z"}
        ], "goals": []}"#;
        let err = import_snapshot(text).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Validation { section: "entries", ref source } if source.index == 1
        ));
    }

    #[test]
    fn stored_value_is_validated_against_its_key() {
        let entry = r#"{"id":1,"title":"A","content":"b","mood":99,"energy":5,"timestamp":"2024-01-01T00:00:00Z"}"#;
        assert!(matches!(
            parse_stored_value(StorageKey::JournalEntries, &format!("[{entry}]")),
            Err(ImportError::Validation { section: "journal_entries", .. })
        ));
        assert!(matches!(
            parse_stored_value(StorageKey::Goals, "{}"),
            Err(ImportError::NotAList("goals"))
        ));
        assert!(parse_stored_value(StorageKey::OnboardingData, r#"{"name":" "}"#).is_err());
        assert!(parse_stored_value(StorageKey::OnboardingCompleted, "\"yes\"").is_err());
    }

    #[test]
    fn stored_value_is_returned_in_canonical_form() {
        let value = parse_stored_value(
            StorageKey::JournalEntries,
            r#"[{"i":4,"t":"A","m":3,"e":4,"ts":"2024-01-01T00:00:00.000Z"}]"#,
        )
        .unwrap();
        assert_eq!(value[0]["id"], 4);
        assert_eq!(value[0]["category"], "general");
        assert_eq!(value[0]["timestamp"], "2024-01-01T00:00:00Z");
        assert_eq!(
            parse_stored_value(StorageKey::OnboardingCompleted, "true").unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn backup_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        assert_eq!(backup_file_name(date), "journal-backup-2024-07-09.json");
    }
}
