//! Storage session: the journal's in-memory state plus write-through storage.
//!
//! # Responsibility
//! - Load every collection from the active backend once, at open.
//! - Apply create/update/delete operations to memory, then persist the whole
//!   affected collection through the backend.
//! - Drive export, import and clear against the same backend.
//!
//! # Invariants
//! - Memory is updated first; a failed write is reported, never rolled back.
//! - Ids are unique within the session: the generator is seeded with the
//!   largest id loaded or imported.
//! - Memory is cleared only after storage reports a successful clear.
//!
//! # See also
//! - `crate::backend::StorageBackend` for the storage contract.

use crate::backend::{StorageBackend, StorageStats};
use crate::model::entry::{EntryDraft, EntryPatch, JournalEntry};
use crate::model::finance::FinanceRecord;
use crate::model::goal::{Goal, GoalDraft, GoalPatch};
use crate::model::health::HealthRecord;
use crate::model::id::{RecordId, RecordIdGenerator};
use crate::model::profile::{OnboardingData, ProfileData};
use crate::model::record::{Record, ValidationError};
use crate::persistence::{retain_valid_records, StorageInfo, StorageKey};
use crate::snapshot::StorageSnapshot;
use chrono::Utc;
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Input or resulting record failed validation; nothing changed.
    Validation(ValidationError),
    /// No record with this id in the collection stored under `key`.
    NotFound { key: StorageKey, id: RecordId },
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { key, id } => write!(f, "no record {id} in `{key}`"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for SessionError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Outcome of a write-through mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReceipt {
    pub id: RecordId,
    /// `false` when storage rejected the write; memory still holds the change.
    pub persisted: bool,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub entries: usize,
    pub goals: usize,
    pub persisted: bool,
}

/// Open journal state bound to one storage backend.
pub struct StorageSession {
    backend: Box<dyn StorageBackend>,
    entries: Vec<JournalEntry>,
    goals: Vec<Goal>,
    health: Vec<HealthRecord>,
    finance: Vec<FinanceRecord>,
    profile: Option<ProfileData>,
    onboarding: Option<OnboardingData>,
    onboarding_completed: bool,
    ids: RecordIdGenerator,
}

impl StorageSession {
    /// Loads every collection from `backend`.
    ///
    /// Missing or malformed collections load empty; individual bad records
    /// are dropped.
    pub fn open(backend: Box<dyn StorageBackend>) -> Self {
        let entries: Vec<JournalEntry> = load_records(backend.as_ref(), StorageKey::JournalEntries);
        let goals: Vec<Goal> = load_records(backend.as_ref(), StorageKey::Goals);
        let health: Vec<HealthRecord> = load_records(backend.as_ref(), StorageKey::HealthData);
        let finance: Vec<FinanceRecord> = load_records(backend.as_ref(), StorageKey::FinanceData);
        let profile = load_object(backend.as_ref(), StorageKey::ProfileData);
        let onboarding = load_object(backend.as_ref(), StorageKey::OnboardingData);
        let onboarding_completed = matches!(
            backend.load(StorageKey::OnboardingCompleted),
            Some(Value::Bool(true))
        );

        let ids = RecordIdGenerator::seeded(
            entries
                .iter()
                .map(Record::record_id)
                .chain(goals.iter().map(Record::record_id))
                .chain(health.iter().map(Record::record_id))
                .chain(finance.iter().map(Record::record_id)),
        );

        info!(
            "event=session_open module=session status=ok backend={} entries={} goals={} health={} finance={}",
            backend.kind().as_str(),
            entries.len(),
            goals.len(),
            health.len(),
            finance.len()
        );

        Self {
            backend,
            entries,
            goals,
            health,
            finance,
            profile,
            onboarding,
            onboarding_completed,
            ids,
        }
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn health_records(&self) -> &[HealthRecord] {
        &self.health
    }

    pub fn finance_records(&self) -> &[FinanceRecord] {
        &self.finance
    }

    pub fn profile(&self) -> Option<&ProfileData> {
        self.profile.as_ref()
    }

    pub fn onboarding(&self) -> Option<&OnboardingData> {
        self.onboarding.as_ref()
    }

    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed
    }

    /// Creates an entry stamped with a fresh id and the current time.
    ///
    /// # Errors
    /// - `Validation` when title or content is blank or a scale is out of range.
    pub fn add_entry(&mut self, draft: EntryDraft) -> SessionResult<WriteReceipt> {
        draft.validate()?;
        let id = self.ids.next_id();
        self.entries
            .push(JournalEntry::from_draft(id, Utc::now(), draft));
        Ok(self.persist_entries(id))
    }

    /// Applies `patch` to entry `id`; id and timestamp never change.
    pub fn update_entry(&mut self, id: RecordId, patch: EntryPatch) -> SessionResult<WriteReceipt> {
        let index = position(&self.entries, StorageKey::JournalEntries, id)?;
        let next = self.entries[index].patched(patch);
        next.validate()?;
        self.entries[index] = next;
        Ok(self.persist_entries(id))
    }

    pub fn delete_entry(&mut self, id: RecordId) -> SessionResult<WriteReceipt> {
        let index = position(&self.entries, StorageKey::JournalEntries, id)?;
        self.entries.remove(index);
        Ok(self.persist_entries(id))
    }

    /// Creates a goal with zero progress, not completed, created now.
    pub fn add_goal(&mut self, draft: GoalDraft) -> SessionResult<WriteReceipt> {
        draft.validate()?;
        let id = self.ids.next_id();
        self.goals.push(Goal::from_draft(id, Utc::now(), draft));
        Ok(self.persist_goals(id))
    }

    pub fn update_goal(&mut self, id: RecordId, patch: GoalPatch) -> SessionResult<WriteReceipt> {
        let index = position(&self.goals, StorageKey::Goals, id)?;
        let next = self.goals[index].patched(patch);
        next.validate()?;
        self.goals[index] = next;
        Ok(self.persist_goals(id))
    }

    /// Flips the completion flag of goal `id`.
    pub fn toggle_goal(&mut self, id: RecordId) -> SessionResult<WriteReceipt> {
        let index = position(&self.goals, StorageKey::Goals, id)?;
        let goal = &mut self.goals[index];
        goal.completed = !goal.completed;
        Ok(self.persist_goals(id))
    }

    pub fn delete_goal(&mut self, id: RecordId) -> SessionResult<WriteReceipt> {
        let index = position(&self.goals, StorageKey::Goals, id)?;
        self.goals.remove(index);
        Ok(self.persist_goals(id))
    }

    /// Appends `record` under a freshly assigned id (any id it carries is replaced).
    pub fn add_health_record(&mut self, mut record: HealthRecord) -> SessionResult<WriteReceipt> {
        let id = self.ids.next_id();
        record.set_id(id);
        record.validate()?;
        self.health.push(record);
        let persisted = persist(self.backend.as_mut(), StorageKey::HealthData, &self.health);
        Ok(WriteReceipt { id, persisted })
    }

    pub fn delete_health_record(&mut self, id: RecordId) -> SessionResult<WriteReceipt> {
        let index = position(&self.health, StorageKey::HealthData, id)?;
        self.health.remove(index);
        let persisted = persist(self.backend.as_mut(), StorageKey::HealthData, &self.health);
        Ok(WriteReceipt { id, persisted })
    }

    /// Appends `record` under a freshly assigned id (any id it carries is replaced).
    pub fn add_finance_record(&mut self, mut record: FinanceRecord) -> SessionResult<WriteReceipt> {
        let id = self.ids.next_id();
        record.set_id(id);
        record.validate()?;
        self.finance.push(record);
        let persisted = persist(self.backend.as_mut(), StorageKey::FinanceData, &self.finance);
        Ok(WriteReceipt { id, persisted })
    }

    pub fn delete_finance_record(&mut self, id: RecordId) -> SessionResult<WriteReceipt> {
        let index = position(&self.finance, StorageKey::FinanceData, id)?;
        self.finance.remove(index);
        let persisted = persist(self.backend.as_mut(), StorageKey::FinanceData, &self.finance);
        Ok(WriteReceipt { id, persisted })
    }

    /// Replaces the profile; returns whether it reached storage.
    pub fn save_profile(&mut self, profile: ProfileData) -> bool {
        let persisted = persist(self.backend.as_mut(), StorageKey::ProfileData, &profile);
        self.profile = Some(profile);
        persisted
    }

    /// Stores onboarding answers and marks onboarding done.
    ///
    /// # Errors
    /// - `Validation` when the name is blank.
    pub fn complete_onboarding(&mut self, data: OnboardingData) -> SessionResult<bool> {
        data.validate()?;
        let saved = persist(self.backend.as_mut(), StorageKey::OnboardingData, &data);
        self.onboarding = Some(data);
        let flagged = self.mark_onboarding_completed();
        Ok(saved && flagged)
    }

    /// Marks onboarding done without storing answers.
    pub fn skip_onboarding(&mut self) -> bool {
        self.mark_onboarding_completed()
    }

    /// Current in-memory collections as a backup document.
    pub fn snapshot(&self) -> StorageSnapshot {
        StorageSnapshot {
            entries: self.entries.clone(),
            goals: self.goals.clone(),
            health_data: Some(self.health.clone()),
            finance_data: Some(self.finance.clone()),
            profile_data: self.profile.clone(),
            export_date: None,
            version: None,
        }
    }

    /// Exports the current state through the backend's host seam.
    pub fn export(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.backend.export(&snapshot)
    }

    /// Imports a host-chosen backup, replacing in-memory collections.
    ///
    /// # Contract
    /// - `entries` and `goals` are always replaced.
    /// - Health, finance and profile sections replace memory only when present.
    /// - Returns `None` when cancelled or rejected; nothing changes then.
    pub fn import(&mut self) -> Option<ImportSummary> {
        let snapshot = self.backend.import()?;
        for id in snapshot
            .entries
            .iter()
            .map(Record::record_id)
            .chain(snapshot.goals.iter().map(Record::record_id))
        {
            self.ids.observe(id);
        }

        self.entries = snapshot.entries;
        self.goals = snapshot.goals;
        let backend = self.backend.as_mut();
        let mut persisted = persist(backend, StorageKey::JournalEntries, &self.entries);
        persisted &= persist(backend, StorageKey::Goals, &self.goals);

        if let Some(health) = snapshot.health_data {
            health.iter().for_each(|record| self.ids.observe(record.record_id()));
            self.health = health;
            persisted &= persist(backend, StorageKey::HealthData, &self.health);
        }
        if let Some(finance) = snapshot.finance_data {
            finance.iter().for_each(|record| self.ids.observe(record.record_id()));
            self.finance = finance;
            persisted &= persist(backend, StorageKey::FinanceData, &self.finance);
        }
        if let Some(profile) = snapshot.profile_data {
            persisted &= persist(backend, StorageKey::ProfileData, &profile);
            self.profile = Some(profile);
        }

        info!(
            "event=session_import module=session status=ok entries={} goals={} persisted={}",
            self.entries.len(),
            self.goals.len(),
            persisted
        );
        Some(ImportSummary {
            entries: self.entries.len(),
            goals: self.goals.len(),
            persisted,
        })
    }

    /// Clears storage, then memory; memory is kept when storage fails.
    pub fn clear_all(&mut self) -> bool {
        if !self.backend.clear_all() {
            error!("event=session_clear module=session status=error");
            return false;
        }
        self.entries.clear();
        self.goals.clear();
        self.health.clear();
        self.finance.clear();
        self.profile = None;
        self.onboarding = None;
        self.onboarding_completed = false;
        info!("event=session_clear module=session status=ok");
        true
    }

    pub fn stats(&self) -> StorageStats {
        self.backend.stats()
    }

    pub fn storage_info(&self) -> Option<StorageInfo> {
        self.backend.storage_info()
    }

    /// Ends the session and releases the backend.
    pub fn close(self) {
        info!(
            "event=session_close module=session status=ok backend={}",
            self.backend.kind().as_str()
        );
    }

    fn persist_entries(&mut self, id: RecordId) -> WriteReceipt {
        let persisted = persist(self.backend.as_mut(), StorageKey::JournalEntries, &self.entries);
        WriteReceipt { id, persisted }
    }

    fn persist_goals(&mut self, id: RecordId) -> WriteReceipt {
        let persisted = persist(self.backend.as_mut(), StorageKey::Goals, &self.goals);
        WriteReceipt { id, persisted }
    }

    fn mark_onboarding_completed(&mut self) -> bool {
        self.onboarding_completed = true;
        self.backend
            .save(StorageKey::OnboardingCompleted, &Value::Bool(true))
    }
}

fn position<R: Record>(records: &[R], key: StorageKey, id: RecordId) -> SessionResult<usize> {
    records
        .iter()
        .position(|record| record.record_id() == id)
        .ok_or(SessionError::NotFound { key, id })
}

fn persist<T: Serialize + ?Sized>(backend: &mut dyn StorageBackend, key: StorageKey, value: &T) -> bool {
    let persisted = match serde_json::to_value(value) {
        Ok(value) => backend.save(key, &value),
        Err(err) => {
            error!(
                "event=session_save module=session status=error key={} error={}",
                key, err
            );
            false
        }
    };
    if !persisted {
        error!("event=session_save module=session status=unpersisted key={key}");
    }
    persisted
}

fn load_records<R: Record + DeserializeOwned>(backend: &dyn StorageBackend, key: StorageKey) -> Vec<R> {
    match backend.load(key) {
        Some(Value::Array(items)) => retain_valid_records(key, items),
        _ => Vec::new(),
    }
}

fn load_object<T: DeserializeOwned>(backend: &dyn StorageBackend, key: StorageKey) -> Option<T> {
    backend
        .load(key)
        .and_then(|value| serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BrowserBackend, NoHost};
    use crate::config::StorageConfig;
    use crate::kv::MemoryKvStore;
    use crate::persistence::Persistence;

    fn session_with(store: MemoryKvStore) -> StorageSession {
        let backend = BrowserBackend::new(
            Persistence::new(store, StorageConfig::default()),
            Box::new(NoHost),
            Box::new(NoHost),
        );
        StorageSession::open(Box::new(backend))
    }

    fn draft(title: &str) -> EntryDraft {
        EntryDraft {
            title: title.to_string(),
            content: "body".to_string(),
            ..EntryDraft::default()
        }
    }

    #[test]
    fn entries_keep_insertion_order_and_unique_ids() {
        let mut session = session_with(MemoryKvStore::new());
        let a = session.add_entry(draft("a")).unwrap();
        let b = session.add_entry(draft("b")).unwrap();

        assert!(a.persisted && b.persisted);
        assert!(a.id < b.id);
        let titles: Vec<_> = session.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn invalid_draft_changes_nothing() {
        let mut session = session_with(MemoryKvStore::new());
        let err = session.add_entry(draft(" ")).unwrap_err();
        assert_eq!(err, SessionError::Validation(ValidationError::EmptyField("title")));
        assert!(session.entries().is_empty());
    }

    #[test]
    fn missing_ids_report_not_found() {
        let mut session = session_with(MemoryKvStore::new());
        assert_eq!(
            session.delete_goal(42),
            Err(SessionError::NotFound {
                key: StorageKey::Goals,
                id: 42
            })
        );
        assert!(session.toggle_goal(42).is_err());
    }

    #[test]
    fn toggle_goal_flips_completion() {
        let mut session = session_with(MemoryKvStore::new());
        let receipt = session
            .add_goal(GoalDraft {
                title: "Ship".to_string(),
                description: "v1".to_string(),
                ..GoalDraft::default()
            })
            .unwrap();
        session.toggle_goal(receipt.id).unwrap();
        assert!(session.goals()[0].completed);
        assert_eq!(session.goals()[0].progress, 0);
        session.toggle_goal(receipt.id).unwrap();
        assert!(!session.goals()[0].completed);
    }

    #[test]
    fn read_only_store_keeps_changes_in_memory() {
        let mut store = MemoryKvStore::new();
        store.set_writable(false);
        let mut session = session_with(store);

        let receipt = session.add_entry(draft("kept")).unwrap();
        assert!(!receipt.persisted);
        assert_eq!(session.entries().len(), 1);

        assert!(!session.clear_all());
        assert_eq!(session.entries().len(), 1);
    }

    #[test]
    fn skip_onboarding_sets_flag() {
        let mut session = session_with(MemoryKvStore::new());
        assert!(!session.onboarding_completed());
        assert!(session.skip_onboarding());
        assert!(session.onboarding_completed());
    }
}
