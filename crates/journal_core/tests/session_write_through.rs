use journal_core::model::health::{HealthRecord, Workout};
use journal_core::{
    open_backend, BrowserBackend, EntryDraft, EntryPatch, GoalDraft, GoalPatch, HostIo,
    MemoryKvStore, OnboardingData, Persistence, ProfileData, Record, SessionError,
    StorageConfig, StorageKey, StorageSession, ValidationError,
};
use chrono::Utc;

fn session_over(store: MemoryKvStore) -> StorageSession {
    let backend = BrowserBackend::new(
        Persistence::new(store, StorageConfig::default()),
        Box::new(journal_core::backend::NoHost),
        Box::new(journal_core::backend::NoHost),
    );
    StorageSession::open(Box::new(backend))
}

fn entry_draft(title: &str) -> EntryDraft {
    EntryDraft {
        title: title.to_string(),
        content: "body".to_string(),
        ..EntryDraft::default()
    }
}

#[test]
fn quota_failure_is_reported_and_record_stays_in_memory() {
    let mut session = session_over(MemoryKvStore::with_quota(200));

    let first = session.add_entry(entry_draft("fits")).unwrap();
    assert!(first.persisted);

    let big = EntryDraft {
        content: "x".repeat(500),
        ..entry_draft("too big")
    };
    let second = session.add_entry(big).unwrap();
    assert!(!second.persisted);
    assert_eq!(session.entries().len(), 2);
    assert_eq!(session.stats().entries_count, 1);
}

#[test]
fn reopened_session_sees_persisted_state_and_issues_fresh_ids() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        database_path: Some(dir.path().join("journal.sqlite3")),
        ..StorageConfig::default()
    };

    let mut session = StorageSession::open(open_backend(&config, HostIo::none()));
    let entry = session.add_entry(entry_draft("kept")).unwrap();
    let goal = session
        .add_goal(GoalDraft {
            title: "Run".to_string(),
            description: "10k".to_string(),
            ..GoalDraft::default()
        })
        .unwrap();
    session.close();

    let mut reopened = StorageSession::open(open_backend(&config, HostIo::none()));
    assert_eq!(reopened.entries()[0].id, entry.id);
    assert_eq!(reopened.goals()[0].id, goal.id);
    let next = reopened.add_entry(entry_draft("later")).unwrap();
    assert!(next.id > goal.id.max(entry.id));
}

#[test]
fn updates_keep_identity_and_validate_result() {
    let mut session = session_over(MemoryKvStore::new());
    let receipt = session.add_entry(entry_draft("first")).unwrap();
    let timestamp = session.entries()[0].timestamp;

    session
        .update_entry(
            receipt.id,
            EntryPatch {
                title: Some("renamed".to_string()),
                ..EntryPatch::default()
            },
        )
        .unwrap();
    assert_eq!(session.entries()[0].title, "renamed");
    assert_eq!(session.entries()[0].timestamp, timestamp);

    let err = session
        .update_entry(
            receipt.id,
            EntryPatch {
                energy: Some(0),
                ..EntryPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::OutOfRange { field: "energy", .. })
    ));
    assert_eq!(session.entries()[0].energy, 5);
}

#[test]
fn goal_lifecycle_persists_each_step() {
    let mut session = session_over(MemoryKvStore::new());
    let receipt = session
        .add_goal(GoalDraft {
            title: "Save".to_string(),
            description: "emergency fund".to_string(),
            ..GoalDraft::default()
        })
        .unwrap();
    assert_eq!(session.goals()[0].progress, 0);
    assert!(!session.goals()[0].completed);

    session
        .update_goal(
            receipt.id,
            GoalPatch {
                progress: Some(60),
                ..GoalPatch::default()
            },
        )
        .unwrap();
    session.toggle_goal(receipt.id).unwrap();
    assert!(session.goals()[0].completed);
    assert_eq!(session.stats().goals_count, 1);

    session.delete_goal(receipt.id).unwrap();
    assert!(session.goals().is_empty());
    assert_eq!(session.stats().goals_count, 0);
}

#[test]
fn health_records_get_fresh_ids() {
    let mut session = session_over(MemoryKvStore::new());
    let workout = HealthRecord::Workout(Workout {
        id: 0,
        workout_type: "cycling".to_string(),
        duration: 45.0,
        calories: 400.0,
        notes: String::new(),
        date: Utc::now(),
    });

    let receipt = session.add_health_record(workout).unwrap();
    assert!(receipt.persisted);
    assert_eq!(session.health_records()[0].record_id(), receipt.id);
    assert!(receipt.id > 0);

    session.delete_health_record(receipt.id).unwrap();
    assert_eq!(
        session.delete_health_record(receipt.id),
        Err(SessionError::NotFound {
            key: StorageKey::HealthData,
            id: receipt.id
        })
    );
}

#[test]
fn onboarding_and_profile_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        database_path: Some(dir.path().join("journal.sqlite3")),
        ..StorageConfig::default()
    };

    let mut session = StorageSession::open(open_backend(&config, HostIo::none()));
    assert!(session
        .complete_onboarding(OnboardingData {
            name: "Sam".to_string(),
            age: 31,
            occupation: "Engineer".to_string(),
        })
        .unwrap());
    assert!(session.save_profile(ProfileData {
        name: "Sam".to_string(),
        values: vec!["curiosity".to_string()],
        ..ProfileData::default()
    }));
    session.close();

    let reopened = StorageSession::open(open_backend(&config, HostIo::none()));
    assert!(reopened.onboarding_completed());
    assert_eq!(reopened.onboarding().map(|data| data.age), Some(31));
    assert_eq!(
        reopened.profile().map(|profile| profile.values.clone()),
        Some(vec!["curiosity".to_string()])
    );
}

#[test]
fn onboarding_requires_a_name() {
    let mut session = session_over(MemoryKvStore::new());
    let err = session
        .complete_onboarding(OnboardingData::default())
        .unwrap_err();
    assert_eq!(err, SessionError::Validation(ValidationError::EmptyField("name")));
    assert!(!session.onboarding_completed());
}
