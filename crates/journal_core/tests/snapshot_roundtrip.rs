use chrono::{TimeZone, Utc};
use journal_core::model::finance::{Asset, AssetType};
use journal_core::{
    backup_snapshot, decompress, export_snapshot, import_snapshot, restore_snapshot,
    EntryCategory, FinanceRecord, Goal, GoalCategory, ImportError, JournalEntry, MemoryKvStore,
    Persistence, Priority, StorageConfig, StorageKey, StorageSnapshot, SNAPSHOT_VERSION,
};
use serde_json::json;

fn sample_entry() -> JournalEntry {
    JournalEntry {
        id: 1,
        title: "A".to_string(),
        content: String::new(),
        mood: 5,
        energy: 5,
        category: EntryCategory::General,
        tags: vec![],
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn facade() -> Persistence<MemoryKvStore> {
    Persistence::new(MemoryKvStore::new(), StorageConfig::default())
}

#[test]
fn export_clear_import_restores_entries_exactly() {
    let mut persistence = facade();
    persistence
        .save(StorageKey::JournalEntries, &vec![sample_entry()])
        .unwrap();
    persistence.save(StorageKey::Goals, &Vec::<u8>::new()).unwrap();

    let exported = export_snapshot(&backup_snapshot(&persistence)).unwrap();
    persistence.clear_all().unwrap();

    let snapshot = import_snapshot(&exported).unwrap();
    restore_snapshot(&snapshot, &mut persistence).unwrap();

    let entries: Vec<JournalEntry> = persistence.load_collection(StorageKey::JournalEntries);
    assert_eq!(entries, vec![sample_entry()]);
    assert_eq!(snapshot.version.as_deref(), Some(SNAPSHOT_VERSION));
}

#[test]
fn exported_text_decompresses_to_original_collections() {
    let snapshot = StorageSnapshot {
        entries: vec![sample_entry()],
        ..StorageSnapshot::default()
    };
    let text = export_snapshot(&snapshot).unwrap();
    assert!(text.contains(r#""t":"A""#));

    let value = decompress(&text).unwrap();
    assert_eq!(
        value["entries"],
        json!([{
            "id": 1, "title": "A", "content": "", "mood": 5, "energy": 5,
            "category": "general", "tags": [], "timestamp": "2024-01-01T00:00:00Z"
        }])
    );
    assert_eq!(value["goals"], json!([]));
}

#[test]
fn rejected_imports_leave_stored_collections_untouched() {
    let mut persistence = facade();
    persistence
        .save(StorageKey::JournalEntries, &vec![sample_entry()])
        .unwrap();
    let before = persistence.load_raw(StorageKey::JournalEntries);

    for text in ["not json", r#"{"entries": "not-a-list"}"#] {
        let result = import_snapshot(text);
        assert!(result.is_err(), "{text} was accepted");
        if let Ok(snapshot) = result {
            restore_snapshot(&snapshot, &mut persistence).unwrap();
        }
    }

    assert_eq!(persistence.load_raw(StorageKey::JournalEntries), before);
}

#[test]
fn import_accepts_legacy_plain_pretty_backup() {
    let text = r#"{
  "entries": [
    {
      "id": 1704067200000,
      "title": "Morning",
      "content": "Walked",
      "mood": 7,
      "energy": 6,
      "category": "personal",
      "tags": ["walk"],
      "timestamp": "2024-01-01T00:00:00.000Z"
    }
  ],
  "goals": [
    {
      "id": 2,
      "title": "Read",
      "description": "12 books",
      "category": "learning",
      "priority": "low",
      "targetDate": "",
      "progress": 25,
      "completed": false,
      "createdAt": "2024-01-01T00:00:00.000Z"
    }
  ],
  "exportDate": "2024-01-02T00:00:00.000Z",
  "version": "1.0.0"
}"#;

    let snapshot = import_snapshot(text).unwrap();
    assert_eq!(snapshot.entries[0].tags, vec!["walk".to_string()]);
    assert_eq!(snapshot.goals[0].target_date, None);
    assert!(snapshot.health_data.is_none());
}

const SHORT_KEY_BACKUP: &str = r#"{"entries":[{"i":1,"t":"A","c":"b","m":5,"e":5,"cat":"personal","tg":[],"ts":"2024-01-01T00:00:00Z"}],"goals":[{"i":2,"t":"Read","d":"12 books","cat":"learning","p":"high","td":"2024-06-30","pr":10,"comp":false,"ca":"2024-01-01T00:00:00Z","ms":[{"t":"Ch 1","comp":true},{"t":"Ch 2","comp":false}]}],"exportDate":"2024-01-02T00:00:00Z","version":"1.0.0"}"#;

fn assert_short_key_records(entries: &[JournalEntry], goals: &[Goal]) {
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[0].title, "A");
    assert_eq!(entries[0].content, "b");
    assert_eq!((entries[0].mood, entries[0].energy), (5, 5));
    assert_eq!(entries[0].category, EntryCategory::Personal);
    assert_eq!(
        entries[0].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );

    assert_eq!(goals.len(), 1);
    let goal = &goals[0];
    assert_eq!(goal.description, "12 books");
    assert_eq!(goal.category, GoalCategory::Learning);
    assert_eq!(goal.priority, Priority::High);
    assert_eq!(
        goal.target_date,
        chrono::NaiveDate::from_ymd_opt(2024, 6, 30)
    );
    assert_eq!(goal.progress, 10);
    assert_eq!(goal.milestones.len(), 2);
    assert!(goal.milestones[0].completed);
    assert_eq!(goal.effective_progress(), 50);
}

#[test]
fn short_key_backup_imports_as_typed_records() {
    let snapshot = import_snapshot(SHORT_KEY_BACKUP).unwrap();
    assert_short_key_records(&snapshot.entries, &snapshot.goals);
    assert_eq!(snapshot.version.as_deref(), Some("1.0.0"));
}

#[test]
fn short_key_values_load_from_the_store_as_typed_records() {
    let backup: serde_json::Value = serde_json::from_str(SHORT_KEY_BACKUP).unwrap();
    let mut persistence = facade();
    persistence
        .save_raw(StorageKey::JournalEntries, &backup["entries"].to_string())
        .unwrap();
    persistence
        .save_raw(StorageKey::Goals, &backup["goals"].to_string())
        .unwrap();

    let entries: Vec<JournalEntry> = persistence.load_collection(StorageKey::JournalEntries);
    let goals: Vec<Goal> = persistence.load_collection(StorageKey::Goals);
    assert_short_key_records(&entries, &goals);
    assert_eq!(persistence.storage_info().goals_count, 1);
}

#[test]
fn import_rejects_out_of_range_goal_progress() {
    let text = r#"{"entries": [], "goals": [
        {"id": 2, "title": "Read", "progress": 140, "createdAt": "2024-01-01T00:00:00Z"}
    ]}"#;
    assert!(matches!(
        import_snapshot(text),
        Err(ImportError::Validation { section: "goals", .. })
    ));
}

#[test]
fn restore_leaves_absent_optional_sections_untouched() {
    let mut persistence = facade();
    let asset = FinanceRecord::Asset(Asset {
        id: 9,
        name: "Savings".to_string(),
        asset_type: AssetType::Bank,
        value: 1200.0,
        currency: "USD".to_string(),
        notes: String::new(),
        date: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
    });
    persistence
        .save(StorageKey::FinanceData, &vec![asset.clone()])
        .unwrap();

    let snapshot = StorageSnapshot {
        entries: vec![sample_entry()],
        ..StorageSnapshot::default()
    };
    restore_snapshot(&snapshot, &mut persistence).unwrap();

    let finance: Vec<FinanceRecord> = persistence.load_collection(StorageKey::FinanceData);
    assert_eq!(finance, vec![asset]);
    assert_eq!(persistence.storage_info().entries_count, 1);
}
