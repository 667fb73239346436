//! Journal entry model.
//!
//! # Invariants
//! - `mood` and `energy` are on a 1..=10 scale.
//! - `id` and `timestamp` are assigned once at creation and never patched.
//! - `tags` keep the order the user typed them in.

use super::id::RecordId;
use super::record::{check_id, check_not_blank, check_range, Record, RecordKind, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MOOD_MIN: u8 = 1;
pub const MOOD_MAX: u8 = 10;
pub const DEFAULT_MOOD: u8 = 5;

/// Fixed label set for journal entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryCategory {
    #[default]
    General,
    Business,
    Personal,
    Goals,
    Ideas,
}

/// One mood/energy-tagged journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub mood: u8,
    pub energy: u8,
    #[serde(default)]
    pub category: EntryCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// User input for a new entry; id and timestamp are assigned on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub title: String,
    pub content: String,
    pub mood: u8,
    pub energy: u8,
    pub category: EntryCategory,
    pub tags: Vec<String>,
}

impl Default for EntryDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            mood: DEFAULT_MOOD,
            energy: DEFAULT_MOOD,
            category: EntryCategory::General,
            tags: Vec::new(),
        }
    }
}

impl EntryDraft {
    /// Form-level checks: title and content are both required.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_not_blank("title", &self.title)?;
        check_not_blank("content", &self.content)?;
        check_scale("mood", self.mood)?;
        check_scale("energy", self.energy)
    }
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<u8>,
    pub energy: Option<u8>,
    pub category: Option<EntryCategory>,
    pub tags: Option<Vec<String>>,
}

impl JournalEntry {
    pub fn from_draft(id: RecordId, timestamp: DateTime<Utc>, draft: EntryDraft) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            mood: draft.mood,
            energy: draft.energy,
            category: draft.category,
            tags: draft.tags,
            timestamp,
        }
    }

    /// Returns a copy with the patch applied; the receiver is left untouched.
    pub fn patched(&self, patch: EntryPatch) -> Self {
        let mut next = self.clone();
        if let Some(title) = patch.title {
            next.title = title;
        }
        if let Some(content) = patch.content {
            next.content = content;
        }
        if let Some(mood) = patch.mood {
            next.mood = mood;
        }
        if let Some(energy) = patch.energy {
            next.energy = energy;
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(tags) = patch.tags {
            next.tags = tags;
        }
        next
    }
}

impl Record for JournalEntry {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn kind(&self) -> RecordKind {
        RecordKind::JournalEntry
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_id(self.id)?;
        check_not_blank("title", &self.title)?;
        check_scale("mood", self.mood)?;
        check_scale("energy", self.energy)
    }
}

/// Splits comma-separated tag input, trimming and dropping blanks.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn check_scale(field: &'static str, value: u8) -> Result<(), ValidationError> {
    check_range(
        field,
        i64::from(value),
        i64::from(MOOD_MIN),
        i64::from(MOOD_MAX),
    )
}
