//! Goal model with optional milestones.
//!
//! # Invariants
//! - `progress` is a percentage in 0..=100.
//! - When milestones exist, displayed progress is derived from them.

use super::id::RecordId;
use super::optional_date;
use super::record::{check_id, check_not_blank, check_range, Record, RecordKind, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    #[default]
    Business,
    Personal,
    Health,
    Financial,
    Learning,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: GoalCategory,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        default,
        with = "optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<Milestone>,
}

/// User input for a new goal. Progress starts at 0 and completion at false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalDraft {
    pub title: String,
    pub description: String,
    pub category: GoalCategory,
    pub priority: Priority,
    pub target_date: Option<NaiveDate>,
    pub milestones: Vec<Milestone>,
}

impl GoalDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_not_blank("title", &self.title)?;
        check_not_blank("description", &self.description)
    }
}

/// Partial update. `target_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<GoalCategory>,
    pub priority: Option<Priority>,
    pub target_date: Option<Option<NaiveDate>>,
    pub progress: Option<u8>,
    pub completed: Option<bool>,
    pub milestones: Option<Vec<Milestone>>,
}

impl Goal {
    pub fn from_draft(id: RecordId, created_at: DateTime<Utc>, draft: GoalDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            priority: draft.priority,
            target_date: draft.target_date,
            progress: 0,
            completed: false,
            created_at,
            milestones: draft.milestones,
        }
    }

    pub fn patched(&self, patch: GoalPatch) -> Self {
        let mut next = self.clone();
        if let Some(title) = patch.title {
            next.title = title;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(target_date) = patch.target_date {
            next.target_date = target_date;
        }
        if let Some(progress) = patch.progress {
            next.progress = progress;
        }
        if let Some(completed) = patch.completed {
            next.completed = completed;
        }
        if let Some(milestones) = patch.milestones {
            next.milestones = milestones;
        }
        next
    }

    /// Percentage of completed milestones, or stored `progress` without any.
    pub fn effective_progress(&self) -> u8 {
        if self.milestones.is_empty() {
            return self.progress;
        }
        let done = self.milestones.iter().filter(|m| m.completed).count();
        let percent = (done as f64 / self.milestones.len() as f64 * 100.0).round();
        percent as u8
    }

    /// Whole days from `today` until the target date; negative when overdue.
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.target_date
            .map(|target| target.signed_duration_since(today).num_days())
    }
}

impl Record for Goal {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Goal
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_id(self.id)?;
        check_not_blank("title", &self.title)?;
        check_range("progress", i64::from(self.progress), 0, 100)
    }
}
