//! Shared record contract and boundary validation.

use super::id::RecordId;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Concrete record kinds persisted by the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    JournalEntry,
    Goal,
    HealthGoal,
    Workout,
    Meal,
    HealthMetrics,
    Asset,
    Liability,
    Transaction,
    FinancialGoal,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JournalEntry => "journal_entry",
            Self::Goal => "goal",
            Self::HealthGoal => "health_goal",
            Self::Workout => "workout",
            Self::Meal => "meal",
            Self::HealthMetrics => "health_metrics",
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Transaction => "transaction",
            Self::FinancialGoal => "financial_goal",
        }
    }
}

/// Field-level validation failure for one record.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Ids are positive; zero or negative means the record was never assigned one.
    InvalidId(RecordId),
    /// A required text field is blank.
    EmptyField(&'static str),
    /// A bounded integer field (mood, energy, progress) is outside its range.
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// A numeric amount is negative, NaN or infinite.
    InvalidAmount(&'static str),
    /// Two records in one collection share an id.
    DuplicateId(RecordId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(id) => write!(f, "record id must be positive, got {id}"),
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "`{field}` must be within {min}..={max}, got {value}"),
            Self::InvalidAmount(field) => {
                write!(f, "`{field}` must be a finite, non-negative number")
            }
            Self::DuplicateId(id) => write!(f, "duplicate record id {id}"),
        }
    }
}

impl Error for ValidationError {}

/// Validation failure located inside a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionError {
    pub index: usize,
    pub source: ValidationError,
}

impl Display for CollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "record #{}: {}", self.index, self.source)
    }
}

impl Error for CollectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Common surface of every persisted record.
pub trait Record {
    fn record_id(&self) -> RecordId;
    fn kind(&self) -> RecordKind;
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Validates each record and checks id uniqueness across the collection.
pub fn validate_collection<R: Record>(records: &[R]) -> Result<(), CollectionError> {
    let mut seen = HashSet::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|source| CollectionError { index, source })?;
        if !seen.insert(record.record_id()) {
            return Err(CollectionError {
                index,
                source: ValidationError::DuplicateId(record.record_id()),
            });
        }
    }
    Ok(())
}

pub(crate) fn check_id(id: RecordId) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::InvalidId(id));
    }
    Ok(())
}

pub(crate) fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_amount(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidAmount(field));
    }
    Ok(())
}

pub(crate) fn check_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}
