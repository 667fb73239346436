//! Typed domain records stored by the journal.
//!
//! # Responsibility
//! - Define one Rust type per record kind persisted in a collection.
//! - Validate records at the storage boundary instead of trusting raw JSON.
//!
//! # Invariants
//! - Every record carries a positive `RecordId`, unique within its collection.
//! - Collections keep insertion order; display order is a view concern.
//! - Wire field names are camelCase to stay compatible with existing backups.

pub mod entry;
pub mod finance;
pub mod goal;
pub mod health;
pub mod id;
pub mod profile;
pub mod record;

pub(crate) mod optional_date {
    //! `Option<NaiveDate>` that reads `""` as unset and accepts full timestamps.

    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_loose_date(text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{text}`"))),
        }
    }

    fn parse_loose_date(text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
    }
}
