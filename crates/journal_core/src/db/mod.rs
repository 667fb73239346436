//! SQLite bootstrap for the database-backed key-value store.
//!
//! # Responsibility
//! - Open the `kv_records` database (file or private in-memory).
//! - Bring its schema up to date before the store reads or writes a key.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database written by a newer binary is refused, never downgraded.
//! - Errors name where they happened: the location being opened, the
//!   migration step, or a statement on an open store.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, MEMORY_LOCATION};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// SQLite could not open or configure the database at `location`.
    Open {
        location: String,
        source: rusqlite::Error,
    },
    /// Migration step `version` failed; the pending batch was rolled back.
    Migration {
        version: u32,
        step: &'static str,
        source: rusqlite::Error,
    },
    /// The database was written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// A key-value statement failed on an open database.
    Statement(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { location, source } => {
                write!(f, "cannot open journal database `{location}`: {source}")
            }
            Self::Migration {
                version,
                step,
                source,
            } => write!(f, "schema step {version} ({step}) failed: {source}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "journal database has schema version {found}; this build supports up to {supported}"
            ),
            Self::Statement(err) => write!(f, "key-value statement failed: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Statement(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Statement(value)
    }
}
