//! Embedded schema steps for the key-value database.
//!
//! # Invariants
//! - Step versions start at 1 and increase by one.
//! - All pending steps run in one transaction and `user_version` is written
//!   inside it, so a failed step leaves the previous schema in place.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "kv_store",
    sql: include_str!("0001_kv_store.sql"),
}];

/// Schema version a freshly opened database ends up at.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Reads the version stored in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Runs every step newer than the stored version.
///
/// Returns the version the database had before the call.
///
/// # Errors
/// - `SchemaTooNew` when the stored version is ahead of `latest_version()`.
/// - `Migration` naming the first step that failed.
pub fn migrate(conn: &mut Connection) -> DbResult<u32> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        error!(
            "event=db_migrate module=db status=error error_code=schema_too_new found={} supported={}",
            found, supported
        );
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&SchemaStep> = STEPS.iter().filter(|step| step.version > found).collect();
    let Some(last) = pending.last() else {
        return Ok(found);
    };
    let target = last.version;

    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                step: step.name,
                source,
            })?;
        info!(
            "event=db_migrate module=db status=step version={} step={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        found, target
    );
    Ok(found)
}
