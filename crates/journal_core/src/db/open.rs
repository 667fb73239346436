//! Connection bootstrap for file and in-memory databases.

use super::migrations::migrate;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Location reported for private in-memory databases.
pub const MEMORY_LOCATION: &str = ":memory:";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) a database file and migrates it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(parent) {
            error!(
                "event=db_open module=db status=error mode=file error_code=db_dir_failed error={}",
                err
            );
        }
    }
    open_with(&path.display().to_string(), || Connection::open(path))
}

/// Opens a private in-memory database and migrates it.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(MEMORY_LOCATION, Connection::open_in_memory)
}

fn open_with(
    location: &str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let open_error = |source: rusqlite::Error| DbError::Open {
        location: location.to_string(),
        source,
    };

    let result = connect()
        .and_then(|conn| conn.busy_timeout(BUSY_TIMEOUT).map(|()| conn))
        .map_err(open_error)
        .and_then(|mut conn| {
            migrate(&mut conn)
                .map(|from_version| (conn, from_version))
                .map_err(|err| match err {
                    DbError::Statement(source) => open_error(source),
                    other => other,
                })
        });

    match result {
        Ok((conn, from_version)) => {
            info!(
                "event=db_open module=db status=ok memory={} from_version={} duration_ms={}",
                location == MEMORY_LOCATION,
                from_version,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error memory={} duration_ms={} error={}",
                location == MEMORY_LOCATION,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
