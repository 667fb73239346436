//! SQLite-backed key-value store.
//!
//! # Invariants
//! - Keys are listed in first-write order (`write_seq`), overwrites keep it.
//! - Every write is a single statement, so a failed write changes nothing.
//! - Batch removal runs in one transaction: all keys go or none do.

use super::{KvResult, KvStore, RemoveKeysError, StoreKind};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

#[derive(Debug)]
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Private in-memory database; mostly for tests.
    pub fn open_in_memory() -> KvResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }
}

impl SqliteKvStore {
    fn delete_all_or_none(&mut self, keys: &[&str]) -> KvResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM kv_records WHERE key = ?1;")?;
            for key in keys {
                stmt.execute([key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl KvStore for SqliteKvStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Database
    }

    fn get(&self, key: &str) -> KvResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_records WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        self.conn.execute(
            "INSERT INTO kv_records (key, value, write_seq)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(write_seq), 0) + 1 FROM kv_records))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.conn
            .execute("DELETE FROM kv_records WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn remove_keys(&mut self, keys: &[&str]) -> Result<(), RemoveKeysError> {
        self.delete_all_or_none(keys)
            .map_err(|source| RemoveKeysError {
                kept: (0..keys.len()).collect(),
                source,
            })
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_records ORDER BY write_seq ASC, key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn used_bytes(&self) -> KvResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM kv_records;",
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
