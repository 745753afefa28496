//! SQLite-backed cache store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::store::{CacheEntry, CacheKind, CacheStore};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    kind TEXT NOT NULL,
    key TEXT NOT NULL,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (kind, key)
);
CREATE INDEX IF NOT EXISTS idx_cache_entries_created ON cache_entries (kind, created_at);
";

/// Durable store keeping every cache kind in one SQLite table.
///
/// Timestamps are stored as Unix milliseconds. The `(kind, key)` primary key
/// guarantees a single row per key, and writes use `INSERT OR REPLACE` so a
/// reader never observes a half-replaced entry.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!(path = %path.display(), "opening cache database");
        Self::with_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }
}

type RawRow = (String, String, i64, i64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| CacheError::Corrupt(format!("timestamp {millis} out of range")))
}

fn into_entry((key, payload, created_at, expires_at): RawRow) -> Result<CacheEntry> {
    Ok(CacheEntry {
        key,
        payload,
        created_at: from_millis(created_at)?,
        expires_at: from_millis(expires_at)?,
    })
}

impl CacheStore for SqliteStore {
    fn get(&self, kind: CacheKind, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT key, payload, created_at, expires_at FROM cache_entries
                 WHERE kind = ?1 AND key = ?2",
                params![kind.as_str(), key],
                read_row,
            )
            .optional()?;
        row.map(into_entry).transpose()
    }

    fn put(&self, kind: CacheKind, entry: CacheEntry) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (kind, key, payload, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                kind.as_str(),
                entry.key,
                entry.payload,
                entry.created_at.timestamp_millis(),
                entry.expires_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, kind: CacheKind, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM cache_entries WHERE kind = ?1 AND key = ?2",
            params![kind.as_str(), key],
        )?;
        Ok(removed > 0)
    }

    fn created_before(&self, kind: CacheKind, cutoff: DateTime<Utc>) -> Result<Vec<CacheEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, payload, created_at, expires_at FROM cache_entries
             WHERE kind = ?1 AND created_at < ?2
             ORDER BY created_at, key",
        )?;
        let rows = stmt
            .query_map(params![kind.as_str(), cutoff.timestamp_millis()], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(into_entry).collect()
    }

    fn delete_created_before(&self, kind: CacheKind, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM cache_entries WHERE kind = ?1 AND created_at < ?2",
            params![kind.as_str(), cutoff.timestamp_millis()],
        )?;
        Ok(removed)
    }

    fn len(&self, kind: CacheKind) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|_| CacheError::Corrupt(format!("row count {count}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(key: &str, created_at: DateTime<Utc>, payload: &str) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            payload: payload.to_string(),
            created_at,
            expires_at: created_at + Duration::hours(24),
        }
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn test_put_get_replace() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = at(1_700_000_000_000);
        store
            .put(CacheKind::PortfolioResult, entry("q", created, "{\"a\":1}"))
            .unwrap();
        store
            .put(CacheKind::PortfolioResult, entry("q", created, "{\"a\":2}"))
            .unwrap();

        let fetched = store.get(CacheKind::PortfolioResult, "q").unwrap().unwrap();
        assert_eq!(fetched.payload, "{\"a\":2}");
        assert_eq!(fetched.created_at, created);
        assert_eq!(fetched.expires_at, created + Duration::hours(24));
        assert_eq!(store.len(CacheKind::PortfolioResult).unwrap(), 1);
        assert!(store.get(CacheKind::News, "q").unwrap().is_none());
    }

    #[test]
    fn test_created_before_and_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = at(1_700_000_000_000);
        store
            .put(CacheKind::MonthlyIndicator, entry("old", now - Duration::days(8), "1"))
            .unwrap();
        store
            .put(CacheKind::MonthlyIndicator, entry("new", now - Duration::days(1), "2"))
            .unwrap();

        let cutoff = now - Duration::days(7);
        let stale = store.created_before(CacheKind::MonthlyIndicator, cutoff).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].key, "old");

        assert_eq!(store.delete_created_before(CacheKind::MonthlyIndicator, cutoff).unwrap(), 1);
        assert_eq!(store.len(CacheKind::MonthlyIndicator).unwrap(), 1);
        assert!(store.delete(CacheKind::MonthlyIndicator, "new").unwrap());
        assert!(!store.delete(CacheKind::MonthlyIndicator, "new").unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .put(CacheKind::News, entry("gme", at(1_700_000_000_000), "[]"))
                .unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get(CacheKind::News, "gme").unwrap().is_some());
    }
}
