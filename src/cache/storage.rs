//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, ErrorCode};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Version tag written with every persisted entry. Bump when the persisted
/// payload shape changes; entries carrying a different tag are treated as
/// absent and purged on read.
pub const SCHEMA_VERSION: i64 = 1;

/// How many of the oldest entries to drop when a write hits quota.
const QUOTA_EVICTION_BATCH: usize = 16;

/// A payload read back from the durable store.
#[derive(Debug, Clone)]
pub struct PersistedEntry {
  pub payload: Value,
  pub fetched_at: DateTime<Utc>,
}

/// Trait for durable cache backends.
pub trait CacheStorage: Send + Sync {
  /// Read an entry by key. Entries written under a different schema version
  /// count as absent.
  fn get(&self, key: &str) -> Result<Option<PersistedEntry>>;

  /// Write an entry, tagging it with the current schema version. On storage
  /// exhaustion the oldest non-reserved entries are evicted and the write is
  /// retried exactly once.
  fn put(&self, key: &str, payload: &Value, fetched_at: DateTime<Utc>) -> Result<()>;

  /// Delete every entry.
  fn clear(&self) -> Result<()>;

  /// Delete up to `count` of the oldest non-reserved entries. Returns how
  /// many were dropped.
  fn evict_oldest(&self, count: usize) -> Result<usize>;
}

/// Storage implementation that doesn't persist anything.
/// Used when persistence is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Result<Option<PersistedEntry>> {
    Ok(None) // Always miss
  }

  fn put(&self, _key: &str, _payload: &Value, _fetched_at: DateTime<Utc>) -> Result<()> {
    Ok(()) // Discard
  }

  fn clear(&self) -> Result<()> {
    Ok(())
  }

  fn evict_oldest(&self, _count: usize) -> Result<usize> {
    Ok(0)
  }
}

/// SQLite-based durable cache.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
  /// Keys exempt from quota eviction.
  reserved: Vec<String>,
}

impl SqliteStorage {
  /// Open the cache database, creating it (and its parent directory) if
  /// needed. `path` overrides the default location under the data dir.
  pub fn open(path: Option<&Path>, reserved: Vec<String>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
      reserved,
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// In-memory database, used by tests.
  pub fn in_memory(reserved: Vec<String>) -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    let storage = Self {
      conn: Mutex::new(conn),
      reserved,
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("fpldata").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn try_put(
    &self,
    conn: &Connection,
    key: &str,
    data: &[u8],
    fetched_at: DateTime<Utc>,
  ) -> rusqlite::Result<()> {
    conn
      .execute(
        "INSERT OR REPLACE INTO cache_entries (key, data, version, fetched_at)
         VALUES (?, ?, ?, ?)",
        params![key, data, SCHEMA_VERSION, fetched_at.to_rfc3339()],
      )
      .map(|_| ())
  }
}

/// Schema for the cache table. Entries are whole JSON payloads keyed by
/// semantic name; `version` invalidates entries across schema changes.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    version INTEGER NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_fetched
    ON cache_entries(fetched_at);
"#;

impl CacheStorage for SqliteStorage {
  fn get(&self, key: &str) -> Result<Option<PersistedEntry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data, version, fetched_at FROM cache_entries WHERE key = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(Vec<u8>, i64, String)> = stmt
      .query_row(params![key], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
      })
      .ok();

    let (data, version, fetched_at_str) = match row {
      Some(row) => row,
      None => return Ok(None),
    };

    if version != SCHEMA_VERSION {
      // Mismatched entries are purged so they don't linger until eviction.
      tracing::debug!(key, version, "purging cache entry with stale schema version");
      conn
        .execute("DELETE FROM cache_entries WHERE key = ?", params![key])
        .map_err(|e| eyre!("Failed to purge stale entry: {}", e))?;
      return Ok(None);
    }

    let payload: Value = match serde_json::from_slice(&data) {
      Ok(payload) => payload,
      Err(e) => {
        tracing::warn!(key, error = %e, "dropping unreadable cache entry");
        conn
          .execute("DELETE FROM cache_entries WHERE key = ?", params![key])
          .map_err(|e| eyre!("Failed to purge unreadable entry: {}", e))?;
        return Ok(None);
      }
    };

    let fetched_at = parse_datetime(&fetched_at_str)?;

    Ok(Some(PersistedEntry {
      payload,
      fetched_at,
    }))
  }

  fn put(&self, key: &str, payload: &Value, fetched_at: DateTime<Utc>) -> Result<()> {
    let data =
      serde_json::to_vec(payload).map_err(|e| eyre!("Failed to serialize payload: {}", e))?;

    {
      let conn = self
        .conn
        .lock()
        .map_err(|e| eyre!("Lock poisoned: {}", e))?;

      match self.try_put(&conn, key, &data, fetched_at) {
        Ok(()) => return Ok(()),
        Err(e) if !is_storage_full(&e) => {
          return Err(eyre!("Failed to store cache entry {}: {}", key, e))
        }
        Err(_) => {} // Quota hit, fall through to evict-and-retry
      }
    }

    let dropped = self.evict_oldest(QUOTA_EVICTION_BATCH)?;
    tracing::warn!(key, dropped, "cache write hit quota, evicted oldest entries");

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    self
      .try_put(&conn, key, &data, fetched_at)
      .map_err(|e| eyre!("Failed to store cache entry {} after eviction: {}", key, e))
  }

  fn clear(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM cache_entries", [])
      .map_err(|e| eyre!("Failed to clear cache: {}", e))?;

    Ok(())
  }

  fn evict_oldest(&self, count: usize) -> Result<usize> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT key FROM cache_entries ORDER BY fetched_at ASC")
      .map_err(|e| eyre!("Failed to prepare eviction query: {}", e))?;

    let keys: Vec<String> = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list cache keys: {}", e))?
      .filter_map(|r| r.ok())
      .filter(|key| !self.reserved.contains(key))
      .take(count)
      .collect();

    let mut dropped = 0;
    for key in &keys {
      dropped += conn
        .execute("DELETE FROM cache_entries WHERE key = ?", params![key])
        .map_err(|e| eyre!("Failed to evict cache entry {}: {}", key, e))?;
    }

    Ok(dropped)
  }
}

/// True when a write failed because the database or disk is full.
fn is_storage_full(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::DiskFull
  )
}

/// Parse an RFC 3339 timestamp stored with the entry.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse timestamp '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_roundtrip() {
    let storage = SqliteStorage::in_memory(vec![]).unwrap();
    let payload = json!({ "elements": [1, 2, 3] });
    let now = Utc::now();

    storage.put("bootstrap", &payload, now).unwrap();

    let entry = storage.get("bootstrap").unwrap().unwrap();
    assert_eq!(entry.payload, payload);
    assert_eq!(entry.fetched_at.timestamp(), now.timestamp());
  }

  #[test]
  fn test_missing_key_is_none() {
    let storage = SqliteStorage::in_memory(vec![]).unwrap();
    assert!(storage.get("fixtures").unwrap().is_none());
  }

  #[test]
  fn test_overwrite_replaces_payload() {
    let storage = SqliteStorage::in_memory(vec![]).unwrap();
    storage.put("fixtures", &json!([1]), Utc::now()).unwrap();
    storage.put("fixtures", &json!([1, 2]), Utc::now()).unwrap();

    let entry = storage.get("fixtures").unwrap().unwrap();
    assert_eq!(entry.payload, json!([1, 2]));
  }

  #[test]
  fn test_version_mismatch_treated_as_absent() {
    let storage = SqliteStorage::in_memory(vec![]).unwrap();
    storage.put("bootstrap", &json!({}), Utc::now()).unwrap();

    {
      let conn = storage.conn.lock().unwrap();
      conn
        .execute("UPDATE cache_entries SET version = ?", params![SCHEMA_VERSION - 1])
        .unwrap();
    }

    assert!(storage.get("bootstrap").unwrap().is_none());

    // The stale row must also be gone, not just skipped.
    let conn = storage.conn.lock().unwrap();
    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))
      .unwrap();
    assert_eq!(count, 0);
  }

  #[test]
  fn test_clear_removes_everything() {
    let storage = SqliteStorage::in_memory(vec![]).unwrap();
    storage.put("a", &json!(1), Utc::now()).unwrap();
    storage.put("b", &json!(2), Utc::now()).unwrap();

    storage.clear().unwrap();

    assert!(storage.get("a").unwrap().is_none());
    assert!(storage.get("b").unwrap().is_none());
  }

  #[test]
  fn test_evict_oldest_skips_reserved_keys() {
    let storage = SqliteStorage::in_memory(vec!["bootstrap".to_string()]).unwrap();
    let base = Utc::now();

    storage
      .put("bootstrap", &json!(0), base - chrono::Duration::hours(3))
      .unwrap();
    storage
      .put("fixtures", &json!(1), base - chrono::Duration::hours(2))
      .unwrap();
    storage
      .put("gw_live_1", &json!(2), base - chrono::Duration::hours(1))
      .unwrap();

    let dropped = storage.evict_oldest(1).unwrap();
    assert_eq!(dropped, 1);

    // Oldest non-reserved entry goes first; bootstrap survives.
    assert!(storage.get("bootstrap").unwrap().is_some());
    assert!(storage.get("fixtures").unwrap().is_none());
    assert!(storage.get("gw_live_1").unwrap().is_some());
  }

  #[test]
  fn test_unreadable_payload_dropped() {
    let storage = SqliteStorage::in_memory(vec![]).unwrap();
    storage.put("bootstrap", &json!({}), Utc::now()).unwrap();

    {
      let conn = storage.conn.lock().unwrap();
      conn
        .execute(
          "UPDATE cache_entries SET data = ? WHERE key = 'bootstrap'",
          params![b"not json".to_vec()],
        )
        .unwrap();
    }

    assert!(storage.get("bootstrap").unwrap().is_none());
  }
}
