//! Cache store contract and its SQLite / in-memory backends.

use std::collections::HashMap;
use std::sync::Mutex;

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// A cached dataset: the payload plus the epoch-millis write time.
///
/// Freshness is not a store concern; it is a read-time policy applied by
/// the table controller.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
  pub data: Value,
  pub timestamp: i64,
}

/// Key-value persistence of `(cache_key, store_name) -> CacheEntry`.
///
/// `store_name` partitions logically distinct datasets (orders, sales,
/// products, pivot) sharing one physical store. Writes upsert; the last
/// write wins. Read failures are swallowed so callers always fall back to
/// a live fetch, while write failures propagate.
pub trait CacheStore: Send + Sync {
  /// Look up an entry. `None` on miss or on any read failure.
  fn get(&self, key: &str, store_name: &str) -> Option<CacheEntry>;

  /// Upsert an entry. Errors propagate to the caller.
  fn set(&self, key: &str, entry: &CacheEntry, store_name: &str) -> Result<()>;
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache (
    cache_key TEXT NOT NULL,
    store_name TEXT NOT NULL,
    data BLOB NOT NULL,
    timestamp INTEGER NOT NULL,
    PRIMARY KEY (cache_key, store_name)
);
"#;

/// SQLite-backed cache store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the cache database at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open an in-memory store, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("w9s").join("cache.db"))
  }

  fn try_get(&self, key: &str, store_name: &str) -> Result<Option<CacheEntry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(Vec<u8>, i64)> = conn
      .query_row(
        "SELECT data, timestamp FROM cache WHERE cache_key = ? AND store_name = ?",
        params![key, store_name],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to query cache: {}", e))?;

    match row {
      Some((data, timestamp)) => {
        let data: Value = serde_json::from_slice(&data)
          .map_err(|e| eyre!("Failed to deserialize cache entry: {}", e))?;
        Ok(Some(CacheEntry { data, timestamp }))
      }
      None => Ok(None),
    }
  }
}

impl CacheStore for SqliteStore {
  fn get(&self, key: &str, store_name: &str) -> Option<CacheEntry> {
    match self.try_get(key, store_name) {
      Ok(entry) => entry,
      Err(e) => {
        tracing::warn!(key, store_name, error = %e, "cache read failed, treating as miss");
        None
      }
    }
  }

  fn set(&self, key: &str, entry: &CacheEntry, store_name: &str) -> Result<()> {
    let data = serde_json::to_vec(&entry.data)
      .map_err(|e| eyre!("Failed to serialize cache entry: {}", e))?;

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT INTO cache (cache_key, store_name, data, timestamp)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (cache_key, store_name)
         DO UPDATE SET data = excluded.data, timestamp = excluded.timestamp",
        params![key, store_name, data, entry.timestamp],
      )
      .map_err(|e| eyre!("Failed to write cache entry: {}", e))?;

    Ok(())
  }
}

/// In-memory cache store.
///
/// Used by tests, and as a degraded no-persistence mode when the SQLite
/// database cannot be opened.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<(String, String), CacheEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStore for MemoryStore {
  fn get(&self, key: &str, store_name: &str) -> Option<CacheEntry> {
    let entries = match self.entries.lock() {
      Ok(entries) => entries,
      Err(e) => {
        tracing::warn!(key, store_name, error = %e, "cache read failed, treating as miss");
        return None;
      }
    };
    entries.get(&(key.to_string(), store_name.to_string())).cloned()
  }

  fn set(&self, key: &str, entry: &CacheEntry, store_name: &str) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.insert((key.to_string(), store_name.to_string()), entry.clone());
    Ok(())
  }
}
