//! Typed helpers over the JSON-valued cache store.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::store::{CacheEntry, CacheStore};

/// A typed cache lookup result.
#[derive(Debug, Clone)]
pub struct TypedEntry<T> {
  pub data: Vec<T>,
  pub timestamp: i64,
}

/// Current time as epoch milliseconds, the timestamp unit of cache entries.
pub fn now_millis() -> i64 {
  Utc::now().timestamp_millis()
}

/// Read a cached list. A payload that no longer deserializes as `Vec<T>`
/// is treated as a miss, like any other read failure.
pub fn get_list<T: DeserializeOwned>(
  store: &dyn CacheStore,
  key: &str,
  store_name: &str,
) -> Option<TypedEntry<T>> {
  let entry = store.get(key, store_name)?;

  match serde_json::from_value::<Vec<T>>(entry.data) {
    Ok(data) => Some(TypedEntry {
      data,
      timestamp: entry.timestamp,
    }),
    Err(e) => {
      tracing::warn!(key, store_name, error = %e, "cached payload has wrong shape, treating as miss");
      None
    }
  }
}

/// Write a list under `(key, store_name)` with the given timestamp.
pub fn set_list<T: Serialize>(
  store: &dyn CacheStore,
  key: &str,
  store_name: &str,
  items: &[T],
  timestamp: i64,
) -> Result<()> {
  let data =
    serde_json::to_value(items).map_err(|e| eyre!("Failed to serialize cache payload: {}", e))?;

  store.set(key, &CacheEntry { data, timestamp }, store_name)
}

/// Replace the items matching `matches` inside a cached list and write the
/// list back with a fresh timestamp. A missing entry is a no-op.
pub fn update_cached_item<T>(
  store: &dyn CacheStore,
  key: &str,
  store_name: &str,
  matches: impl Fn(&T) -> bool,
  new_item: &T,
) -> Result<()>
where
  T: Serialize + DeserializeOwned + Clone,
{
  let Some(entry) = get_list::<T>(store, key, store_name) else {
    return Ok(());
  };

  let items: Vec<T> = entry
    .data
    .into_iter()
    .map(|item| if matches(&item) { new_item.clone() } else { item })
    .collect();

  set_list(store, key, store_name, &items, now_millis())
}
