//! Timestamped key-value cache shared by all table views.
//!
//! The store itself is a dumb `(cache_key, store_name) -> (data, timestamp)`
//! map; freshness policy lives in the table controller.

pub mod store;
pub mod typed;

pub use store::{CacheEntry, CacheStore, MemoryStore, SqliteStore};
pub use typed::{get_list, now_millis, set_list, update_cached_item, TypedEntry};
