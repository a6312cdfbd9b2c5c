//! Generic data-loading controller backing every table view.
//!
//! `TableData<T>` owns the full lifecycle of one table's dataset:
//! cache-or-fetch initial load, forced refresh, debounced full-text
//! filtering, pagination (local slicing or cursor-based fetch-more), and
//! the loading state for an infinitely scrolling view.
//!
//! Fetching follows the `Query` pattern: the fetcher is a closure
//! returning a future, work runs in a spawned task, and results come back
//! over a channel drained by `poll()` from the event-loop tick.
//!
//! # Example
//!
//! ```ignore
//! let client = client.clone();
//! let mut table = TableData::new(store, options, move || {
//!     let client = client.clone();
//!     async move { client.orders(&date_from).await.map_err(|e| e.to_string()) }
//! });
//! table.load();
//!
//! // In the event loop tick
//! if table.poll() | table.tick(Instant::now()) {
//!     // State changed, re-render
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::TimeZone;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

use super::debounce::{Debouncer, SEARCH_DEBOUNCE};
use super::filter;
use super::scroll::ScrollMetrics;
use crate::cache::{self, CacheStore};

/// Identity of a cached dataset plus its read-time policies.
#[derive(Debug, Clone)]
pub struct TableOptions {
  /// Cache lookup key (e.g. "wb_orders_cache").
  pub cache_key: String,
  /// Logical cache partition (e.g. "orders").
  pub store_name: String,
  /// Entries older than this are not served, even transiently.
  pub cache_expiry_ms: i64,
  /// Rows revealed per pagination step.
  pub page_size: usize,
}

type FetchFuture<T> = BoxFuture<'static, Result<Vec<T>, String>>;
type FetcherFn<T> = Box<dyn Fn() -> FetchFuture<T> + Send + Sync>;
type FilterFn<T> = Box<dyn Fn(&T, &str) -> bool + Send + Sync>;
type HasMoreFn<T> = Box<dyn Fn(&[T]) -> bool + Send + Sync>;

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Loading,
  Refreshing,
  LoadingMore,
}

/// A fully loaded dataset plus the timestamp it carries.
struct Loaded<T> {
  items: Vec<T>,
  timestamp: i64,
}

enum Outcome<T> {
  Loaded(Result<Loaded<T>, String>),
  Page(Result<Vec<T>, String>),
}

pub struct TableData<T> {
  options: TableOptions,
  store: Arc<dyn CacheStore>,
  fetcher: FetcherFn<T>,
  page_fetcher: Option<FetcherFn<T>>,
  has_more_check: Option<HasMoreFn<T>>,
  filter: FilterFn<T>,

  all_items: Vec<T>,
  filtered: Vec<T>,
  page: usize,
  remote_has_more: bool,

  search_query: String,
  debounced_query: String,
  debounce: Debouncer,

  last_updated: String,
  phase: Phase,
  receiver: Option<mpsc::UnboundedReceiver<Outcome<T>>>,
}

impl<T> TableData<T> {
  // Accessors

  pub fn all_items(&self) -> &[T] {
    &self.all_items
  }

  pub fn filtered_items(&self) -> &[T] {
    &self.filtered
  }

  /// The visible prefix of the filtered items.
  pub fn displayed_items(&self) -> &[T] {
    let end = self.local_end().min(self.filtered.len());
    &self.filtered[..end]
  }

  pub fn page(&self) -> usize {
    self.page
  }

  pub fn search_query(&self) -> &str {
    &self.search_query
  }

  pub fn debounced_query(&self) -> &str {
    &self.debounced_query
  }

  pub fn last_updated(&self) -> &str {
    &self.last_updated
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.phase, Phase::Loading | Phase::Refreshing)
  }

  pub fn is_loading_more(&self) -> bool {
    self.phase == Phase::LoadingMore
  }

  fn is_busy(&self) -> bool {
    self.phase != Phase::Idle
  }

  /// More rows can be revealed, locally or by a remote page fetch.
  pub fn has_more(&self) -> bool {
    if self.filtered.is_empty() {
      return false;
    }
    self.local_end() < self.filtered.len()
      || (self.page_fetcher.is_some() && self.remote_has_more)
  }

  fn local_end(&self) -> usize {
    (self.page + 1) * self.options.page_size
  }

  /// Update the raw query immediately; the filter follows after the
  /// debounce quiet period elapses (see `tick`).
  pub fn set_search_query(&mut self, query: impl Into<String>, now: Instant) {
    let query = query.into();
    self.search_query = query.clone();
    self.debounce.arm(query, now);
  }
}

impl<T> TableData<T>
where
  T: Clone + Send + Serialize + DeserializeOwned + 'static,
{
  /// Create a controller with the default all-fields filter.
  ///
  /// The fetcher is a closure returning a future; it is called on every
  /// `load()` cache miss and on every `refresh()`.
  pub fn new<F, Fut>(store: Arc<dyn CacheStore>, options: TableOptions, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, String>> + Send + 'static,
  {
    Self {
      options,
      store,
      fetcher: Box::new(move || Box::pin(fetcher())),
      page_fetcher: None,
      has_more_check: None,
      filter: Box::new(|item, query| filter::matches_any_field(item, query)),
      all_items: Vec::new(),
      filtered: Vec::new(),
      page: 0,
      remote_has_more: false,
      search_query: String::new(),
      debounced_query: String::new(),
      debounce: Debouncer::new(SEARCH_DEBOUNCE),
      last_updated: String::new(),
      phase: Phase::Idle,
      receiver: None,
    }
  }

  /// Replace the default filter with a per-view one.
  pub fn with_filter<F>(mut self, filter: F) -> Self
  where
    F: Fn(&T, &str) -> bool + Send + Sync + 'static,
  {
    self.filter = Box::new(filter);
    self
  }

  /// Enable remote pagination. The page fetcher is called when local
  /// pages run out; its cursor lives with the caller and is opaque here.
  pub fn with_page_fetcher<F, Fut>(mut self, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, String>> + Send + 'static,
  {
    self.page_fetcher = Some(Box::new(move || Box::pin(fetcher())));
    self.remote_has_more = true;
    self
  }

  /// Override the "more remote pages exist" predicate. The default is
  /// "the returned page was full".
  pub fn with_has_more_check<F>(mut self, check: F) -> Self
  where
    F: Fn(&[T]) -> bool + Send + Sync + 'static,
  {
    self.has_more_check = Some(Box::new(check));
    self
  }

  // Actions

  /// Cache-or-fetch initial load. Invoked once when a view is created;
  /// a no-op while an operation is in flight.
  ///
  /// A fresh cache entry is adopted without any network call; an expired
  /// or missing one triggers the fetcher and a cache write-back. Fetch or
  /// write failure is logged and leaves prior state intact; the loading
  /// phase clears in every case.
  pub fn load(&mut self) {
    if self.is_busy() {
      return;
    }
    self.phase = Phase::Loading;

    let tx = self.fresh_channel();
    let store = Arc::clone(&self.store);
    let options = self.options.clone();
    let future = (self.fetcher)();
    tokio::spawn(async move {
      let outcome = load_or_fetch(store, options, future).await;
      let _ = tx.send(Outcome::Loaded(outcome));
    });
  }

  /// Unconditional re-fetch, bypassing the cache read and overwriting the
  /// cache entry. Cancels any pending operation; a superseded in-flight
  /// result is discarded, never applied.
  pub fn refresh(&mut self) {
    self.phase = Phase::Refreshing;

    let tx = self.fresh_channel();
    let store = Arc::clone(&self.store);
    let options = self.options.clone();
    let future = (self.fetcher)();
    tokio::spawn(async move {
      let outcome = fetch_and_store(store, options, future).await;
      let _ = tx.send(Outcome::Loaded(outcome));
    });
  }

  /// Commit a debounced query whose quiet period has elapsed. Returns
  /// true when the filtered view changed.
  pub fn tick(&mut self, now: Instant) -> bool {
    match self.debounce.poll(now) {
      Some(query) if query != self.debounced_query => {
        self.debounced_query = query;
        self.apply_filter();
        self.page = 0;
        true
      }
      _ => false,
    }
  }

  /// Reveal more rows: advance the local page while filtered rows remain
  /// hidden, otherwise fetch the next remote page (if configured).
  ///
  /// The phase guard makes a second call while a fetch is in flight a
  /// no-op, so rapid scroll events cannot start duplicate page fetches.
  pub fn load_more(&mut self) {
    if self.is_busy() {
      return;
    }

    if self.local_end() < self.filtered.len() {
      self.page += 1;
      return;
    }

    let Some(page_fetcher) = &self.page_fetcher else {
      return;
    };
    if !self.remote_has_more {
      return;
    }
    self.phase = Phase::LoadingMore;

    let future = page_fetcher();
    let tx = self.fresh_channel();
    tokio::spawn(async move {
      let outcome = future.await;
      let _ = tx.send(Outcome::Page(outcome));
    });
  }

  /// React to a scroll position change; the sole trigger for infinite
  /// scroll.
  pub fn handle_scroll(&mut self, metrics: &ScrollMetrics) {
    if metrics.near_bottom() && !self.is_busy() && self.has_more() && !self.filtered.is_empty() {
      self.load_more();
    }
  }

  /// Drain the result channel and apply the outcome. Returns true when
  /// state changed. Called from the event-loop tick.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(outcome) => {
        self.receiver = None;
        self.apply(outcome);
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        tracing::warn!(
          store_name = %self.options.store_name,
          "fetch task dropped without a result"
        );
        self.receiver = None;
        self.phase = Phase::Idle;
        true
      }
    }
  }

  /// Replace the rows matching `matches` in place (e.g. a re-polled
  /// product identified by nmID) and refilter.
  pub fn update_where(&mut self, matches: impl Fn(&T) -> bool, new_item: T) {
    let mut changed = false;
    for item in &mut self.all_items {
      if matches(item) {
        *item = new_item.clone();
        changed = true;
      }
    }
    if changed {
      self.apply_filter();
      self.page = 0;
    }
  }

  // Internals

  fn fresh_channel(&mut self) -> mpsc::UnboundedSender<Outcome<T>> {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    tx
  }

  fn apply(&mut self, outcome: Outcome<T>) {
    match outcome {
      Outcome::Loaded(Ok(loaded)) => {
        self.all_items = loaded.items;
        self.last_updated = format_timestamp(loaded.timestamp);
        if self.page_fetcher.is_some() {
          self.remote_has_more = true;
        }
        self.apply_filter();
        self.page = 0;
        self.phase = Phase::Idle;
      }
      Outcome::Loaded(Err(error)) => {
        tracing::warn!(
          store_name = %self.options.store_name,
          %error,
          "load failed, keeping last-known data"
        );
        self.phase = Phase::Idle;
      }
      Outcome::Page(Ok(items)) => {
        self.remote_has_more = match &self.has_more_check {
          Some(check) => check(&items),
          None => items.len() == self.options.page_size,
        };
        self.all_items.extend(items);
        self.apply_filter();
        // Appending extends the visible prefix instead of resetting it
        self.page += 1;
        self.phase = Phase::Idle;
      }
      Outcome::Page(Err(error)) => {
        tracing::warn!(
          store_name = %self.options.store_name,
          %error,
          "page fetch failed"
        );
        self.phase = Phase::Idle;
      }
    }
  }

  fn apply_filter(&mut self) {
    let query = self.debounced_query.trim().to_lowercase();
    if query.is_empty() {
      self.filtered = self.all_items.clone();
    } else {
      self.filtered = self
        .all_items
        .iter()
        .filter(|item| (self.filter)(item, &query))
        .cloned()
        .collect();
    }
  }
}

/// Cache-or-fetch pipeline: serve a fresh entry, otherwise fetch and
/// write back. Runs inside the spawned task.
async fn load_or_fetch<T>(
  store: Arc<dyn CacheStore>,
  options: TableOptions,
  future: FetchFuture<T>,
) -> Result<Loaded<T>, String>
where
  T: Serialize + DeserializeOwned + Send,
{
  let now = cache::now_millis();

  if let Some(entry) = cache::get_list::<T>(store.as_ref(), &options.cache_key, &options.store_name)
  {
    if now - entry.timestamp < options.cache_expiry_ms {
      tracing::debug!(
        key = %options.cache_key,
        store_name = %options.store_name,
        "cache hit"
      );
      return Ok(Loaded {
        items: entry.data,
        timestamp: entry.timestamp,
      });
    }
  }

  fetch_and_store(store, options, future).await
}

/// Fetch pipeline: run the fetcher and persist its result with a fresh
/// timestamp. A failed cache write fails the whole load, so data is never
/// adopted while looking persisted.
async fn fetch_and_store<T>(
  store: Arc<dyn CacheStore>,
  options: TableOptions,
  future: FetchFuture<T>,
) -> Result<Loaded<T>, String>
where
  T: Serialize + DeserializeOwned + Send,
{
  let items = future.await?;
  let now = cache::now_millis();

  cache::set_list(
    store.as_ref(),
    &options.cache_key,
    &options.store_name,
    &items,
    now,
  )
  .map_err(|e| e.to_string())?;

  Ok(Loaded {
    items,
    timestamp: now,
  })
}

fn format_timestamp(millis: i64) -> String {
  chrono::Local
    .timestamp_millis_opt(millis)
    .single()
    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use color_eyre::eyre::eyre;
  use serde::Deserialize;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::time::Duration;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id: u32,
    brand: String,
  }

  fn item(id: u32, brand: &str) -> Item {
    Item {
      id,
      brand: brand.to_string(),
    }
  }

  fn options(page_size: usize) -> TableOptions {
    TableOptions {
      cache_key: "wb_test_cache".to_string(),
      store_name: "orders".to_string(),
      cache_expiry_ms: 30 * 60 * 1000,
      page_size,
    }
  }

  /// Store whose writes always fail, for the write-failure path.
  struct FailingStore;

  impl CacheStore for FailingStore {
    fn get(&self, _key: &str, _store_name: &str) -> Option<cache::CacheEntry> {
      None
    }

    fn set(
      &self,
      _key: &str,
      _entry: &cache::CacheEntry,
      _store_name: &str,
    ) -> color_eyre::Result<()> {
      Err(eyre!("disk full"))
    }
  }

  fn counting_fetcher(
    items: Vec<Item>,
  ) -> (
    Arc<AtomicUsize>,
    impl Fn() -> futures::future::Ready<Result<Vec<Item>, String>> + Send + Sync + 'static,
  ) {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    let fetcher = move || {
      calls_clone.fetch_add(1, Ordering::SeqCst);
      futures::future::ready(Ok(items.clone()))
    };
    (calls, fetcher)
  }

  async fn settle(table: &mut TableData<Item>) {
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(table.poll());
  }

  #[tokio::test]
  async fn test_fresh_cache_entry_skips_fetch() {
    let store = Arc::new(MemoryStore::new());
    cache::set_list(
      store.as_ref(),
      "wb_test_cache",
      "orders",
      &[item(1, "A"), item(2, "B")],
      cache::now_millis() - 1000,
    )
    .unwrap();

    let (calls, fetcher) = counting_fetcher(vec![item(9, "X")]);
    let mut table = TableData::new(store, options(50), fetcher);
    table.load();
    settle(&mut table).await;

    assert_eq!(table.all_items(), &[item(1, "A"), item(2, "B")]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!table.last_updated().is_empty());
    assert_eq!(table.phase(), Phase::Idle);
  }

  #[tokio::test]
  async fn test_cache_miss_fetches_once_and_persists() {
    let store = Arc::new(MemoryStore::new());
    let before = cache::now_millis();

    let (calls, fetcher) = counting_fetcher(vec![item(1, "X"), item(2, "Y"), item(3, "Z")]);
    let mut table = TableData::new(Arc::clone(&store) as Arc<dyn CacheStore>, options(50), fetcher);
    table.load();
    // A second load while the first is in flight is a no-op
    table.load();
    settle(&mut table).await;

    assert_eq!(table.all_items().len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let entry = cache::get_list::<Item>(store.as_ref(), "wb_test_cache", "orders").unwrap();
    assert_eq!(entry.data.len(), 3);
    assert!(entry.timestamp >= before);
  }

  #[tokio::test]
  async fn test_expired_cache_entry_refetches() {
    let store = Arc::new(MemoryStore::new());
    let opts = options(50);
    cache::set_list(
      store.as_ref(),
      "wb_test_cache",
      "orders",
      &[item(1, "stale")],
      cache::now_millis() - 2 * opts.cache_expiry_ms,
    )
    .unwrap();

    let (calls, fetcher) = counting_fetcher(vec![item(2, "fresh")]);
    let mut table = TableData::new(Arc::clone(&store) as Arc<dyn CacheStore>, opts, fetcher);
    table.load();
    settle(&mut table).await;

    assert_eq!(table.all_items(), &[item(2, "fresh")]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let entry = cache::get_list::<Item>(store.as_ref(), "wb_test_cache", "orders").unwrap();
    assert_eq!(entry.data, vec![item(2, "fresh")]);
  }

  #[tokio::test]
  async fn test_refresh_bypasses_fresh_cache() {
    let store = Arc::new(MemoryStore::new());
    cache::set_list(
      store.as_ref(),
      "wb_test_cache",
      "orders",
      &[item(1, "cached")],
      cache::now_millis(),
    )
    .unwrap();

    let (calls, fetcher) = counting_fetcher(vec![item(2, "network")]);
    let mut table = TableData::new(store, options(50), fetcher);
    table.refresh();
    settle(&mut table).await;

    assert_eq!(table.all_items(), &[item(2, "network")]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(table.page(), 0);
  }

  #[tokio::test]
  async fn test_fetch_error_keeps_previous_data() {
    let store = Arc::new(MemoryStore::new());
    let fail = Arc::new(AtomicBool::new(false));
    let fail_clone = Arc::clone(&fail);
    let mut table = TableData::new(store, options(50), move || {
      let fail = Arc::clone(&fail_clone);
      async move {
        if fail.load(Ordering::SeqCst) {
          Err("API responded with status 500".to_string())
        } else {
          Ok(vec![item(1, "A")])
        }
      }
    });

    table.load();
    settle(&mut table).await;
    assert_eq!(table.all_items().len(), 1);

    fail.store(true, Ordering::SeqCst);
    table.refresh();
    settle(&mut table).await;

    assert_eq!(table.all_items(), &[item(1, "A")]);
    assert_eq!(table.phase(), Phase::Idle);
  }

  #[tokio::test]
  async fn test_cache_write_failure_keeps_previous_data() {
    let (calls, fetcher) = counting_fetcher(vec![item(1, "A")]);
    let mut table = TableData::new(Arc::new(FailingStore), options(50), fetcher);
    table.load();
    settle(&mut table).await;

    // Fetch ran, but the failed write means the data is not adopted
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(table.all_items().is_empty());
    assert_eq!(table.phase(), Phase::Idle);
  }

  #[tokio::test]
  async fn test_refresh_discards_superseded_result() {
    let store = Arc::new(MemoryStore::new());
    let generation = Arc::new(AtomicUsize::new(0));
    let generation_clone = Arc::clone(&generation);
    let mut table = TableData::new(store, options(50), move || {
      let gen = generation_clone.fetch_add(1, Ordering::SeqCst) as u32;
      async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(vec![item(gen, "gen")])
      }
    });

    table.load();
    tokio::time::sleep(Duration::from_millis(5)).await;
    table.refresh();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(table.poll());

    // Only the second fetch's result is applied
    assert_eq!(table.all_items(), &[item(1, "gen")]);
  }

  #[tokio::test]
  async fn test_search_debounce_and_filter() {
    let store = Arc::new(MemoryStore::new());
    let mut items: Vec<Item> = (0..99).map(|i| item(i, "Globex")).collect();
    items.push(item(100, "Acme"));
    let (_, fetcher) = counting_fetcher(items);
    let mut table = TableData::new(store, options(50), fetcher);
    table.load();
    settle(&mut table).await;

    let start = Instant::now();
    table.set_search_query("ac", start);
    table.set_search_query("acme", start + Duration::from_millis(100));

    assert!(!table.tick(start + Duration::from_millis(500)));
    assert_eq!(table.filtered_items().len(), 100);

    assert!(table.tick(start + Duration::from_millis(600)));
    assert_eq!(table.debounced_query(), "acme");
    assert_eq!(table.filtered_items(), &[item(100, "Acme")]);
    assert_eq!(table.page(), 0);
  }

  #[tokio::test]
  async fn test_displayed_is_filtered_prefix() {
    let store = Arc::new(MemoryStore::new());
    let items: Vec<Item> = (0..25).map(|i| item(i, "B")).collect();
    let (_, fetcher) = counting_fetcher(items);
    let mut table = TableData::new(store, options(10), fetcher);
    table.load();
    settle(&mut table).await;

    assert_eq!(table.displayed_items(), &table.filtered_items()[..10]);
    assert!(table.has_more());

    table.load_more();
    assert_eq!(table.page(), 1);
    assert_eq!(table.displayed_items().len(), 20);

    table.load_more();
    assert_eq!(table.displayed_items().len(), 25);
    assert!(!table.has_more());

    // Nothing left to reveal
    table.load_more();
    assert_eq!(table.page(), 2);
  }

  #[tokio::test]
  async fn test_query_change_resets_page() {
    let store = Arc::new(MemoryStore::new());
    let items: Vec<Item> = (0..30).map(|i| item(i, "B")).collect();
    let (_, fetcher) = counting_fetcher(items);
    let mut table = TableData::new(store, options(10), fetcher);
    table.load();
    settle(&mut table).await;

    table.load_more();
    assert_eq!(table.page(), 1);

    let start = Instant::now();
    table.set_search_query("1", start);
    assert!(table.tick(start + Duration::from_millis(500)));
    assert_eq!(table.page(), 0);
    let end = table.displayed_items().len();
    assert_eq!(table.displayed_items(), &table.filtered_items()[..end]);
  }

  #[tokio::test]
  async fn test_rapid_load_more_fetches_once() {
    let store = Arc::new(MemoryStore::new());
    let first_page: Vec<Item> = (0..10).map(|i| item(i, "B")).collect();
    let (_, fetcher) = counting_fetcher(first_page);

    let page_calls = Arc::new(AtomicUsize::new(0));
    let page_calls_clone = Arc::clone(&page_calls);
    let mut table = TableData::new(store, options(10), fetcher).with_page_fetcher(move || {
      page_calls_clone.fetch_add(1, Ordering::SeqCst);
      async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok((10..20).map(|i| item(i, "B")).collect())
      }
    });
    table.load();
    settle(&mut table).await;

    // Local pages exhausted; both triggers race for the remote fetch
    table.load_more();
    table.load_more();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(table.poll());

    assert_eq!(page_calls.load(Ordering::SeqCst), 1);
    assert_eq!(table.all_items().len(), 20);
  }

  #[tokio::test]
  async fn test_remote_pagination_reaches_end() {
    let store = Arc::new(MemoryStore::new());
    let first_page: Vec<Item> = (0..100).map(|i| item(i, "B")).collect();
    let (_, fetcher) = counting_fetcher(first_page);

    let mut table = TableData::new(store, options(100), fetcher).with_page_fetcher(|| async {
      Ok((100..140).map(|i| item(i, "B")).collect())
    });
    table.load();
    settle(&mut table).await;
    assert!(table.has_more());

    table.load_more();
    settle(&mut table).await;

    // A short page (40 < 100) is the end-of-data signal
    assert_eq!(table.all_items().len(), 140);
    assert_eq!(table.displayed_items().len(), 140);
    assert!(!table.has_more());
  }

  #[tokio::test]
  async fn test_has_more_check_overrides_page_size_heuristic() {
    let store = Arc::new(MemoryStore::new());
    let first_page: Vec<Item> = (0..10).map(|i| item(i, "B")).collect();
    let (_, fetcher) = counting_fetcher(first_page);

    let mut table = TableData::new(store, options(10), fetcher)
      .with_page_fetcher(|| async { Ok((10..20).map(|i| item(i, "B")).collect()) })
      .with_has_more_check(|_items| false);
    table.load();
    settle(&mut table).await;

    table.load_more();
    settle(&mut table).await;

    // The page was full, but the predicate says the cursor is gone
    assert_eq!(table.all_items().len(), 20);
    assert!(!table.has_more());
  }

  #[tokio::test]
  async fn test_scroll_near_bottom_triggers_load_more() {
    let store = Arc::new(MemoryStore::new());
    let items: Vec<Item> = (0..30).map(|i| item(i, "B")).collect();
    let (_, fetcher) = counting_fetcher(items);
    let mut table = TableData::new(store, options(10), fetcher);
    table.load();
    settle(&mut table).await;

    table.handle_scroll(&ScrollMetrics {
      scroll_top: 0,
      scroll_height: 10,
      client_height: 5,
    });
    assert_eq!(table.page(), 1);
  }

  #[tokio::test]
  async fn test_scroll_without_data_does_nothing() {
    let store = Arc::new(MemoryStore::new());
    let (_, fetcher) = counting_fetcher(Vec::new());
    let mut table = TableData::new(store, options(10), fetcher);
    table.load();
    settle(&mut table).await;

    table.handle_scroll(&ScrollMetrics {
      scroll_top: 0,
      scroll_height: 0,
      client_height: 5,
    });
    assert_eq!(table.page(), 0);
  }

  #[tokio::test]
  async fn test_update_where_replaces_in_place() {
    let store = Arc::new(MemoryStore::new());
    let (_, fetcher) = counting_fetcher(vec![item(1, "A"), item(2, "B")]);
    let mut table = TableData::new(store, options(10), fetcher);
    table.load();
    settle(&mut table).await;

    table.update_where(|i| i.id == 2, item(2, "B-renamed"));
    assert_eq!(table.all_items()[1].brand, "B-renamed");
    assert_eq!(table.filtered_items().len(), 2);
  }
}
