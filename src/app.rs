use std::io::stdout;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tokio::sync::mpsc;

use crate::cache::{self, CacheStore};
use crate::commands::{self, Command};
use crate::config::Config;
use crate::event::{DataEvent, Event, EventHandler};
use crate::poller::{RowPoller, PRODUCT_POLL_INTERVAL};
use crate::table::{ScrollMetrics, TableData, TableOptions};
use crate::ui;
use crate::wb::api_types::CARDS_PAGE_SIZE;
use crate::wb::types::{Order, PivotItem, Product, ProductCursor, Sale};
use crate::wb::{pivot, WbClient};

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
  Search,
}

/// Current view - each variant owns its table controller
pub enum ViewState {
  Orders(TableData<Order>),
  Sales(TableData<Sale>),
  Products {
    table: TableData<Product>,
    /// Continuation cursor shared with the page fetcher; reset on refresh.
    cursor: Arc<Mutex<Option<ProductCursor>>>,
    /// Server-side textSearch, applied on the next (re)fetch.
    filter_text: Arc<Mutex<String>>,
  },
  Pivot(TableData<PivotItem>),
}

/// Run `$body` against whichever table the current view owns.
macro_rules! with_table {
  ($view:expr, $table:ident => $body:expr) => {
    match $view {
      ViewState::Orders($table) => $body,
      ViewState::Sales($table) => $body,
      ViewState::Products { table: $table, .. } => $body,
      ViewState::Pivot($table) => $body,
    }
  };
}

/// Main application state
pub struct App {
  view: ViewState,

  /// Scroll offset (rows) into the displayed items of the current view
  scroll: usize,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Application configuration
  config: Config,

  /// Wildberries client
  client: WbClient,

  /// Shared cache store backing every table
  store: Arc<dyn CacheStore>,

  /// Freshness poller for visible product rows
  poller: RowPoller,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Rows the content area can show, updated each frame
  content_height: u16,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, client: WbClient, store: Arc<dyn CacheStore>) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    let mut app = Self {
      view: ViewState::Orders(TableData::new(
        Arc::clone(&store),
        TableOptions {
          cache_key: "wb_orders_cache".to_string(),
          store_name: "orders".to_string(),
          cache_expiry_ms: config.cache_expiry_ms(),
          page_size: config.page_size,
        },
        || async { Ok(Vec::new()) },
      )),
      scroll: 0,
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      config,
      client,
      store,
      poller: RowPoller::new(PRODUCT_POLL_INTERVAL),
      event_tx: tx,
      content_height: 0,
      should_quit: false,
    };
    app.view = app.orders_view();
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    // Main loop
    while !self.should_quit {
      // Header, content borders and header row, table status, status bar
      let size = terminal.size()?;
      self.content_height = size.height.saturating_sub(6);

      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  // View construction

  fn table_options(&self, cache_key: &str, store_name: &str, page_size: usize) -> TableOptions {
    TableOptions {
      cache_key: cache_key.to_string(),
      store_name: store_name.to_string(),
      cache_expiry_ms: self.config.cache_expiry_ms(),
      page_size,
    }
  }

  fn orders_view(&self) -> ViewState {
    let client = self.client.clone();
    let days_back = self.config.days_back;
    let mut table = TableData::new(
      Arc::clone(&self.store),
      self.table_options("wb_orders_cache", "orders", self.config.page_size),
      move || {
        let client = client.clone();
        async move {
          client
            .orders(&date_from(days_back))
            .await
            .map_err(|e| e.to_string())
        }
      },
    );
    table.load();
    ViewState::Orders(table)
  }

  fn sales_view(&self) -> ViewState {
    let client = self.client.clone();
    let days_back = self.config.days_back;
    let mut table = TableData::new(
      Arc::clone(&self.store),
      self.table_options("wb_sales_cache", "sales", self.config.page_size),
      move || {
        let client = client.clone();
        async move {
          client
            .sales(&date_from(days_back))
            .await
            .map_err(|e| e.to_string())
        }
      },
    );
    table.load();
    ViewState::Sales(table)
  }

  fn pivot_view(&self) -> ViewState {
    let client = self.client.clone();
    let days_back = self.config.days_back;
    let mut table = TableData::new(
      Arc::clone(&self.store),
      self.table_options("wb_pivot_cache", "pivot", self.config.page_size),
      move || {
        let client = client.clone();
        async move {
          pivot::fetch_pivot(&client, &date_from(days_back))
            .await
            .map_err(|e| e.to_string())
        }
      },
    );
    table.load();
    ViewState::Pivot(table)
  }

  /// Products paginate remotely: the first fetch resets the shared cursor,
  /// the page fetcher continues from it, and "more pages exist" is exactly
  /// "the server echoed a cursor back".
  fn products_view(&self) -> ViewState {
    let cursor: Arc<Mutex<Option<ProductCursor>>> = Arc::new(Mutex::new(None));
    let filter_text: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));

    let client = self.client.clone();
    let cursor_ref = Arc::clone(&cursor);
    let filter_ref = Arc::clone(&filter_text);
    let fetcher = move || {
      let client = client.clone();
      let cursor = Arc::clone(&cursor_ref);
      let filter = Arc::clone(&filter_ref);
      async move {
        let text = read_lock(&filter)?;
        let page = client
          .products(None, &text)
          .await
          .map_err(|e| e.to_string())?;
        store_cursor(&cursor, page.cursor);
        Ok(page.items)
      }
    };

    let client = self.client.clone();
    let cursor_ref = Arc::clone(&cursor);
    let filter_ref = Arc::clone(&filter_text);
    let page_fetcher = move || {
      let client = client.clone();
      let cursor = Arc::clone(&cursor_ref);
      let filter = Arc::clone(&filter_ref);
      async move {
        let Some(current) = read_lock(&cursor)? else {
          return Ok(Vec::new());
        };
        let text = read_lock(&filter)?;
        let page = client
          .products(Some(&current), &text)
          .await
          .map_err(|e| e.to_string())?;
        store_cursor(&cursor, page.cursor);
        Ok(page.items)
      }
    };

    let cursor_ref = Arc::clone(&cursor);
    let mut table = TableData::new(
      Arc::clone(&self.store),
      self.table_options("wb_products_cache", "products", CARDS_PAGE_SIZE as usize),
      fetcher,
    )
    .with_page_fetcher(page_fetcher)
    .with_has_more_check(move |_items: &[Product]| {
      cursor_ref.lock().map(|c| c.is_some()).unwrap_or(false)
    });
    table.load();
    ViewState::Products {
      table,
      cursor,
      filter_text,
    }
  }

  // Event handling

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.on_tick(),
      Event::Data(data) => self.handle_data_event(data),
    }
  }

  fn on_tick(&mut self) {
    let now = Instant::now();
    let (applied, committed) = with_table!(&mut self.view, table => {
      (table.poll(), table.tick(now))
    });

    if committed {
      // Query changed, the visible window starts over
      self.scroll = 0;
    }
    if applied {
      let displayed = with_table!(&self.view, table => table.displayed_items().len());
      self.scroll = self.scroll.min(displayed.saturating_sub(1));
    }

    self.poll_product_rows(now);
  }

  /// Probe visible product rows whose poll deadline has passed.
  fn poll_product_rows(&mut self, now: Instant) {
    let ViewState::Products { table, .. } = &self.view else {
      return;
    };
    let items = table.displayed_items();
    let start = self.scroll.min(items.len());
    let end = (start + self.content_height as usize).min(items.len());
    let visible: Vec<i64> = items[start..end].iter().map(|p| p.nm_id).collect();

    for nm_id in self.poller.due(&visible, now) {
      let client = self.client.clone();
      let tx = self.event_tx.clone();
      tokio::spawn(async move {
        let result = client.product_by_id(nm_id).await.map_err(|e| e.to_string());
        let _ = tx.send(Event::Data(DataEvent::ProductProbed { nm_id, result }));
      });
    }
  }

  fn handle_data_event(&mut self, event: DataEvent) {
    match event {
      DataEvent::ProductProbed { nm_id, result } => {
        self.poller.completed(nm_id);
        let ViewState::Products { table, .. } = &mut self.view else {
          return;
        };
        match result {
          Ok(Some(product)) => {
            let changed = table
              .all_items()
              .iter()
              .any(|p| p.nm_id == nm_id && p.updated_at != product.updated_at);
            if changed {
              if let Err(e) = cache::update_cached_item(
                self.store.as_ref(),
                "wb_products_cache",
                "products",
                |p: &Product| p.nm_id == nm_id,
                &product,
              ) {
                tracing::warn!(nm_id, error = %e, "failed to update cached product");
              }
              table.update_where(|p| p.nm_id == nm_id, product);
            }
          }
          // The product disappeared upstream; keep showing the known row
          Ok(None) => {}
          Err(error) => {
            tracing::warn!(nm_id, %error, "product freshness probe failed");
          }
        }
      }
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
      Mode::Search => self.handle_search_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      // Quit
      KeyCode::Char('q') => {
        self.should_quit = true;
      }
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
      KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
      KeyCode::PageUp => self.scroll_by(-(self.content_height as i64)),
      KeyCode::PageDown => self.scroll_by(self.content_height as i64),
      KeyCode::Home | KeyCode::Char('g') => {
        self.scroll = 0;
      }
      KeyCode::End | KeyCode::Char('G') => self.scroll_by(i64::MAX / 2),

      // Refresh
      KeyCode::Char('r') => self.refresh_current(),

      // Mode switches
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Char('/') => {
        self.mode = Mode::Search;
      }

      _ => {}
    }
  }

  fn handle_command_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0;
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn handle_search_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        let now = Instant::now();
        with_table!(&mut self.view, table => table.set_search_query("", now));
      }
      KeyCode::Enter => {
        self.mode = Mode::Normal;
      }
      KeyCode::Backspace => {
        let now = Instant::now();
        with_table!(&mut self.view, table => {
          let mut query = table.search_query().to_string();
          query.pop();
          table.set_search_query(query, now);
        });
      }
      KeyCode::Char(c) => {
        let now = Instant::now();
        with_table!(&mut self.view, table => {
          let query = format!("{}{}", table.search_query(), c);
          table.set_search_query(query, now);
        });
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    // Either the selected suggestion or the raw input
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self.command_input.trim().to_lowercase()
    };

    match cmd.as_str() {
      "orders" => self.switch_view(self.orders_view()),
      "sales" => self.switch_view(self.sales_view()),
      "products" => self.switch_view(self.products_view()),
      "pivot" => self.switch_view(self.pivot_view()),
      "quit" => {
        self.should_quit = true;
      }
      _ => {
        // Unknown command
      }
    }
    self.command_input.clear();
  }

  fn switch_view(&mut self, view: ViewState) {
    self.view = view;
    self.scroll = 0;
  }

  /// Force a re-fetch of the current view, bypassing the cache.
  ///
  /// For products this also resets the pagination cursor and pushes the
  /// current query down to the server as textSearch.
  fn refresh_current(&mut self) {
    match &mut self.view {
      ViewState::Products {
        table,
        cursor,
        filter_text,
      } => {
        if let Ok(mut slot) = cursor.lock() {
          *slot = None;
        }
        if let Ok(mut text) = filter_text.lock() {
          *text = table.debounced_query().to_string();
        }
        table.refresh();
      }
      view => with_table!(view, table => table.refresh()),
    }
    self.scroll = 0;
  }

  fn scroll_by(&mut self, delta: i64) {
    let displayed = with_table!(&self.view, table => table.displayed_items().len());
    let max = displayed.saturating_sub(1) as i64;
    self.scroll = (self.scroll as i64).saturating_add(delta).clamp(0, max) as usize;

    let metrics = ScrollMetrics {
      scroll_top: self.scroll as u32,
      scroll_height: displayed as u32,
      client_height: self.content_height as u32,
    };
    with_table!(&mut self.view, table => table.handle_scroll(&metrics));
  }

  // Accessors for UI rendering

  pub fn view(&self) -> &ViewState {
    &self.view
  }

  pub fn scroll(&self) -> usize {
    self.scroll
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn title(&self) -> &str {
    self.config.title.as_deref().unwrap_or("w9s")
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}

/// ISO 8601 lower bound for statistics queries: now minus the rolling
/// window, computed at fetch time so refreshes slide the window forward.
fn date_from(days_back: i64) -> String {
  (Utc::now() - chrono::Duration::days(days_back)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn read_lock<T: Clone>(slot: &Arc<Mutex<T>>) -> Result<T, String> {
  slot
    .lock()
    .map(|guard| guard.clone())
    .map_err(|_| "pagination state lock poisoned".to_string())
}

fn store_cursor(slot: &Arc<Mutex<Option<ProductCursor>>>, cursor: Option<ProductCursor>) {
  if let Ok(mut guard) = slot.lock() {
    *guard = cursor;
  }
}
