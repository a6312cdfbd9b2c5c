mod app;
mod cache;
mod commands;
mod config;
mod event;
mod poller;
mod table;
mod ui;
mod wb;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "w9s")]
#[command(about = "A terminal UI for Wildberries seller statistics, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/w9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Days of order/sales history to fetch
  #[arg(short, long)]
  days: Option<i64>,
}

/// Logs go to a rolling file; stdout belongs to the terminal UI.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("w9s")
    .join("logs");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let file = tracing_appender::rolling::daily(log_dir, "w9s.log");
  let (writer, guard) = tracing_appender::non_blocking(file);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_tracing()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override history window if specified on command line
  let config = if let Some(days) = args.days {
    if days <= 0 {
      return Err(eyre!("--days must be positive"));
    }
    config::Config { days_back: days, ..config }
  } else {
    config
  };

  let client = wb::WbClient::new(&config)?;
  let store: Arc<dyn cache::CacheStore> = Arc::new(cache::SqliteStore::open()?);

  // Initialize and run the app
  let mut app = app::App::new(config, client, store);
  app.run().await?;

  Ok(())
}
