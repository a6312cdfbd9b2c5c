use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  /// Rolling window for orders/sales: fetch records from now minus this
  /// many days.
  pub days_back: i64,
  /// Cached datasets older than this are refetched.
  pub cache_expiry_minutes: i64,
  /// Rows revealed per pagination step for orders/sales/pivot tables.
  pub page_size: usize,
  /// Custom title for the header (defaults to "w9s" if not set)
  pub title: Option<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      days_back: 30,
      cache_expiry_minutes: 30,
      page_size: 50,
      title: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub statistics_url: String,
  pub content_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      statistics_url: "https://statistics-api.wildberries.ru".to_string(),
      content_url: "https://content-api.wildberries.ru".to_string(),
    }
  }
}

impl Config {
  pub fn cache_expiry_ms(&self) -> i64 {
    self.cache_expiry_minutes * 60 * 1000
  }

  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./w9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/w9s/config.yaml
  ///
  /// Every field has a default, so a missing file yields a default
  /// config; an explicit path that does not exist is an error.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("w9s.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("w9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    if config.days_back <= 0 {
      return Err(eyre!("days_back must be positive"));
    }
    if config.cache_expiry_minutes <= 0 {
      return Err(eyre!("cache_expiry_minutes must be positive"));
    }
    if config.page_size == 0 {
      return Err(eyre!("page_size must be positive"));
    }

    Ok(config)
  }

  /// Get the Wildberries API token from environment variables.
  ///
  /// Checks W9S_WB_TOKEN first, then WB_API_TOKEN as fallback.
  pub fn api_token() -> Result<String> {
    std::env::var("W9S_WB_TOKEN")
      .or_else(|_| std::env::var("WB_API_TOKEN"))
      .map_err(|_| {
        eyre!("Wildberries API token not found. Set W9S_WB_TOKEN or WB_API_TOKEN environment variable.")
      })
  }
}
