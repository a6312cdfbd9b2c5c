use color_eyre::{eyre::eyre, Result};
use serde_json::json;
use url::Url;

use super::api_types::{RawCardsResponse, CARDS_PAGE_SIZE};
use super::types::{Order, Product, ProductCursor, ProductPage, Sale};
use crate::config::Config;

/// Wildberries API client wrapper.
///
/// Covers the statistics endpoints (orders, sales) and the content
/// endpoint (product cards). Ordinary upstream failures surface as
/// errors from each call; callers decide whether to degrade.
#[derive(Clone)]
pub struct WbClient {
  http: reqwest::Client,
  statistics_url: Url,
  content_url: Url,
  token: String,
}

impl WbClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::api_token()?;

    let statistics_url = Url::parse(&config.api.statistics_url)
      .map_err(|e| eyre!("Invalid statistics URL {}: {}", config.api.statistics_url, e))?;
    let content_url = Url::parse(&config.api.content_url)
      .map_err(|e| eyre!("Invalid content URL {}: {}", config.api.content_url, e))?;

    Ok(Self {
      http: reqwest::Client::new(),
      statistics_url,
      content_url,
      token,
    })
  }

  /// Fetch orders changed since `date_from` (ISO 8601).
  pub async fn orders(&self, date_from: &str) -> Result<Vec<Order>> {
    self.statistics("api/v1/supplier/orders", date_from).await
  }

  /// Fetch sales changed since `date_from` (ISO 8601).
  pub async fn sales(&self, date_from: &str) -> Result<Vec<Sale>> {
    self.statistics("api/v1/supplier/sales", date_from).await
  }

  async fn statistics<T: serde::de::DeserializeOwned>(
    &self,
    path: &str,
    date_from: &str,
  ) -> Result<Vec<T>> {
    if date_from.is_empty() {
      return Err(eyre!("Parameter dateFrom is required"));
    }

    let mut url = self
      .statistics_url
      .join(path)
      .map_err(|e| eyre!("Failed to build URL for {}: {}", path, e))?;
    url.query_pairs_mut().append_pair("dateFrom", date_from);

    let response = self
      .http
      .get(url)
      .header("Authorization", &self.token)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch {}: {}", path, e))?;

    if !response.status().is_success() {
      return Err(eyre!("API responded with status {}", response.status()));
    }

    response
      .json::<Vec<T>>()
      .await
      .map_err(|e| eyre!("Invalid {} response format: {}", path, e))
  }

  /// Fetch one page of product cards.
  ///
  /// `cursor` continues a previous page; `text_search` narrows server-side.
  /// The returned cursor is present only when the page was full.
  pub async fn products(
    &self,
    cursor: Option<&ProductCursor>,
    text_search: &str,
  ) -> Result<ProductPage> {
    let mut cursor_body = json!({ "limit": CARDS_PAGE_SIZE });
    if let Some(c) = cursor {
      cursor_body["updatedAt"] = json!(c.updated_at);
      cursor_body["nmID"] = json!(c.nm_id);
    }

    let mut filter = json!({ "withPhoto": -1 });
    if !text_search.is_empty() {
      filter["textSearch"] = json!(text_search);
    }

    let body = json!({
      "settings": {
        "filter": filter,
        "cursor": cursor_body,
      }
    });

    let raw = self.cards_request(body).await?;

    Ok(ProductPage {
      items: raw.cards.into_iter().map(|c| c.into_product()).collect(),
      cursor: raw.cursor.and_then(|c| c.into_continuation()),
    })
  }

  /// Fetch a single product card by its nmID, for freshness polling.
  ///
  /// Returns `None` when the product no longer exists.
  pub async fn product_by_id(&self, nm_id: i64) -> Result<Option<Product>> {
    let body = json!({
      "settings": {
        "filter": { "nmID": nm_id, "withPhoto": -1 },
        "cursor": { "limit": 1 },
      }
    });

    let raw = self.cards_request(body).await?;

    Ok(raw.cards.into_iter().next().map(|c| c.into_product()))
  }

  async fn cards_request(&self, body: serde_json::Value) -> Result<RawCardsResponse> {
    let url = self
      .content_url
      .join("content/v2/get/cards/list")
      .map_err(|e| eyre!("Failed to build cards URL: {}", e))?;

    let response = self
      .http
      .post(url)
      .header("Authorization", &self.token)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch products: {}", e))?;

    if !response.status().is_success() {
      return Err(eyre!("API responded with status {}", response.status()));
    }

    response
      .json::<RawCardsResponse>()
      .await
      .map_err(|e| eyre!("Invalid cards response format: {}", e))
  }
}
