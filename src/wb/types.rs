//! Domain types for the Wildberries seller API.

use serde::{Deserialize, Serialize};

/// A single order row from the statistics API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub date: String,
  pub last_change_date: String,
  pub warehouse_name: String,
  pub country_name: String,
  pub region_name: String,
  pub supplier_article: String,
  pub nm_id: i64,
  pub barcode: String,
  pub subject: String,
  pub brand: String,
  #[serde(rename = "incomeID")]
  pub income_id: i64,
  pub total_price: f64,
  pub discount_percent: f64,
  pub spp: f64,
  pub finished_price: f64,
  pub price_with_disc: f64,
  pub is_cancel: bool,
  pub cancel_date: String,
  pub sticker: String,
  pub g_number: String,
  pub srid: String,
}

/// A single sale row from the statistics API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
  pub date: String,
  pub last_change_date: String,
  pub warehouse_name: String,
  pub country_name: String,
  pub region_name: String,
  pub supplier_article: String,
  pub nm_id: i64,
  pub barcode: String,
  pub subject: String,
  pub brand: String,
  #[serde(rename = "incomeID")]
  pub income_id: i64,
  pub total_price: f64,
  pub discount_percent: f64,
  pub spp: f64,
  pub payment_sale_amount: f64,
  pub for_pay: f64,
  pub finished_price: f64,
  pub price_with_disc: f64,
  #[serde(rename = "saleID")]
  pub sale_id: i64,
  pub sticker: String,
  pub g_number: String,
  pub srid: String,
}

/// A product card from the content API, normalized from the raw payload.
///
/// `nm_id` is the stable identity used for in-place row updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  #[serde(rename = "nmID")]
  pub nm_id: i64,
  #[serde(rename = "imtID")]
  pub imt_id: i64,
  #[serde(rename = "nmUUID")]
  pub nm_uuid: String,
  #[serde(rename = "subjectID")]
  pub subject_id: i64,
  #[serde(rename = "subjectName")]
  pub subject_name: String,
  #[serde(rename = "vendorCode")]
  pub vendor_code: String,
  pub brand: String,
  pub title: String,
  /// First photo URL, empty when the card carries no usable photo.
  pub photo: String,
  #[serde(rename = "createdAt")]
  pub created_at: String,
  #[serde(rename = "updatedAt")]
  pub updated_at: String,
}

/// Continuation token for product pagination.
///
/// `updated_at` and `nm_id` are opaque fields echoed back verbatim on the
/// next call; absence of a cursor is the authoritative end-of-data signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCursor {
  #[serde(rename = "updatedAt")]
  pub updated_at: String,
  #[serde(rename = "nmID")]
  pub nm_id: i64,
  pub total: i64,
}

/// One page of products plus the cursor for the next page, if any.
#[derive(Debug, Clone)]
pub struct ProductPage {
  pub items: Vec<Product>,
  pub cursor: Option<ProductCursor>,
}

/// Revenue pivot row derived by joining orders and sales on `nm_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotItem {
  pub nm_id: i64,
  pub barcode: String,
  pub subject: String,
  pub sticker: String,
  pub for_pay: f64,
  pub total_sales: u64,
  pub total_revenue: f64,
}
