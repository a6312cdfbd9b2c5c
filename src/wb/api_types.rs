//! Raw payload shapes for the content API and their conversions into
//! domain types.

use serde::Deserialize;

use super::types::{Product, ProductCursor};

/// Server-side page size for the cards list endpoint.
pub const CARDS_PAGE_SIZE: i64 = 100;

/// Raw response of the cards list endpoint.
#[derive(Debug, Deserialize)]
pub struct RawCardsResponse {
  pub cards: Vec<RawCard>,
  pub cursor: Option<RawCursor>,
}

/// A single raw product card. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct RawCard {
  #[serde(rename = "nmID")]
  pub nm_id: i64,
  #[serde(rename = "imtID", default)]
  pub imt_id: i64,
  #[serde(rename = "nmUUID", default)]
  pub nm_uuid: String,
  #[serde(rename = "subjectID", default)]
  pub subject_id: i64,
  #[serde(rename = "subjectName", default)]
  pub subject_name: String,
  #[serde(rename = "vendorCode", default)]
  pub vendor_code: String,
  #[serde(default)]
  pub brand: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub photos: Vec<RawPhoto>,
  #[serde(rename = "createdAt", default)]
  pub created_at: String,
  #[serde(rename = "updatedAt", default)]
  pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RawPhoto {
  #[serde(rename = "c246x328", default)]
  pub c246x328: String,
}

#[derive(Debug, Deserialize)]
pub struct RawCursor {
  #[serde(rename = "updatedAt", default)]
  pub updated_at: String,
  #[serde(rename = "nmID", default)]
  pub nm_id: i64,
  #[serde(default)]
  pub total: i64,
}

impl RawCard {
  /// Normalize a raw card into a `Product`, extracting the first photo URL.
  pub fn into_product(self) -> Product {
    let photo = self
      .photos
      .into_iter()
      .next()
      .map(|p| p.c246x328)
      .unwrap_or_default();

    Product {
      nm_id: self.nm_id,
      imt_id: self.imt_id,
      nm_uuid: self.nm_uuid,
      subject_id: self.subject_id,
      subject_name: self.subject_name,
      vendor_code: self.vendor_code,
      brand: self.brand,
      title: self.title,
      photo,
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }
}

impl RawCursor {
  /// Convert into a continuation cursor.
  ///
  /// The server returns a cursor block on every response; it only means
  /// "more pages may exist" when the page was full, so anything below a
  /// full page is treated as end-of-data.
  pub fn into_continuation(self) -> Option<ProductCursor> {
    if self.total >= CARDS_PAGE_SIZE {
      Some(ProductCursor {
        updated_at: self.updated_at,
        nm_id: self.nm_id,
        total: self.total,
      })
    } else {
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw_card_json(nm_id: i64) -> String {
    format!(
      r#"{{
        "nmID": {nm_id},
        "imtID": 555,
        "nmUUID": "0190-aaaa",
        "subjectID": 1724,
        "subjectName": "Кроссовки",
        "vendorCode": "SNK-01",
        "brand": "Acme",
        "title": "Acme runner",
        "photos": [{{"c246x328": "https://img.example/1.webp"}}],
        "createdAt": "2024-01-10T10:00:00Z",
        "updatedAt": "2024-05-01T09:30:00Z",
        "video": "ignored-extra-field"
      }}"#
    )
  }

  #[test]
  fn test_card_normalization() {
    let card: RawCard = serde_json::from_str(&raw_card_json(112233)).unwrap();
    let product = card.into_product();

    assert_eq!(product.nm_id, 112233);
    assert_eq!(product.photo, "https://img.example/1.webp");
    assert_eq!(product.brand, "Acme");
    assert_eq!(product.updated_at, "2024-05-01T09:30:00Z");
  }

  #[test]
  fn test_card_without_photos_gets_empty_photo() {
    let card: RawCard =
      serde_json::from_str(r#"{"nmID": 1, "photos": []}"#).unwrap();
    assert_eq!(card.into_product().photo, "");
  }

  #[test]
  fn test_full_page_cursor_is_forwarded() {
    let cursor = RawCursor {
      updated_at: "2024-05-01T09:30:00Z".to_string(),
      nm_id: 42,
      total: 100,
    };
    let cont = cursor.into_continuation().unwrap();
    assert_eq!(cont.nm_id, 42);
    assert_eq!(cont.updated_at, "2024-05-01T09:30:00Z");
  }

  #[test]
  fn test_short_page_cursor_signals_end() {
    let cursor = RawCursor {
      updated_at: "2024-05-01T09:30:00Z".to_string(),
      nm_id: 42,
      total: 40,
    };
    assert!(cursor.into_continuation().is_none());
  }

  #[test]
  fn test_response_without_cards_is_rejected() {
    let result: Result<RawCardsResponse, _> =
      serde_json::from_str(r#"{"cursor": {"total": 0}}"#);
    assert!(result.is_err());
  }
}
