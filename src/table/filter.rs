//! Full-text filtering over table rows.

use serde::Serialize;
use serde_json::Value;

/// Default filter: case-insensitive substring match of the query against
/// the string form of every scalar field, OR semantics.
///
/// Numbers and booleans match their raw text ("true", "1234"); nulls and
/// nested values never match. Views that need different scoping supply
/// their own filter.
pub fn matches_any_field<T: Serialize>(item: &T, lower_query: &str) -> bool {
  let value = match serde_json::to_value(item) {
    Ok(value) => value,
    Err(_) => return false,
  };

  let Value::Object(fields) = value else {
    return scalar_text(&value)
      .map(|text| text.to_lowercase().contains(lower_query))
      .unwrap_or(false);
  };

  fields.values().any(|field| {
    scalar_text(field)
      .map(|text| text.to_lowercase().contains(lower_query))
      .unwrap_or(false)
  })
}

fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}
