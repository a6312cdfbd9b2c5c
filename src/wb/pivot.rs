//! Revenue pivot derived by joining orders and sales on nmID.

use std::cmp::Ordering;
use std::collections::HashMap;

use color_eyre::{eyre::eyre, Result};

use super::client::WbClient;
use super::types::{Order, PivotItem, Sale};

/// Fetch orders and sales concurrently and join them into pivot rows.
///
/// A failure on either side fails the whole pivot with both messages
/// combined, so a partial join is never shown as a complete one.
pub async fn fetch_pivot(client: &WbClient, date_from: &str) -> Result<Vec<PivotItem>> {
  let (orders, sales) = tokio::join!(client.orders(date_from), client.sales(date_from));

  match (orders, sales) {
    (Ok(orders), Ok(sales)) => Ok(build_pivot(&orders, &sales)),
    (orders, sales) => {
      let mut parts = Vec::new();
      if let Err(e) = orders {
        parts.push(format!("Orders: {}", e));
      }
      if let Err(e) = sales {
        parts.push(format!("Sales: {}", e));
      }
      Err(eyre!(parts.join("; ")))
    }
  }
}

/// Join orders and sales keyed by nmID.
///
/// Rows are seeded from orders with zeroed aggregates. Each sale then
/// overwrites `for_pay`, counts one sale, and accumulates revenue on the
/// matching row, inserting a new one when the nmID only appears in sales.
/// Result is sorted by total revenue descending, stable by insertion on
/// equal revenue.
pub fn build_pivot(orders: &[Order], sales: &[Sale]) -> Vec<PivotItem> {
  let mut rows: Vec<PivotItem> = Vec::new();
  let mut index: HashMap<i64, usize> = HashMap::new();

  for order in orders {
    if index.contains_key(&order.nm_id) {
      continue;
    }
    index.insert(order.nm_id, rows.len());
    rows.push(PivotItem {
      nm_id: order.nm_id,
      barcode: order.barcode.clone(),
      subject: order.subject.clone(),
      sticker: order.sticker.clone(),
      for_pay: 0.0,
      total_sales: 0,
      total_revenue: 0.0,
    });
  }

  for sale in sales {
    let amount = sale.for_pay;

    match index.get(&sale.nm_id) {
      Some(&i) => {
        let row = &mut rows[i];
        row.for_pay = amount;
        row.total_sales += 1;
        row.total_revenue += amount;
      }
      None => {
        index.insert(sale.nm_id, rows.len());
        rows.push(PivotItem {
          nm_id: sale.nm_id,
          barcode: sale.barcode.clone(),
          subject: sale.subject.clone(),
          sticker: sale.sticker.clone(),
          for_pay: amount,
          total_sales: 1,
          total_revenue: amount,
        });
      }
    }
  }

  rows.sort_by(|a, b| {
    b.total_revenue
      .partial_cmp(&a.total_revenue)
      .unwrap_or(Ordering::Equal)
  });

  rows
}

#[cfg(test)]
mod tests {
  use super::*;

  fn order(nm_id: i64, barcode: &str) -> Order {
    Order {
      date: "2024-05-01T10:00:00".to_string(),
      last_change_date: String::new(),
      warehouse_name: String::new(),
      country_name: String::new(),
      region_name: String::new(),
      supplier_article: String::new(),
      nm_id,
      barcode: barcode.to_string(),
      subject: "Subject".to_string(),
      brand: String::new(),
      income_id: 0,
      total_price: 0.0,
      discount_percent: 0.0,
      spp: 0.0,
      finished_price: 0.0,
      price_with_disc: 0.0,
      is_cancel: false,
      cancel_date: String::new(),
      sticker: String::new(),
      g_number: String::new(),
      srid: String::new(),
    }
  }

  fn sale(nm_id: i64, for_pay: f64) -> Sale {
    Sale {
      date: "2024-05-02T10:00:00".to_string(),
      last_change_date: String::new(),
      warehouse_name: String::new(),
      country_name: String::new(),
      region_name: String::new(),
      supplier_article: String::new(),
      nm_id,
      barcode: "bc".to_string(),
      subject: "Subject".to_string(),
      brand: String::new(),
      income_id: 0,
      total_price: 0.0,
      discount_percent: 0.0,
      spp: 0.0,
      payment_sale_amount: 0.0,
      for_pay,
      finished_price: 0.0,
      price_with_disc: 0.0,
      sale_id: 1,
      sticker: String::new(),
      g_number: String::new(),
      srid: String::new(),
    }
  }

  #[test]
  fn test_order_without_sales_has_zero_aggregates() {
    let rows = build_pivot(&[order(1, "a")], &[]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_sales, 0);
    assert_eq!(rows[0].total_revenue, 0.0);
  }

  #[test]
  fn test_sales_accumulate_revenue_and_overwrite_for_pay() {
    let rows = build_pivot(&[order(1, "a")], &[sale(1, 100.0), sale(1, 50.0)]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_sales, 2);
    assert_eq!(rows[0].total_revenue, 150.0);
    // for_pay reflects the last sale, not the sum
    assert_eq!(rows[0].for_pay, 50.0);
  }

  #[test]
  fn test_sale_only_nm_id_is_inserted() {
    let rows = build_pivot(&[order(1, "a")], &[sale(2, 70.0)]);
    assert_eq!(rows.len(), 2);
    let inserted = rows.iter().find(|r| r.nm_id == 2).unwrap();
    assert_eq!(inserted.total_sales, 1);
    assert_eq!(inserted.total_revenue, 70.0);
  }

  #[test]
  fn test_sorted_by_revenue_descending() {
    let rows = build_pivot(
      &[order(1, "a"), order(2, "b"), order(3, "c")],
      &[sale(2, 300.0), sale(3, 500.0), sale(1, 100.0)],
    );
    let ids: Vec<i64> = rows.iter().map(|r| r.nm_id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
  }

  #[test]
  fn test_equal_revenue_is_stable_by_insertion() {
    let rows = build_pivot(&[order(5, "a"), order(6, "b")], &[]);
    let ids: Vec<i64> = rows.iter().map(|r| r.nm_id).collect();
    assert_eq!(ids, vec![5, 6]);
  }

  #[test]
  fn test_duplicate_orders_seed_one_row() {
    let rows = build_pivot(&[order(1, "a"), order(1, "a")], &[sale(1, 10.0)]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_sales, 1);
  }
}
