//! Per-entity table rendering.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Row, Table};

use crate::table::TableData;
use crate::wb::types::{Order, PivotItem, Product, Sale};

/// Shared frame for all table views: bordered block, header row, and the
/// visible slice of displayed rows.
fn render_table<'a>(
  frame: &mut Frame,
  area: Rect,
  title: String,
  headers: &[&'static str],
  widths: &[Constraint],
  rows: Vec<Row<'a>>,
) {
  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let header = Row::new(
    headers
      .iter()
      .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow))),
  );

  let table = Table::new(rows, widths).header(header).block(block);

  frame.render_widget(table, area);
}

fn view_title<T>(name: &str, table: &TableData<T>) -> String {
  if table.last_updated().is_empty() {
    format!(" {} ", name)
  } else {
    format!(" {} [updated {}] ", name, table.last_updated())
  }
}

/// Rows visible in the viewport, starting at the scroll offset.
fn visible<'a, T>(table: &'a TableData<T>, scroll: usize, area: Rect) -> &'a [T] {
  let items = table.displayed_items();
  let start = scroll.min(items.len());
  let height = area.height.saturating_sub(3) as usize; // borders + header
  let end = (start + height).min(items.len());
  &items[start..end]
}

fn money(value: f64) -> String {
  format!("{:.2}", value)
}

pub fn draw_orders(frame: &mut Frame, area: Rect, table: &TableData<Order>, scroll: usize) {
  let rows = visible(table, scroll, area)
    .iter()
    .map(|o| {
      Row::new(vec![
        Cell::from(o.date.clone()),
        Cell::from(o.warehouse_name.clone()),
        Cell::from(o.region_name.clone()),
        Cell::from(o.supplier_article.clone()),
        Cell::from(o.nm_id.to_string()),
        Cell::from(o.subject.clone()),
        Cell::from(o.brand.clone()),
        Cell::from(money(o.total_price)),
        Cell::from(format!("{}%", o.discount_percent)),
        Cell::from(money(o.price_with_disc)),
        Cell::from(if o.is_cancel { "yes" } else { "no" }),
      ])
    })
    .collect();

  render_table(
    frame,
    area,
    view_title("Orders", table),
    &[
      "Date", "Warehouse", "Region", "Article", "nmID", "Subject", "Brand", "Price", "Disc",
      "Final", "Cancel",
    ],
    &[
      Constraint::Length(19),
      Constraint::Length(14),
      Constraint::Length(14),
      Constraint::Length(12),
      Constraint::Length(10),
      Constraint::Min(10),
      Constraint::Length(12),
      Constraint::Length(10),
      Constraint::Length(6),
      Constraint::Length(10),
      Constraint::Length(6),
    ],
    rows,
  );
}

pub fn draw_sales(frame: &mut Frame, area: Rect, table: &TableData<Sale>, scroll: usize) {
  let rows = visible(table, scroll, area)
    .iter()
    .map(|s| {
      Row::new(vec![
        Cell::from(s.date.clone()),
        Cell::from(s.warehouse_name.clone()),
        Cell::from(s.region_name.clone()),
        Cell::from(s.supplier_article.clone()),
        Cell::from(s.nm_id.to_string()),
        Cell::from(s.subject.clone()),
        Cell::from(s.brand.clone()),
        Cell::from(money(s.for_pay)),
        Cell::from(money(s.finished_price)),
      ])
    })
    .collect();

  render_table(
    frame,
    area,
    view_title("Sales", table),
    &[
      "Date", "Warehouse", "Region", "Article", "nmID", "Subject", "Brand", "For pay", "Final",
    ],
    &[
      Constraint::Length(19),
      Constraint::Length(14),
      Constraint::Length(14),
      Constraint::Length(12),
      Constraint::Length(10),
      Constraint::Min(10),
      Constraint::Length(12),
      Constraint::Length(10),
      Constraint::Length(10),
    ],
    rows,
  );
}

pub fn draw_products(frame: &mut Frame, area: Rect, table: &TableData<Product>, scroll: usize) {
  let rows = visible(table, scroll, area)
    .iter()
    .map(|p| {
      Row::new(vec![
        Cell::from(p.nm_id.to_string()),
        Cell::from(p.vendor_code.clone()),
        Cell::from(p.brand.clone()),
        Cell::from(p.title.clone()),
        Cell::from(p.subject_name.clone()),
        Cell::from(p.updated_at.clone()),
      ])
    })
    .collect();

  render_table(
    frame,
    area,
    view_title("Products", table),
    &["nmID", "Vendor code", "Brand", "Title", "Subject", "Updated"],
    &[
      Constraint::Length(10),
      Constraint::Length(14),
      Constraint::Length(14),
      Constraint::Min(20),
      Constraint::Length(16),
      Constraint::Length(20),
    ],
    rows,
  );
}

pub fn draw_pivot(frame: &mut Frame, area: Rect, table: &TableData<PivotItem>, scroll: usize) {
  let rows = visible(table, scroll, area)
    .iter()
    .map(|p| {
      Row::new(vec![
        Cell::from(p.nm_id.to_string()),
        Cell::from(p.barcode.clone()),
        Cell::from(p.subject.clone()),
        Cell::from(money(p.for_pay)),
        Cell::from(p.total_sales.to_string()),
        Cell::from(money(p.total_revenue)),
      ])
    })
    .collect();

  render_table(
    frame,
    area,
    view_title("Revenue pivot", table),
    &["nmID", "Barcode", "Subject", "For pay", "Sales", "Revenue"],
    &[
      Constraint::Length(10),
      Constraint::Length(16),
      Constraint::Min(14),
      Constraint::Length(12),
      Constraint::Length(8),
      Constraint::Length(12),
    ],
    rows,
  );
}
