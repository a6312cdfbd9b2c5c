mod status;
mod views;

use crate::app::{App, Mode, ViewState};
use crate::table::TableData;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Table status line
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  draw_header(frame, chunks[0], app);

  let table_status = match app.view() {
    ViewState::Orders(table) => {
      views::draw_orders(frame, chunks[1], table, app.scroll());
      table_status_line(table)
    }
    ViewState::Sales(table) => {
      views::draw_sales(frame, chunks[1], table, app.scroll());
      table_status_line(table)
    }
    ViewState::Products { table, .. } => {
      views::draw_products(frame, chunks[1], table, app.scroll());
      table_status_line(table)
    }
    ViewState::Pivot(table) => {
      views::draw_pivot(frame, chunks[1], table, app.scroll());
      table_status_line(table)
    }
  };

  frame.render_widget(
    Paragraph::new(table_status).style(Style::default().fg(Color::Gray)),
    chunks[2],
  );

  draw_status_bar(frame, chunks[3], app);
}

fn table_status_line<T>(table: &TableData<T>) -> String {
  status::status_line(
    table.is_loading(),
    table.has_more(),
    status::StatusCounts {
      filtered: table.filtered_items().len(),
      displayed: table.displayed_items().len(),
      total: table.all_items().len(),
    },
    table.search_query(),
  )
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
  let header = Paragraph::new(format!(" {}", app.title()))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
  frame.render_widget(header, area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  match app.mode() {
    Mode::Normal => {
      let hint = " :command  /search  j/k:scroll  r:refresh  Ctrl-C:quit";
      frame.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        area,
      );
    }
    Mode::Command => {
      let mut spans = vec![Span::styled(
        format!(":{}", app.command_input()),
        Style::default().fg(Color::Yellow),
      )];
      for (i, cmd) in app.autocomplete_suggestions().iter().enumerate() {
        spans.push(Span::raw("  "));
        let style = if i == app.selected_suggestion() {
          Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
          Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(cmd.name, style));
      }
      frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
    Mode::Search => {
      let query = match app.view() {
        ViewState::Orders(table) => table.search_query(),
        ViewState::Sales(table) => table.search_query(),
        ViewState::Products { table, .. } => table.search_query(),
        ViewState::Pivot(table) => table.search_query(),
      };
      frame.render_widget(
        Paragraph::new(format!("/{}", query)).style(Style::default().fg(Color::Cyan)),
        area,
      );
    }
  }
}
