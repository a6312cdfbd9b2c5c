//! Table status line: the only user-facing signal about data state.
//!
//! Deliberately distinguishes just four situations (loading, no results
//! for the query, no data at all, showing N of M); failures degrade to
//! last-known data and are reported in logs only.

/// Row counts backing the status line.
#[derive(Debug, Clone, Copy)]
pub struct StatusCounts {
  pub filtered: usize,
  pub displayed: usize,
  pub total: usize,
}

/// Render the status line text for a table view.
pub fn status_line(is_loading: bool, has_more: bool, counts: StatusCounts, query: &str) -> String {
  if is_loading {
    return "Loading...".to_string();
  }

  if counts.filtered == 0 && counts.total > 0 {
    return format!("No results for \"{}\"", query);
  }

  if counts.total == 0 {
    return "No data to display".to_string();
  }

  let mut line = format!("Showing {} of {} records", counts.displayed, counts.filtered);
  if counts.filtered != counts.total {
    line.push_str(&format!(" (total: {})", counts.total));
  }
  if has_more {
    line.push_str(", scroll for more");
  }
  line
}

#[cfg(test)]
mod tests {
  use super::*;

  fn counts(filtered: usize, displayed: usize, total: usize) -> StatusCounts {
    StatusCounts {
      filtered,
      displayed,
      total,
    }
  }

  #[test]
  fn test_loading_takes_priority() {
    assert_eq!(status_line(true, false, counts(0, 0, 0), ""), "Loading...");
  }

  #[test]
  fn test_no_results_for_query() {
    assert_eq!(
      status_line(false, false, counts(0, 0, 100), "acme"),
      "No results for \"acme\""
    );
  }

  #[test]
  fn test_no_data_at_all() {
    assert_eq!(status_line(false, false, counts(0, 0, 0), ""), "No data to display");
  }

  #[test]
  fn test_showing_all() {
    assert_eq!(
      status_line(false, false, counts(50, 50, 50), ""),
      "Showing 50 of 50 records"
    );
  }

  #[test]
  fn test_filtered_subset_mentions_total() {
    assert_eq!(
      status_line(false, false, counts(3, 3, 100), "acme"),
      "Showing 3 of 3 records (total: 100)"
    );
  }

  #[test]
  fn test_more_to_scroll() {
    assert_eq!(
      status_line(false, true, counts(200, 50, 200), ""),
      "Showing 50 of 200 records, scroll for more"
    );
  }
}
