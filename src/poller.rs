//! Per-row freshness polling for the products view.
//!
//! Each visible product row is probed on its own schedule: a row is
//! re-checked once per interval while it stays on screen, and its timer
//! is dropped as soon as it scrolls away. Probe results come back through
//! the app event channel, so the poller only tracks deadlines and
//! in-flight probes.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// How often each visible product row is re-checked for updates.
pub const PRODUCT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub struct RowPoller {
  interval: Duration,
  deadlines: HashMap<i64, Instant>,
  in_flight: HashSet<i64>,
}

impl RowPoller {
  pub fn new(interval: Duration) -> Self {
    Self {
      interval,
      deadlines: HashMap::new(),
      in_flight: HashSet::new(),
    }
  }

  /// Advance the schedule for the currently visible rows.
  ///
  /// Rows seen for the first time are armed one interval out, rows no
  /// longer visible are forgotten, and rows whose deadline has passed
  /// are returned for probing (and re-armed). A row with a probe still
  /// in flight is never returned twice.
  pub fn due(&mut self, visible_ids: &[i64], now: Instant) -> Vec<i64> {
    let visible: HashSet<i64> = visible_ids.iter().copied().collect();
    self.deadlines.retain(|id, _| visible.contains(id));
    self.in_flight.retain(|id| visible.contains(id));

    let mut due = Vec::new();
    for &id in visible_ids {
      match self.deadlines.get(&id) {
        None => {
          self.deadlines.insert(id, now + self.interval);
        }
        Some(&deadline) if deadline <= now && !self.in_flight.contains(&id) => {
          due.push(id);
          self.in_flight.insert(id);
          self.deadlines.insert(id, now + self.interval);
        }
        Some(_) => {}
      }
    }
    due
  }

  /// Mark a probe for this row as finished so it can be scheduled again.
  pub fn completed(&mut self, nm_id: i64) {
    self.in_flight.remove(&nm_id);
  }
}
