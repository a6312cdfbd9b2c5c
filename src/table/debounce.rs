//! Cancellable timer that coalesces bursts of input into one value.

use std::time::{Duration, Instant};

/// Quiet period before a search query takes effect.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Arms a deadline on every input; only the last value within a quiet
/// window is released. Polled from the event-loop tick.
#[derive(Debug)]
pub struct Debouncer {
  delay: Duration,
  pending: Option<(String, Instant)>,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  /// Arm (or re-arm) the timer with a new value. A pending value is
  /// replaced and its deadline restarted.
  pub fn arm(&mut self, value: String, now: Instant) {
    self.pending = Some((value, now + self.delay));
  }

  /// Release the pending value if its quiet period has elapsed.
  pub fn poll(&mut self, now: Instant) -> Option<String> {
    match &self.pending {
      Some((_, deadline)) if now >= *deadline => {
        self.pending.take().map(|(value, _)| value)
      }
      _ => None,
    }
  }

  /// Drop any pending value without releasing it.
  pub fn cancel(&mut self) {
    self.pending = None;
  }
}
