//! Scroll geometry for infinite-scroll triggering.

/// How close to the bottom (in scroll units) counts as "near bottom".
pub const NEAR_BOTTOM_THRESHOLD: u32 = 100;

/// Scroll container geometry, in whatever unit the view scrolls by
/// (rows for the TUI).
#[derive(Debug, Clone, Copy)]
pub struct ScrollMetrics {
  /// Offset of the first visible unit.
  pub scroll_top: u32,
  /// Total content size.
  pub scroll_height: u32,
  /// Visible viewport size.
  pub client_height: u32,
}

impl ScrollMetrics {
  /// Remaining content below the viewport is under the threshold.
  pub fn near_bottom(&self) -> bool {
    self
      .scroll_height
      .saturating_sub(self.scroll_top + self.client_height)
      < NEAR_BOTTOM_THRESHOLD
  }
}
