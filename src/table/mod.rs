//! The generic data-loading controller shared by every table view.

pub mod data;
pub mod debounce;
pub mod filter;
pub mod scroll;

pub use data::{Phase, TableData, TableOptions};
pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use scroll::ScrollMetrics;
