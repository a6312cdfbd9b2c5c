//! Remote data source: typed records, the API client, and the pivot join.

pub mod api_types;
pub mod client;
pub mod pivot;
pub mod types;

pub use client::WbClient;
