//! Concurrent fan-out across source adapters.

pub mod fetch;

pub use fetch::{fetch_listings, FetchOutcome};
