//! Client Module
//!
//! The caching HTTP client, its network seam and the stale-while-revalidate race.

mod executor;
mod http_cache;
mod revalidate;

pub use executor::{NetworkExecutor, ReqwestExecutor};
pub use http_cache::HttpCache;
pub use revalidate::{race_stale_notification, StaleGate, NEGLIGIBLE_DELAY};
