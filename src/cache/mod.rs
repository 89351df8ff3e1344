//! Cache Module
//!
//! Provides in-memory response storage keyed by request fingerprint, with a
//! memory budget and an idle timeout.

mod entry;
pub mod eviction;
mod fingerprint;
pub mod memory;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use entry::CacheEntry;
pub use fingerprint::{hash_json, Fingerprint};
pub use stats::CacheStats;
pub use store::{CacheStore, Lookup};

// == Public Constants ==
/// Smallest memory budget accepted; smaller positive budgets are raised to it
pub const MIN_CACHE_MEMORY: usize = 1024;

/// Smallest idle timeout accepted; shorter positive timeouts are raised to it
pub const MIN_TIMEOUT: Duration = Duration::from_millis(10);

// == Normalization ==
/// Normalizes a memory budget: 0 stays unbounded, tiny budgets are clamped up.
pub fn normalize_budget(max_memory: usize) -> usize {
    if max_memory == 0 {
        0
    } else {
        max_memory.max(MIN_CACHE_MEMORY)
    }
}

/// Normalizes an idle timeout: zero stays disabled, tiny timeouts are clamped up.
pub fn normalize_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        Duration::ZERO
    } else {
        timeout.max(MIN_TIMEOUT)
    }
}
