//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry without a network call
    pub hits: u64,
    /// Lookups that found an entry idle past the timeout
    pub stale_hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries removed to stay within the memory budget
    pub evictions: u64,
    /// Entries removed by the idle-timeout sweep
    pub expirations: u64,
    /// Refreshes that failed and left the store unchanged
    pub refresh_failures: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current estimated memory of all entries, in bytes
    pub used_memory: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the fresh hit rate.
    ///
    /// Returns hits / (hits + stale_hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.stale_hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_stale_hit(&mut self) {
        self.stale_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_refresh_failure(&mut self) {
        self.refresh_failures += 1;
    }

    // == Update Gauges ==
    /// Updates the entry count and memory gauges.
    pub fn set_usage(&mut self, total_entries: usize, used_memory: usize) {
        self.total_entries = total_entries;
        self.used_memory = used_memory;
    }
}
