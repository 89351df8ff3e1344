//! Cache Entry Module
//!
//! Defines the stored response together with the access clock of the
//! fingerprint that produced it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::Fingerprint;
use crate::models::HttpResponse;

// == Cache Entry ==
/// A stored response and the last time its fingerprint was hit.
///
/// Map keys cannot be mutated in place, so the fingerprint's last-access time
/// is kept here, next to the key.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached response, shared with every caller that received it
    pub response: Arc<HttpResponse>,
    /// Last time the fingerprint was looked up successfully
    pub key_accessed_at: Instant,
    /// Approximate bytes of key plus value
    pub cost: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry whose key clock starts at the fingerprint's creation.
    pub fn new(fingerprint: &Fingerprint, response: Arc<HttpResponse>) -> Self {
        let cost = fingerprint.estimated_size() + response.estimated_size();
        Self {
            response,
            key_accessed_at: fingerprint.created_at(),
            cost,
        }
    }

    // == Touch ==
    /// Records a cache hit on the fingerprint.
    pub fn touch(&mut self, now: Instant) {
        self.key_accessed_at = now;
    }

    // == Effective Access ==
    /// The more recent of the fingerprint's and the response's access times.
    pub fn effective_access(&self) -> Instant {
        self.key_accessed_at.max(self.response.last_accessed())
    }

    /// Time elapsed since the effective access.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.effective_access())
    }

    // == Is Stale ==
    /// Checks whether the entry has been idle longer than `timeout`.
    ///
    /// A zero timeout disables expiry, so nothing is ever stale.
    pub fn is_stale(&self, timeout: Duration, now: Instant) -> bool {
        !timeout.is_zero() && self.idle_for(now) > timeout
    }
}
