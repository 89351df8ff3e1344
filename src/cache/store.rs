//! Cache Store Module
//!
//! Main cache engine: fingerprint-keyed storage with memory accounting, the
//! size-bound sweep and the idle-timeout sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::eviction::{self, SizePlan};
use crate::cache::{normalize_budget, normalize_timeout, CacheEntry, CacheStats, Fingerprint};
use crate::models::HttpResponse;

// == Lookup ==
/// Result of looking up a fingerprint on the request path.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Entry within the timeout; its key clock has been bumped
    Fresh(Arc<HttpResponse>),
    /// Entry idle past the timeout; left untouched
    Stale(Arc<HttpResponse>),
    /// Nothing stored for the fingerprint
    Miss,
}

// == Cache Store ==
/// Response storage with a memory budget and an idle timeout.
#[derive(Debug)]
pub struct CacheStore {
    /// Fingerprint-keyed entries
    entries: HashMap<Fingerprint, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Sum of entry costs
    used_memory: usize,
    /// Memory budget in bytes, 0 = unbounded
    max_memory: usize,
    /// Idle timeout, zero = entries never go stale
    timeout: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given budget and timeout.
    ///
    /// # Arguments
    /// * `max_memory` - Memory budget in bytes, 0 disables the size sweep
    /// * `timeout` - Idle timeout, zero disables expiry
    pub fn new(max_memory: usize, timeout: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            used_memory: 0,
            max_memory: normalize_budget(max_memory),
            timeout: normalize_timeout(timeout),
        }
    }

    // == Insert ==
    /// Stores a response under a fingerprint, replacing any deep-equal key's entry.
    ///
    /// Does not run eviction; see [`CacheStore::store_response`].
    pub fn insert(&mut self, fingerprint: Fingerprint, response: Arc<HttpResponse>) -> Option<CacheEntry> {
        let entry = CacheEntry::new(&fingerprint, response);
        self.used_memory += entry.cost;

        let replaced = self.entries.insert(fingerprint, entry);
        if let Some(old) = &replaced {
            self.used_memory = self.used_memory.saturating_sub(old.cost);
        }
        replaced
    }

    // == Lookup ==
    /// Returns the entry stored for a structurally equal fingerprint.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<&CacheEntry> {
        self.entries.get(fingerprint)
    }

    /// Looks up a fingerprint for a request, classifying it as fresh, stale or missing.
    ///
    /// A fresh hit bumps the fingerprint's access time. Stale entries are left as they are.
    pub fn lookup_for_request(&mut self, fingerprint: &Fingerprint, now: Instant) -> Lookup {
        let timeout = self.timeout;
        match self.entries.get_mut(fingerprint) {
            None => {
                self.stats.record_miss();
                Lookup::Miss
            }
            Some(entry) if entry.is_stale(timeout, now) => {
                self.stats.record_stale_hit();
                Lookup::Stale(Arc::clone(&entry.response))
            }
            Some(entry) => {
                entry.touch(now);
                self.stats.record_hit();
                Lookup::Fresh(Arc::clone(&entry.response))
            }
        }
    }

    // == Remove ==
    /// Removes the entry stored for a fingerprint.
    pub fn remove(&mut self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let removed = self.entries.remove(fingerprint)?;
        self.used_memory = self.used_memory.saturating_sub(removed.cost);
        Some(removed)
    }

    // == Clear ==
    /// Removes every entry and returns the bytes freed.
    pub fn clear(&mut self) -> usize {
        let freed = self.used_memory;
        self.entries.clear();
        self.used_memory = 0;
        freed
    }

    // == Total Memory ==
    /// Sum of the estimated key and value sizes of all entries.
    pub fn total_memory(&self) -> usize {
        self.used_memory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Store Response ==
    /// Stores a refreshed response, evicting first so the budget holds afterwards.
    ///
    /// The entry being replaced is dropped before the size sweep so its bytes
    /// never force out an unrelated entry.
    pub fn store_response(&mut self, fingerprint: Fingerprint, response: Arc<HttpResponse>, now: Instant) {
        self.remove(&fingerprint);

        let incoming = fingerprint.estimated_size() + response.estimated_size();
        self.evict_to_fit(incoming, now);
        self.insert(fingerprint, response);
    }

    // == Size-Bound Sweep ==
    /// Evicts entries, largest first, until `incoming` more bytes fit the budget.
    ///
    /// Runs the idle sweep first when a timeout is configured. If `incoming`
    /// alone exceeds the budget the store is cleared. Returns the number of
    /// entries the size sweep removed.
    pub fn evict_to_fit(&mut self, incoming: usize, now: Instant) -> usize {
        if self.max_memory == 0 {
            return 0;
        }
        if !self.timeout.is_zero() {
            self.sweep_expired(now);
        }

        let candidates: Vec<(Fingerprint, usize)> = self
            .entries
            .iter()
            .map(|(fingerprint, entry)| (fingerprint.clone(), entry.cost))
            .collect();

        let removed = match eviction::select_by_size(&candidates, self.used_memory, self.max_memory, incoming) {
            SizePlan::Keep => 0,
            SizePlan::Evict(victims) => {
                for fingerprint in &victims {
                    self.remove(fingerprint);
                }
                victims.len()
            }
            SizePlan::ClearAll => {
                let count = self.entries.len();
                self.clear();
                count
            }
        };

        if removed > 0 {
            self.stats.record_evictions(removed);
            debug!(
                "Size sweep: evicted {} entries, {} of {} bytes in use",
                removed, self.used_memory, self.max_memory
            );
        }
        removed
    }

    // == Idle Sweep ==
    /// Removes every entry idle for longer than the timeout.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        if self.timeout.is_zero() {
            return 0;
        }

        let candidates: Vec<(Fingerprint, Instant)> = self
            .entries
            .iter()
            .map(|(fingerprint, entry)| (fingerprint.clone(), entry.effective_access()))
            .collect();

        let expired = eviction::select_expired(candidates, now, self.timeout);
        for fingerprint in &expired {
            self.remove(fingerprint);
        }

        if !expired.is_empty() {
            self.stats.record_expirations(expired.len());
            debug!("Idle sweep: expired {} entries", expired.len());
        }
        expired.len()
    }

    // == Budget & Timeout ==
    pub fn max_memory(&self) -> usize {
        self.max_memory
    }

    /// Changes the memory budget and immediately sweeps down to it.
    pub fn set_max_memory(&mut self, max_memory: usize, now: Instant) {
        self.max_memory = normalize_budget(max_memory);
        self.evict_to_fit(0, now);
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = normalize_timeout(timeout);
    }

    // == Stats ==
    pub fn record_refresh_failure(&mut self) {
        self.stats.record_refresh_failure();
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_usage(self.entries.len(), self.used_memory);
        stats
    }
}
