//! Eviction Planning Module
//!
//! Decides which entries a sweep removes. The functions here only rank
//! candidates; the store applies the result.
//!
//! Size sweeps evict the largest entries first, regardless of recency.

use std::time::Duration;

use tokio::time::Instant;

// == Size Plan ==
/// Outcome of planning a size-bound sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizePlan<K> {
    /// Everything already fits
    Keep,
    /// Remove these keys, in order
    Evict(Vec<K>),
    /// The incoming entry cannot fit even in an empty store
    ClearAll,
}

// == Select By Size ==
/// Plans a size-bound sweep.
///
/// # Arguments
/// * `candidates` - Every stored key with its combined key and value cost
/// * `total` - Current total cost of the store
/// * `budget` - Memory budget in bytes
/// * `incoming` - Cost of the entry about to be inserted, 0 for none
pub fn select_by_size<K: Clone>(
    candidates: &[(K, usize)],
    total: usize,
    budget: usize,
    incoming: usize,
) -> SizePlan<K> {
    if incoming > budget {
        return SizePlan::ClearAll;
    }

    let target = budget - incoming;
    if total <= target {
        return SizePlan::Keep;
    }

    // Stable sort, so equal sizes keep their candidate order
    let mut ranked: Vec<&(K, usize)> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut remaining = total;
    let mut victims = Vec::new();
    for (key, cost) in ranked {
        if remaining <= target {
            break;
        }
        victims.push(key.clone());
        remaining = remaining.saturating_sub(*cost);
    }

    SizePlan::Evict(victims)
}

// == Select Expired ==
/// Returns the keys idle for longer than `timeout`, oldest first.
///
/// Candidates are sorted by effective access time and the scan stops at the
/// first entry that is still fresh. A zero timeout selects nothing.
pub fn select_expired<K>(mut candidates: Vec<(K, Instant)>, now: Instant, timeout: Duration) -> Vec<K> {
    if timeout.is_zero() {
        return Vec::new();
    }

    candidates.sort_by_key(|(_, accessed)| *accessed);
    candidates
        .into_iter()
        .take_while(|(_, accessed)| now.saturating_duration_since(*accessed) > timeout)
        .map(|(key, _)| key)
        .collect()
}
