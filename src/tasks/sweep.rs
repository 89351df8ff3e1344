//! Idle Sweep Task
//!
//! Background task that periodically removes entries that have been idle for
//! longer than the cache timeout.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::HttpCache;

/// Spawns a background task that periodically sweeps idle cache entries.
///
/// The task sleeps for the interval between runs. An interval of zero turns
/// the sweep off and the task finishes right away. A cache without a timeout
/// never has anything to remove, so the sweep is a no-op there.
///
/// # Arguments
/// * `cache` - Handle to the shared cache
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort it on shutdown.
///
/// # Example
/// ```ignore
/// let cache = HttpCache::from_config(executor, &config);
/// let sweep_handle = spawn_sweep_task(cache.clone(), config.sweep_interval);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: HttpCache, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        if interval.is_zero() {
            debug!("Idle sweep disabled");
            return;
        }
        info!(
            "Starting idle sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired();
            if removed > 0 {
                info!("Idle sweep: removed {} expired entries", removed);
            } else {
                debug!("Idle sweep: no expired entries found");
            }
        }
    })
}
