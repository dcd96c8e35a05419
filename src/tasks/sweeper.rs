//! Eviction Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Anything holding entries that can expire.
pub trait ExpirySweep: Send + Sync + 'static {
    /// Removes expired entries, returning how many were dropped.
    fn evict_expired(&self) -> usize;
}

/// Spawns a background task that periodically evicts expired entries.
///
/// The task holds only a weak handle to the target and exits on the first
/// tick after the target has been dropped.
///
/// # Arguments
/// * `target` - Weak handle to the store being swept
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task.
///
/// # Example
/// ```ignore
/// let state = Arc::new(MemoryState::default());
/// let handle = spawn_eviction_sweeper(Arc::downgrade(&state), Duration::from_secs(60));
/// // Later:
/// handle.abort();
/// ```
pub fn spawn_eviction_sweeper<T: ExpirySweep>(
    target: Weak<T>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(
            interval_ms = interval.as_millis() as u64,
            "Starting cache eviction sweeper"
        );

        loop {
            tokio::time::sleep(interval).await;

            let Some(store) = target.upgrade() else {
                debug!("Cache dropped, eviction sweeper exiting");
                break;
            };

            let removed = store.evict_expired();
            drop(store);

            if removed > 0 {
                info!(removed = removed, "Cache sweep: evicted expired entries");
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}
