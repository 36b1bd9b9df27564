//! TTL Sweep Task
//!
//! Background task that periodically removes expired entries from the local
//! store, independent of request traffic.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::LocalStore;

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The returned handle is the shutdown hook: abort it to stop the sweep.
///
/// # Example
/// ```ignore
/// let store = Arc::new(LocalStore::new());
/// let sweep = spawn_cleanup_task(store.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<LocalStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Starting local cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired().await;

            if removed > 0 {
                info!("Local cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Local cache sweep: no expired entries found");
            }
        }
    })
}
