//! Cache Maintenance Task
//!
//! Background task that periodically sweeps expired in-process entries and
//! probes a disconnected networked backend so the store can resume using it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns the maintenance loop.
///
/// Every `interval_secs` the task restores the backend connection if it dropped,
/// then purges expired entries. The returned handle is aborted on shutdown.
pub fn spawn_maintenance_task(store: Arc<CacheStore>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache maintenance task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            if !store.probe().await {
                debug!("Cache maintenance: backend still unavailable");
                continue;
            }

            let removed = store.purge_expired().await;
            if removed > 0 {
                info!("Cache maintenance: removed {} expired entries", removed);
            } else {
                debug!("Cache maintenance: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> Arc<CacheStore> {
        Arc::new(CacheStore::in_memory(100, Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn test_maintenance_purges_expired_entries() {
        let store = store();
        store.set("expire_soon", &json!("value"), Some(1)).await;

        let handle = spawn_maintenance_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let status = store.status().await;
        assert_eq!(status.entries, Some(0), "Expired entry should have been swept");
        assert_eq!(status.stats.expired_purged, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_maintenance_preserves_valid_entries() {
        let store = store();
        store.set("long_lived", &json!("value"), Some(3600)).await;

        let handle = spawn_maintenance_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.get("long_lived").await, Some(json!("value")));
        handle.abort();
    }

    #[tokio::test]
    async fn test_maintenance_task_can_be_aborted() {
        let handle = spawn_maintenance_task(store(), 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
