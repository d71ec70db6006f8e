//! Metrics Task
//!
//! Drains `MetricEvent`s sent by the engine and folds them into the shared
//! `CacheStats`. Nothing on the read path waits for this task.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStats, MetricEvent};

/// Spawns the consumer for `events`. It exits once every sender is dropped.
pub fn spawn_metrics_task(
    mut events: mpsc::Receiver<MetricEvent>,
    stats: Arc<RwLock<CacheStats>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting cache metrics task");

        while let Some(event) = events.recv().await {
            let mut guard = stats.write().await;
            guard.apply(event);
            // Fold whatever else is already queued under the same lock
            while let Ok(event) = events.try_recv() {
                guard.apply(event);
            }
        }

        debug!("Cache metrics task finished");
    })
}
