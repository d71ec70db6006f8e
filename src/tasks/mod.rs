//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: Removes expired in-process entries at configured intervals
//! - Metrics: Applies hit/miss bookkeeping off the read path

mod cleanup;
mod metrics;

pub use cleanup::spawn_cleanup_task;
pub use metrics::spawn_metrics_task;
