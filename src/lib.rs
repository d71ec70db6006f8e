//! Marketplace Cache - fail-open read-through caching for the marketplace backend
//!
//! Typed values are cached in a key/value store (in-process or Redis) with
//! per-entity TTLs. Store faults never reach callers: reads fall back to the
//! loader and writes are dropped.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{Cacheable, Invalidation, KeyValueStore, ReadThroughCache, TtlPolicy};
pub use config::{Config, StoreBackend};
pub use tasks::{spawn_cleanup_task, spawn_metrics_task};
