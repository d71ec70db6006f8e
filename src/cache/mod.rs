//! Cache Module
//!
//! Read-through caching over a pluggable key/value store, with per-entity
//! TTLs, pattern invalidation and fail-open degradation.

pub mod codec;
mod diagnostics;
mod engine;
mod entry;
mod invalidation;
mod memory;
mod redis_store;
mod stats;
mod store;
pub mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use codec::{Cacheable, MapKey, ScalarKind, Shape};
pub use diagnostics::{Diagnostics, StatusReport, PROBE_KEY_PREFIX};
pub use engine::ReadThroughCache;
pub use entry::CacheEntry;
pub use invalidation::Invalidation;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use stats::{CacheStats, KeyMetrics, MetricEvent, MetricsRecorder, DEFAULT_MAX_TRACKED_KEYS};
pub use store::KeyValueStore;
pub use ttl::{TtlPolicy, DEFAULT_TTL};
