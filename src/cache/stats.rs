//! Cache Statistics Module
//!
//! Hit/miss bookkeeping fed by `MetricEvent`s. Events are sent without
//! blocking from the read path and applied by a background task.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::cache::ttl::{entity_id, entity_type};

// == Metric Event ==
/// One bookkeeping fact emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    Hit { key: String, at: DateTime<Utc> },
    Miss { key: String, at: DateTime<Utc> },
    Written { key: String, at: DateTime<Utc> },
    /// Keys dropped by one invalidation call; `removed` counts those that existed
    Invalidated { keys: Vec<String>, removed: u64 },
    /// A store fault was absorbed and the loader called directly
    Fallback { key: String, op: &'static str },
}

// == Metrics Recorder ==
/// Cloneable sending half handed to the engine.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    tx: mpsc::Sender<MetricEvent>,
}

impl MetricsRecorder {
    /// Creates a recorder and the receiver the metrics task consumes.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<MetricEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queues an event. Full or closed channels drop it.
    pub fn record(&self, event: MetricEvent) {
        let _ = self.tx.try_send(event);
    }
}

// == Key Metrics ==
/// Per-key counters and write history.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub hit_count: u64,
    pub miss_count: u64,
    pub last_accessed: Option<DateTime<Utc>>,
    /// Incremented on every write of this key
    pub version: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl KeyMetrics {
    fn for_key(key: &str) -> Self {
        Self {
            entity_type: entity_type(key).to_string(),
            entity_id: entity_id(key),
            ..Self::default()
        }
    }

    /// Latest read or write of the key.
    fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_accessed.max(self.last_modified)
    }
}

/// Per-key records kept before the least recently seen are evicted.
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Reads answered from the store
    pub hits: u64,
    /// Reads that invoked the loader
    pub misses: u64,
    /// Store faults absorbed on the read path
    pub fallbacks: u64,
    /// Successful store writes
    pub writes: u64,
    /// Keys removed through invalidation
    pub invalidations: u64,
    /// Per-key records evicted to stay under `max_keys`
    pub evicted_records: u64,
    pub keys: HashMap<String, KeyMetrics>,
    #[serde(skip)]
    max_keys: usize,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::with_key_limit(DEFAULT_MAX_TRACKED_KEYS)
    }

    /// Creates stats that track at most `max_keys` per-key records.
    ///
    /// # Arguments
    /// * `max_keys` - Record limit; values below 1 are raised to 1
    pub fn with_key_limit(max_keys: usize) -> Self {
        Self {
            hits: 0,
            misses: 0,
            fallbacks: 0,
            writes: 0,
            invalidations: 0,
            evicted_records: 0,
            keys: HashMap::new(),
            max_keys: max_keys.max(1),
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    fn entry(&mut self, key: String) -> &mut KeyMetrics {
        if !self.keys.contains_key(&key) && self.keys.len() >= self.max_keys {
            self.evict_least_recent();
        }
        self.keys
            .entry(key)
            .or_insert_with_key(|key| KeyMetrics::for_key(key))
    }

    /// Drops the least recently seen tenth of the records, at least one.
    fn evict_least_recent(&mut self) {
        let batch = (self.max_keys / 10).max(1);
        let mut by_age: Vec<(Option<DateTime<Utc>>, String)> = self
            .keys
            .iter()
            .map(|(key, metrics)| (metrics.last_seen(), key.clone()))
            .collect();
        by_age.sort_unstable();

        for (_, key) in by_age.into_iter().take(batch) {
            self.keys.remove(&key);
            self.evicted_records += 1;
        }
    }

    // == Apply ==
    /// Folds one event into the counters.
    pub fn apply(&mut self, event: MetricEvent) {
        match event {
            MetricEvent::Hit { key, at } => {
                self.hits += 1;
                let metrics = self.entry(key);
                metrics.hit_count += 1;
                metrics.last_accessed = Some(at);
            }
            MetricEvent::Miss { key, at } => {
                self.misses += 1;
                let metrics = self.entry(key);
                metrics.miss_count += 1;
                metrics.last_accessed = Some(at);
            }
            MetricEvent::Written { key, at } => {
                self.writes += 1;
                let metrics = self.entry(key);
                metrics.version += 1;
                metrics.last_modified = Some(at);
            }
            MetricEvent::Invalidated { keys, removed } => {
                self.invalidations += removed;
                for key in keys {
                    self.keys.remove(&key);
                }
            }
            MetricEvent::Fallback { .. } => {
                self.fallbacks += 1;
            }
        }
    }
}
