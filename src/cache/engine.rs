//! Read-Through Engine Module
//!
//! `get_or_load` answers from the store when it can and from the caller's
//! loader otherwise. Store and codec faults never reach the caller; loader
//! errors always do.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::cache::codec::{self, Cacheable};
use crate::cache::{KeyValueStore, MetricEvent, MetricsRecorder, TtlPolicy};

// == Read Through Cache ==
/// Cloneable handle over a shared store, TTL table and metrics sender.
///
/// Concurrent misses on the same key are not coalesced: each caller runs
/// its own loader and the last write wins.
#[derive(Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Arc<TtlPolicy>,
    metrics: Option<MetricsRecorder>,
}

impl ReadThroughCache {
    // == Constructor ==
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: TtlPolicy) -> Self {
        Self {
            store,
            ttl: Arc::new(ttl),
            metrics: None,
        }
    }

    /// Sends hit/miss/write events to `recorder`.
    pub fn with_metrics(mut self, recorder: MetricsRecorder) -> Self {
        self.metrics = Some(recorder);
        self
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    pub(crate) fn record(&self, event: MetricEvent) {
        if let Some(metrics) = &self.metrics {
            metrics.record(event);
        }
    }

    // == Get Or Load ==
    /// Returns the cached value for `key`, or runs `loader` and caches a
    /// `Some` result under the key's entity-type TTL.
    ///
    /// `Ok(None)` from the loader is returned as-is and never stored, so
    /// lookups of missing entities reach the loader every time.
    ///
    /// # Arguments
    /// * `key` - Cache key; its first segment selects the TTL
    /// * `loader` - Fetches the authoritative value on a miss
    ///
    /// # Returns
    /// The cached or loaded value, or the loader's own error unchanged.
    pub async fn get_or_load<T, F, Fut, E>(&self, key: &str, loader: F) -> Result<Option<T>, E>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) if !raw.is_empty() => match codec::decode::<T>(&raw) {
                Ok(value) => {
                    debug!(key, "Cache hit");
                    self.record(MetricEvent::Hit {
                        key: key.to_string(),
                        at: Utc::now(),
                    });
                    return Ok(Some(value));
                }
                Err(err) => {
                    warn!(key, error = %err, "Discarding cached value, reloading");
                }
            },
            Ok(_) => {}
            Err(err) => {
                error!(key, op = err.op(), error = %err, "Cache read failed, loading without cache");
                self.record(MetricEvent::Fallback {
                    key: key.to_string(),
                    op: err.op(),
                });
                return loader().await;
            }
        }

        debug!(key, "Cache miss");
        self.record(MetricEvent::Miss {
            key: key.to_string(),
            at: Utc::now(),
        });

        let loaded = loader().await?;
        if let Some(value) = &loaded {
            self.set_cache(key, value).await;
        }
        Ok(loaded)
    }

    // == Set Cache ==
    /// Encodes and writes `value` under `key`. Failures are logged only.
    ///
    /// # Arguments
    /// * `key` - Cache key; its first segment selects the TTL
    /// * `value` - Value to encode
    ///
    /// # Returns
    /// `true` if the write reached the store.
    pub async fn set_cache<T: Cacheable>(&self, key: &str, value: &T) -> bool {
        let encoded = match codec::encode(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(key, op = "SET", error = %err, "Failed to encode value for cache");
                return false;
            }
        };

        let ttl = self.ttl.resolve(key);
        match self.store.set_ex(key, &encoded, ttl).await {
            Ok(()) => {
                debug!(key, ttl_secs = ttl.as_secs(), "Cached value");
                self.record(MetricEvent::Written {
                    key: key.to_string(),
                    at: Utc::now(),
                });
                true
            }
            Err(err) => {
                error!(key, op = err.op(), error = %err, "Failed to write cache entry");
                false
            }
        }
    }
}
