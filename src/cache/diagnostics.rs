//! Diagnostics Module
//!
//! Operator-facing views over the store: health probe, key enumeration,
//! raw inspection and bulk clear.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::cache::ReadThroughCache;
use crate::error::{StoreError, StoreResult};

/// Prefix of the round-trip key written by `is_available`.
pub const PROBE_KEY_PREFIX: &str = "health:probe:";

const PROBE_TTL: Duration = Duration::from_secs(10);

// == Status Report ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub available: bool,
    pub total_keys: u64,
    pub keys: BTreeSet<String>,
}

// == Diagnostics ==
#[derive(Clone)]
pub struct Diagnostics {
    cache: ReadThroughCache,
}

impl Diagnostics {
    pub fn new(cache: ReadThroughCache) -> Self {
        Self { cache }
    }

    // == Is Available ==
    /// Writes, reads back and deletes a probe key. Any store error, or a
    /// value that does not round-trip, means unavailable.
    pub async fn is_available(&self) -> bool {
        match self.probe().await {
            Ok(true) => true,
            Ok(false) => {
                warn!("Cache probe read back a different value");
                false
            }
            Err(err) => {
                warn!(op = err.op(), error = %err, "Cache probe failed");
                false
            }
        }
    }

    async fn probe(&self) -> StoreResult<bool> {
        let store = self.cache.store();
        let stamp = Utc::now().to_rfc3339();
        let key = format!("{}{}", PROBE_KEY_PREFIX, stamp);

        store.set_ex(&key, &stamp, PROBE_TTL).await?;
        let read_back = store.get(&key).await;
        store.delete(&key).await?;
        Ok(read_back?.as_deref() == Some(stamp.as_str()))
    }

    // == Count Keys ==
    /// Number of keys in the store; 0 when enumeration fails.
    pub async fn count_keys(&self) -> u64 {
        match self.cache.store().keys("*").await {
            Ok(keys) => keys.len() as u64,
            Err(err) => {
                warn!(op = err.op(), error = %err, "Failed to count keys");
                0
            }
        }
    }

    // == List Keys ==
    pub async fn list_keys(&self) -> StoreResult<BTreeSet<String>> {
        let keys = self.cache.store().keys("*").await?;
        Ok(keys.into_iter().collect())
    }

    // == Peek ==
    /// Raw stored text for `key`, without decoding.
    pub async fn peek(&self, key: &str) -> StoreResult<Option<String>> {
        self.cache.store().get(key).await
    }

    // == Clear All ==
    /// Drops every key.
    ///
    /// # Returns
    /// How many keys were removed, or the store error.
    pub async fn clear_all(&self) -> StoreResult<u64> {
        let removed = self.cache.try_invalidate_pattern("*").await?;
        info!(removed, "Cache cleared");
        Ok(removed)
    }

    // == Status ==
    /// Availability plus the current key set. Keys are empty when the
    /// store cannot enumerate them.
    pub async fn status(&self) -> StatusReport {
        let available = self.is_available().await;
        let keys = self.list_keys().await.unwrap_or_else(|err: StoreError| {
            warn!(op = err.op(), error = %err, "Failed to list keys");
            BTreeSet::new()
        });

        StatusReport {
            available,
            total_keys: keys.len() as u64,
            keys,
        }
    }
}
