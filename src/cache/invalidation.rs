//! Invalidation Module
//!
//! Write-path collaborators call these after their authoritative write
//! commits. All operations are idempotent; removing nothing is success.

use tracing::{debug, error, info};

use crate::cache::{MetricEvent, ReadThroughCache};
use crate::error::StoreResult;

// == Invalidation Plan ==
/// Exact keys and glob patterns to drop after one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub keys: Vec<String>,
    pub patterns: Vec<String>,
}

impl Invalidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.patterns.is_empty()
    }
}

impl ReadThroughCache {
    // == Invalidate ==
    /// Deletes one exact key. Store failures are logged and absorbed.
    ///
    /// # Arguments
    /// * `key` - Exact key to drop; a missing key is not an error
    pub async fn invalidate(&self, key: &str) {
        match self.store().delete(key).await {
            Ok(existed) => {
                debug!(key, existed, "Invalidated key");
                self.record(MetricEvent::Invalidated {
                    keys: vec![key.to_string()],
                    removed: u64::from(existed),
                });
            }
            Err(err) => {
                error!(key, op = err.op(), error = %err, "Failed to invalidate key");
            }
        }
    }

    // == Invalidate Pattern ==
    /// Deletes every key matching `pattern`. Store failures are logged and absorbed.
    ///
    /// # Arguments
    /// * `pattern` - Redis `KEYS` glob, e.g. `products:search:*`
    ///
    /// # Returns
    /// How many keys were removed; 0 when nothing matched or the store failed.
    pub async fn invalidate_pattern(&self, pattern: &str) -> u64 {
        match self.try_invalidate_pattern(pattern).await {
            Ok(removed) => removed,
            Err(err) => {
                error!(pattern, op = err.op(), error = %err, "Failed to invalidate pattern");
                0
            }
        }
    }

    /// Pattern invalidation with the store error surfaced.
    pub async fn try_invalidate_pattern(&self, pattern: &str) -> StoreResult<u64> {
        let keys = self.store().keys(pattern).await?;
        if keys.is_empty() {
            debug!(pattern, "No keys matched pattern");
            return Ok(0);
        }

        let removed = self.store().delete_many(&keys).await?;
        info!(pattern, removed, "Invalidated keys with pattern");
        // Keys that expired between KEYS and DEL are forgotten but not counted
        self.record(MetricEvent::Invalidated { keys, removed });
        Ok(removed)
    }

    // == Apply ==
    /// Runs a plan: exact keys first, then patterns.
    pub async fn apply(&self, plan: &Invalidation) {
        if plan.is_empty() {
            return;
        }
        for key in &plan.keys {
            self.invalidate(key).await;
        }
        for pattern in &plan.patterns {
            self.invalidate_pattern(pattern).await;
        }
    }
}
