//! Store Client Module
//!
//! The key/value contract every cache backend satisfies:
//! `GET`, `SET .. EX`, `DEL`, and `KEYS <glob>`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreResult;

// == Key Value Store ==
/// Shared, stateless-per-call client over a key/value store.
///
/// Implementations report every failure as a `StoreError`; they never panic
/// on backend faults and must be safe to use from many tasks at once.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Deletes one key. Returns whether it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Deletes every key in `keys` in one batch. Returns how many existed.
    async fn delete_many(&self, keys: &[String]) -> StoreResult<u64>;

    /// Enumerates keys matching a Redis `KEYS` glob.
    ///
    /// # Arguments
    /// * `pattern` - `*`, `?`, `[abc]`, `[a-z]`, `[^a]` and `\` escapes
    ///
    /// # Returns
    /// The matching keys. Order is backend-specific.
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
