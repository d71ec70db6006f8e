//! Memory Store Module
//!
//! In-process `KeyValueStore` backed by a HashMap with per-entry expiry.
//! Expired entries are dropped lazily on access and by the cleanup task.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use glob::Pattern;
use tokio::sync::RwLock;
use tracing::warn;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, KeyValueStore};
use crate::error::StoreResult;

// == Memory Store ==
/// Single-node store for tests and deployments without Redis.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Rewrites Redis `KEYS` glob syntax into the `glob` crate's dialect.
///
/// `[^..]` becomes `[!..]`, runs of `*` collapse to one, and a backslash
/// escape becomes a single-character class (`\*` -> `[*]`).
fn redis_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('*' | '?' | '[')) if !in_class => {
                    out.push('[');
                    out.push(escaped);
                    out.push(']');
                }
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            },
            '*' if !in_class => {
                out.push('*');
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('!');
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            other => out.push(other),
        }
    }

    out
}

/// Builds a matcher for a Redis key glob. A malformed glob matches only itself.
fn key_matcher(pattern: &str) -> impl Fn(&str) -> bool + '_ {
    let compiled = match Pattern::new(&redis_glob(pattern)) {
        Ok(compiled) => Some(compiled),
        Err(err) => {
            warn!(pattern, error = %err, "Malformed key pattern, matching literally");
            None
        }
    };

    move |key: &str| match &compiled {
        Some(glob) => glob.matches(key),
        None => key == pattern,
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    // == Get ==
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let expired = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write().await;
            // Re-check under the write lock; a concurrent set may have refreshed it
            if entries.get(key).is_some_and(CacheEntry::is_expired) {
                entries.remove(key);
            }
        }

        Ok(None)
    }

    // == Set ==
    /// Overwrites any existing entry and resets its expiry.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let entry = CacheEntry::new(value.to_string(), ttl);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    // == Delete ==
    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|entry| !entry.is_expired()))
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<u64> {
        let now = current_timestamp_ms();
        let mut entries = self.entries.write().await;
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| !entry.is_expired_at(now))
            .count();
        Ok(removed as u64)
    }

    // == Keys ==
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let matches = key_matcher(pattern);
        let now = current_timestamp_ms();
        let entries = self.entries.read().await;

        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && matches(key.as_str()))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    async fn seeded(keys: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for key in keys {
            store.set_ex(key, "v", HOUR).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();

        store.set_ex("key1", "value1", HOUR).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Some("value1".to_string()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryStore::new();

        store.set_ex("key1", "value1", HOUR).await.unwrap();
        store.set_ex("key1", "value2", HOUR).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Some("value2".to_string()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = seeded(&["key1"]).await;

        assert!(store.delete("key1").await.unwrap());
        assert!(!store.delete("key1").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let store = MemoryStore::new();
        store.set_ex("key1", "value1", Duration::from_millis(50)).await.unwrap();

        assert!(store.get("key1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(store.get("key1").await.unwrap().is_none());
        // Lazy expiry removes the entry on access
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = MemoryStore::new();
        store.set_ex("short", "v", Duration::from_millis(50)).await.unwrap();
        store.set_ex("long", "v", HOUR).await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_keys_glob() {
        let store = seeded(&["product:1", "product:2", "category:1", "products:all"]).await;

        assert_eq!(store.keys("product:*").await.unwrap(), vec!["product:1", "product:2"]);
        assert_eq!(store.keys("product?:*").await.unwrap(), vec!["products:all"]);
        assert_eq!(store.keys("*:1").await.unwrap(), vec!["category:1", "product:1"]);
        assert_eq!(store.keys("product:[2-9]").await.unwrap(), vec!["product:2"]);
        assert_eq!(store.keys("*").await.unwrap().len(), 4);
        assert!(store.keys("order:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_skip_expired() {
        let store = seeded(&["product:1"]).await;
        store.set_ex("product:2", "v", Duration::from_millis(20)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.keys("product:*").await.unwrap(), vec!["product:1"]);
    }

    #[tokio::test]
    async fn test_malformed_pattern_matches_literally() {
        let store = seeded(&["weird:[", "weird:a"]).await;
        assert_eq!(store.keys("weird:[").await.unwrap(), vec!["weird:["]);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let store = seeded(&["a", "b", "c"]).await;
        let removed = store
            .delete_many(&["a".to_string(), "c".to_string(), "missing".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.keys("*").await.unwrap(), vec!["b"]);
    }

    #[test]
    fn test_redis_glob_translation() {
        assert_eq!(redis_glob("product:[^2]"), "product:[!2]");
        assert_eq!(redis_glob("products:**"), "products:*");
        assert_eq!(redis_glob("cart\\*"), "cart[*]");
        assert_eq!(redis_glob("a\\:b"), "a:b");
    }

    #[tokio::test]
    async fn test_keys_follow_redis_glob_rules() {
        let store = seeded(&["product:1", "product:2", "products:all", "cart*", "cart:1"]).await;

        assert_eq!(store.keys("product:[^2]").await.unwrap(), vec!["product:1"]);
        assert_eq!(store.keys("products:**").await.unwrap(), vec!["products:all"]);
        assert_eq!(store.keys("cart\\*").await.unwrap(), vec!["cart*"]);
    }
}
