//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the read-through, invalidation and TTL contracts
//! over generated keys and values.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cacheable, KeyValueStore, MemoryStore, ReadThroughCache, TtlPolicy};

// == Test Fixtures ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CartItem {
    product_id: i64,
    quantity: u32,
    subtotal: f64,
}

impl Cacheable for CartItem {}

fn fresh_cache() -> (ReadThroughCache, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (ReadThroughCache::new(store.clone(), TtlPolicy::reference()), store)
}

// == Strategies ==
/// Generates keys of the form `<entity>:<qualifier>`
fn key_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", "[a-z0-9]{1,12}").prop_map(|(entity, rest)| format!("{}:{}", entity, rest))
}

/// Non-empty text: an empty stored string reads as absent
fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 :{}\"]{1,64}"
}

/// Any finite float, subnormals and extreme exponents included
fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |f| f.is_finite())
}

fn cart_item_strategy() -> impl Strategy<Value = CartItem> {
    (any::<i64>(), any::<u32>(), finite_f64()).prop_map(|(product_id, quantity, subtotal)| {
        CartItem {
            product_id,
            quantity,
            subtotal,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Writing a value and reading it back returns it without the loader
    #[test]
    fn prop_set_then_get_skips_loader(key in key_strategy(), items in prop::collection::vec(cart_item_strategy(), 0..8)) {
        let (cache, _) = fresh_cache();
        let calls = &AtomicUsize::new(0);

        let loaded: Option<Vec<CartItem>> = tokio_test::block_on(async {
            cache.set_cache(&key, &items).await;
            cache
                .get_or_load(&key, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(None)
                })
                .await
        })
        .unwrap();

        prop_assert_eq!(loaded, Some(items));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prop_scalar_text_roundtrip(key in key_strategy(), text in text_strategy()) {
        let (cache, store) = fresh_cache();

        let loaded: Option<String> = tokio_test::block_on(async {
            cache.set_cache(&key, &text).await;
            cache.get_or_load(&key, || async { Ok::<_, ()>(None) }).await
        })
        .unwrap();

        prop_assert_eq!(loaded.as_deref(), Some(text.as_str()));
        // Plain text on the wire, no JSON quoting
        let raw = tokio_test::block_on(store.get(&key)).unwrap();
        prop_assert_eq!(raw, Some(text));
    }

    #[test]
    fn prop_map_roundtrip(key in key_strategy(), totals in prop::collection::btree_map(any::<i64>(), any::<u32>(), 0..8)) {
        let (cache, _) = fresh_cache();

        let loaded: Option<BTreeMap<i64, u32>> = tokio_test::block_on(async {
            cache.set_cache(&key, &totals).await;
            cache.get_or_load(&key, || async { Ok::<_, ()>(None) }).await
        })
        .unwrap();

        prop_assert_eq!(loaded, Some(totals));
    }

    // Floats inside records and lists come back bit-for-bit
    #[test]
    fn prop_record_floats_roundtrip(key in key_strategy(), prices in prop::collection::vec(finite_f64(), 1..16)) {
        let (cache, _) = fresh_cache();

        let loaded: Option<Vec<f64>> = tokio_test::block_on(async {
            cache.set_cache(&key, &prices).await;
            cache.get_or_load(&key, || async { Ok::<_, ()>(None) }).await
        })
        .unwrap();

        prop_assert_eq!(loaded, Some(prices));
    }

    // A cold key runs the loader exactly once; the next read is a hit
    #[test]
    fn prop_miss_loads_once(key in key_strategy(), count in any::<i64>()) {
        let (cache, _) = fresh_cache();
        let calls = &AtomicUsize::new(0);

        for _ in 0..3 {
            let loaded: Option<i64> = tokio_test::block_on(cache.get_or_load(&key, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(Some(count))
            }))
            .unwrap();
            prop_assert_eq!(loaded, Some(count));
        }

        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // Pattern invalidation removes exactly the keys of one entity type
    #[test]
    fn prop_pattern_invalidation_is_precise(keys in prop::collection::hash_set(key_strategy(), 1..20)) {
        let (cache, store) = fresh_cache();
        let target = keys.iter().next().map(|k| k.split(':').next().unwrap_or("").to_string()).unwrap_or_default();

        let remaining: HashSet<String> = tokio_test::block_on(async {
            for key in &keys {
                store.set_ex(key, "1", Duration::from_secs(60)).await.unwrap();
            }
            cache.invalidate_pattern(&format!("{}:*", target)).await;
            store.keys("*").await.unwrap().into_iter().collect()
        });

        let expected: HashSet<String> = keys
            .iter()
            .filter(|k| !k.starts_with(&format!("{}:", target)))
            .cloned()
            .collect();
        prop_assert_eq!(remaining, expected);
    }

    // TTL comes from the first segment only
    #[test]
    fn prop_ttl_uses_entity_prefix(rest in "[a-z0-9:]{0,20}") {
        let policy = TtlPolicy::reference();
        prop_assert_eq!(policy.resolve(&format!("cart:{}", rest)), Duration::from_secs(300));
        prop_assert_eq!(policy.resolve(&format!("order:{}", rest)), Duration::from_secs(600));
        prop_assert_eq!(policy.resolve(&format!("zzz:{}", rest)), Duration::from_secs(3600));
    }
}
