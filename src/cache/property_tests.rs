//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check accounting, overwrite, namespacing and
//! invalidation properties over random operation sequences.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::block_on;

use crate::cache::{CacheService, Category, CategoryRegistry, KeyPattern, Lookup, MemoryStore};

// == Helpers ==
fn new_cache() -> (CacheService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (
        CacheService::in_memory(CategoryRegistry::builtin(), store.clone()),
        store,
    )
}

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit, no wildcards)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,32}"
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,64}".prop_map(|s| json!(s)),
        ("[a-z]{1,8}", any::<bool>()).prop_map(|(name, flag)| json!({ "name": name, "flag": flag })),
    ]
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

/// A sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Value },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Small key space so gets and deletes regularly hit existing keys.
    let key = "[a-d]{1,2}";
    prop_oneof![
        (key, value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Hit, miss, set and delete counters match the operations performed, and
    // the hit rate is hits / (hits + misses).
    #[test]
    fn prop_statistics_accuracy(
        category in category_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..40)
    ) {
        let (cache, _) = new_cache();
        let (mut hits, mut misses, mut sets, mut deletes) = (0u64, 0u64, 0u64, 0u64);

        block_on(async {
            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(&key, value, category, None).await.unwrap();
                        sets += 1;
                    }
                    CacheOp::Get { key } => match cache.get(&key, category).await.unwrap() {
                        Lookup::Hit(_) => hits += 1,
                        _ => misses += 1,
                    },
                    CacheOp::Delete { key } => {
                        cache.delete(&key, category).await.unwrap();
                        deletes += 1;
                    }
                }
            }
        });

        let report = block_on(cache.stats()).unwrap();
        let stats = report.hit_rates.get(category.as_str()).cloned().unwrap_or_default();
        prop_assert_eq!(stats.hits, hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, misses, "Misses mismatch");
        prop_assert_eq!(stats.sets, sets, "Sets mismatch");
        prop_assert_eq!(stats.deletes, deletes, "Deletes mismatch");
        let expected_rate = if hits + misses == 0 { 0.0 } else { hits as f64 / (hits + misses) as f64 };
        prop_assert!((stats.hit_rate - expected_rate).abs() < 1e-9);
    }

    // Storing V1 then V2 under one key makes get return V2 and keeps one row.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        category in category_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let (cache, store) = new_cache();

        let lookup = block_on(async {
            cache.set(&key, value1, category, None).await.unwrap();
            cache.set(&key, value2.clone(), category, None).await.unwrap();
            cache.get(&key, category).await.unwrap()
        });

        prop_assert_eq!(lookup, Lookup::Hit(value2));
        prop_assert_eq!(block_on(store.len()), 1);
    }

    // The same caller key under two categories never collides.
    #[test]
    fn prop_namespace_isolation(
        key in valid_key_strategy(),
        a in category_strategy(),
        b in category_strategy(),
    ) {
        prop_assume!(a != b);
        let (cache, _) = new_cache();

        let (got_a, got_b) = block_on(async {
            cache.set(&key, json!("a"), a, None).await.unwrap();
            cache.set(&key, json!("b"), b, None).await.unwrap();
            (cache.get(&key, a).await.unwrap(), cache.get(&key, b).await.unwrap())
        });

        prop_assert_eq!(got_a, Lookup::Hit(json!("a")));
        prop_assert_eq!(got_b, Lookup::Hit(json!("b")));
    }

    // Clearing one category removes exactly that category's keys.
    #[test]
    fn prop_clear_is_category_scoped(
        keys in prop::collection::hash_set(valid_key_strategy(), 1..20),
        cleared in category_strategy(),
        other in category_strategy(),
    ) {
        prop_assume!(cleared != other);
        let (cache, store) = new_cache();

        let removed = block_on(async {
            for key in &keys {
                cache.set(key, json!(1), cleared, None).await.unwrap();
                cache.set(key, json!(2), other, None).await.unwrap();
            }
            cache.clear_category(cleared).await.unwrap()
        });

        prop_assert_eq!(removed, keys.len() as u64);
        prop_assert_eq!(block_on(store.len()), keys.len());
        for key in &keys {
            prop_assert!(block_on(cache.get(key, other)).unwrap().is_hit());
        }
    }

    // A trailing-star pattern behaves exactly like a prefix test.
    #[test]
    fn prop_trailing_star_is_prefix(prefix in "[a-z:]{0,6}", key in "[a-z:]{0,10}") {
        let pattern = KeyPattern::new(format!("{}*", prefix));
        prop_assert_eq!(pattern.matches(&key), key.starts_with(&prefix));
    }

    // Pattern invalidation removes the matching keys of the category and
    // nothing else.
    #[test]
    fn prop_invalidate_removes_only_matches(
        keys in prop::collection::hash_set("[a-c]{1,4}", 1..20),
        prefix in "[a-c]{1,2}",
    ) {
        let (cache, _) = new_cache();
        let pattern = format!("{}*", prefix);

        block_on(async {
            for key in &keys {
                cache.set(key, json!(key), Category::Search, None).await.unwrap();
            }
            cache.invalidate_pattern(Category::Search, &pattern).await.unwrap();
        });

        for key in &keys {
            let lookup = block_on(cache.get(key, Category::Search)).unwrap();
            prop_assert_eq!(lookup.is_hit(), !key.starts_with(&prefix), "key {}", key);
        }
    }
}
