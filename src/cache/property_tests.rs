//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store and key behavior over generated inputs.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{CacheKey, CacheStore, KeyPattern, MemoryCacheStore};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates cache keys without wildcards
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:.-]{1,64}"
}

/// Generates serialized values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 \"{}:,]{1,256}"
}

/// Generates key suffixes that never contain a colon
fn suffix_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,16}"
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing a value and reading it back before expiry returns the same value.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let store = MemoryCacheStore::new();

        let retrieved = runtime().block_on(async {
            store.set(&key, value.clone(), TEST_TTL).await;
            store.get(&key).await
        });

        prop_assert_eq!(retrieved, Some(value), "Round-trip value mismatch");
    }

    // Pattern removal drops every key under the namespace and nothing else.
    #[test]
    fn prop_pattern_removal_is_exact(
        inside in prop::collection::hash_set(suffix_strategy(), 1..20),
        outside in prop::collection::hash_set(suffix_strategy(), 1..20)
    ) {
        let store = MemoryCacheStore::new();

        runtime().block_on(async {
            for suffix in &inside {
                store.set(&format!("ns:{}", suffix), "1".to_string(), TEST_TTL).await;
            }
            for suffix in &outside {
                store.set(&format!("other:{}", suffix), "2".to_string(), TEST_TTL).await;
            }

            store.remove_by_pattern("ns:*").await;
        });

        let rt = runtime();
        for suffix in &inside {
            let key = format!("ns:{}", suffix);
            prop_assert_eq!(rt.block_on(store.get(&key)), None, "{} should be removed", key);
            prop_assert!(!store.is_tracked(&key));
        }
        for suffix in &outside {
            let key = format!("other:{}", suffix);
            prop_assert!(rt.block_on(store.get(&key)).is_some(), "{} should remain", key);
        }
        prop_assert_eq!(store.tracked_keys(), outside.len());
    }

    // After any sequence of sets and removes, the registry tracks exactly the live keys.
    #[test]
    fn prop_registry_tracks_live_keys(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let store = MemoryCacheStore::new();
        let mut expected: HashSet<String> = HashSet::new();

        runtime().block_on(async {
            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        store.set(&key, value, TEST_TTL).await;
                        expected.insert(key);
                    }
                    CacheOp::Remove { key } => {
                        store.remove(&key).await;
                        expected.remove(&key);
                    }
                }
            }
        });

        prop_assert_eq!(store.len(), expected.len());
        prop_assert_eq!(store.tracked_keys(), expected.len());
        for key in &expected {
            prop_assert!(store.is_tracked(key));
        }
    }

    // Identical operation arguments always give the same key.
    #[test]
    fn prop_cache_key_deterministic(
        operation in "[a-z-]{1,16}",
        id in ".{0,32}",
        page in 1u32..1000
    ) {
        let first = CacheKey::new("qutora", "categories", &operation, &(&id, page)).unwrap();
        let second = CacheKey::new("qutora", "categories", &operation, &(&id, page)).unwrap();
        prop_assert_eq!(first, second);
    }

    // A key always matches the pattern formed by its own text.
    #[test]
    fn prop_key_matches_itself(key in valid_key_strategy()) {
        let pattern = KeyPattern::new(&key).unwrap();
        prop_assert!(pattern.matches(&key));
        prop_assert!(pattern.matches(&key.to_uppercase()));
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Once the TTL elapses the entry is gone and no longer matched by patterns.
    #[test]
    fn prop_ttl_expiration_behavior(
        suffix in suffix_strategy(),
        value in valid_value_strategy()
    ) {
        let store = MemoryCacheStore::new();
        let key = format!("ns:{}", suffix);

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let (before, after) = rt.block_on(async {
            store.set(&key, value.clone(), Duration::from_secs(1)).await;
            let before = store.get(&key).await;
            tokio::time::advance(Duration::from_millis(1100)).await;
            store.evict_expired();
            (before, store.get(&key).await)
        });

        prop_assert_eq!(before, Some(value), "Entry should exist before TTL expires");
        prop_assert_eq!(after, None, "Entry should not be found after TTL expires");
        prop_assert!(!store.is_tracked(&key));
    }
}
