//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key derivation and local store behavior over
//! generated inputs.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{derive_key, CacheStore, LocalStore};

const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
fn method_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just("GET"), Just("HEAD"), Just("POST")].prop_map(|s| s.to_string())
}

fn url_strategy() -> impl Strategy<Value = String> {
    "/(api/v1/)?(posts|pages|media|tags)(/[0-9]{1,4})?(\\?page=[0-9]{1,2})?".prop_map(|s| s)
}

fn user_agent_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9/. ]{0,40}".prop_map(|s| s)
}

fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..512)
}

fn headers_strategy() -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map("[a-z-]{1,20}", "[ -~]{0,40}", 0..5)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Identical (method, url, user agent) triples always produce the same key.
    #[test]
    fn prop_derive_key_deterministic(
        method in method_strategy(),
        url in url_strategy(),
        ua in user_agent_strategy()
    ) {
        prop_assert_eq!(derive_key(&method, &url, &ua), derive_key(&method, &url, &ua));
    }

    // Distinct user agents never share a key.
    #[test]
    fn prop_user_agents_do_not_share_keys(
        url in url_strategy(),
        ua1 in user_agent_strategy(),
        ua2 in user_agent_strategy()
    ) {
        prop_assume!(ua1 != ua2);
        prop_assert_ne!(derive_key("GET", &url, &ua1), derive_key("GET", &url, &ua2));
    }

    // Storing an item and reading it back before expiry returns identical
    // bytes and headers.
    #[test]
    fn prop_roundtrip_storage(
        key in "[a-z0-9:]{1,64}",
        data in body_strategy(),
        headers in headers_strategy()
    ) {
        let store = LocalStore::new();
        let item = runtime().block_on(async {
            store.set(&key, data.clone(), headers.clone(), TEST_TTL).await.unwrap();
            store.get(&key).await
        });

        let item = item.expect("item should be present before expiry");
        prop_assert_eq!(item.data, data);
        prop_assert_eq!(item.headers, headers);
    }

    // Deleting twice is as good as deleting once and never errors.
    #[test]
    fn prop_delete_idempotent(key in "[a-z0-9:]{1,64}", data in body_strategy()) {
        let store = LocalStore::new();
        let (first, second, after) = runtime().block_on(async {
            store.set(&key, data, HashMap::new(), TEST_TTL).await.unwrap();
            let first = store.delete(&key).await;
            let second = store.delete(&key).await;
            (first, second, store.get(&key).await)
        });

        prop_assert!(first.is_ok());
        prop_assert!(second.is_ok());
        prop_assert!(after.is_none());
    }

    // After invalidating a substring, no key containing it survives and
    // every other key is untouched.
    #[test]
    fn prop_invalidation_removes_only_matching(
        urls in prop::collection::vec(url_strategy(), 1..30),
        pattern in prop_oneof![Just("posts"), Just("pages"), Just("media")]
    ) {
        let store = LocalStore::new();
        let keys: Vec<String> = urls.iter().map(|u| derive_key("GET", u, "agent")).collect();

        let survivors = runtime().block_on(async {
            for key in &keys {
                store.set(key, b"x".to_vec(), HashMap::new(), TEST_TTL).await.unwrap();
            }
            store.invalidate_pattern(pattern).await.unwrap();

            let mut survivors = Vec::new();
            for key in &keys {
                survivors.push(store.get(key).await.is_some());
            }
            survivors
        });

        for (key, survived) in keys.iter().zip(survivors) {
            prop_assert_eq!(survived, !key.contains(pattern), "key {}", key);
        }
    }

    // Concurrent writers on distinct keys never lose an entry.
    #[test]
    fn prop_concurrent_sets_all_visible(count in 1usize..40) {
        let store = Arc::new(LocalStore::new());

        let missing = runtime().block_on(async {
            let mut handles = Vec::new();
            for i in 0..count {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    store
                        .set(&format!("key{}", i), vec![i as u8], HashMap::new(), TEST_TTL)
                        .await
                        .unwrap();
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            let mut missing = 0;
            for i in 0..count {
                if store.get(&format!("key{}", i)).await.is_none() {
                    missing += 1;
                }
            }
            missing
        });

        prop_assert_eq!(missing, 0);
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // An item is present right after `set` and absent once its TTL elapsed.
    #[test]
    fn prop_ttl_expiration_behavior(key in "[a-z0-9:]{1,64}", data in body_strategy()) {
        let store = LocalStore::new();
        let (before, after) = runtime().block_on(async {
            store
                .set(&key, data.clone(), HashMap::new(), Duration::from_millis(100))
                .await
                .unwrap();
            let before = store.get(&key).await;
            tokio::time::sleep(Duration::from_millis(150)).await;
            (before, store.get(&key).await)
        });

        prop_assert_eq!(before.map(|item| item.data), Some(data));
        prop_assert!(after.is_none(), "Entry should not be found after TTL expires");
    }
}
