//! Grants Cache Tests
//!
//! Visibility, invalidation and concurrent-writer behaviour of the sharded
//! grants cache.

use accord_access::GrantsCache;
use proptest::prelude::*;
use std::sync::Arc;

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

fn arb_grants() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9]{1,12}", 0..8)
}

proptest! {
    /// A write is visible to the next read, order preserved
    #[test]
    fn put_then_get_returns_grants(name in arb_name(), grants in arb_grants()) {
        let cache = GrantsCache::new();
        cache.put(name.clone(), grants.clone());
        prop_assert_eq!(cache.get(&name), Some(grants));
    }

    /// Deleting always produces a miss, whatever came before
    #[test]
    fn delete_then_get_misses(name in arb_name(), grants in arb_grants(), written in any::<bool>()) {
        let cache = GrantsCache::new();
        if written {
            cache.put(name.clone(), grants);
        }
        cache.delete(&name);
        prop_assert_eq!(cache.get(&name), None);
    }

    /// Repeating an identical write changes nothing
    #[test]
    fn repeated_put_is_idempotent(name in arb_name(), grants in arb_grants()) {
        let cache = GrantsCache::new();
        cache.put(name.clone(), grants.clone());
        cache.put(name.clone(), grants.clone());
        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.get(&name), Some(grants));
    }

    /// Entries for other names are untouched by a write
    #[test]
    fn writes_do_not_leak_across_names(
        a in arb_name(),
        b in arb_name(),
        grants_a in arb_grants(),
        grants_b in arb_grants(),
    ) {
        prop_assume!(a != b);
        let cache = GrantsCache::with_shards(2);
        cache.put(a.clone(), grants_a.clone());
        cache.put(b.clone(), grants_b);
        cache.delete(&b);
        prop_assert_eq!(cache.get(&a), Some(grants_a));
    }
}

#[test]
fn test_unknown_name_misses() {
    let cache = GrantsCache::new();
    assert_eq!(cache.get("never-written"), None);
    assert!(!cache.contains("never-written"));
}

#[test]
fn test_concurrent_writers_on_distinct_names_all_survive() {
    const WRITERS: usize = 64;
    let cache = Arc::new(GrantsCache::new());

    std::thread::scope(|scope| {
        for i in 0..WRITERS {
            let cache = cache.clone();
            scope.spawn(move || {
                for round in 0..50 {
                    cache.put(format!("db-{i}"), vec![format!("id-{i}-{round}")]);
                }
            });
        }
    });

    assert_eq!(cache.len(), WRITERS);
    for i in 0..WRITERS {
        assert_eq!(cache.get(&format!("db-{i}")), Some(vec![format!("id-{i}-49")]));
    }
}

#[test]
fn test_readers_never_see_partial_writes() {
    let cache = Arc::new(GrantsCache::with_shards(1));
    let full: Vec<String> = (0..32).map(|i| format!("id-{i}")).collect();
    cache.put("events", Vec::new());

    std::thread::scope(|scope| {
        let writer_cache = cache.clone();
        let writer_full = full.clone();
        scope.spawn(move || {
            for _ in 0..500 {
                writer_cache.put("events", writer_full.clone());
                writer_cache.put("events", Vec::new());
            }
        });

        for _ in 0..4 {
            let cache = cache.clone();
            let full = full.clone();
            scope.spawn(move || {
                for _ in 0..500 {
                    let seen = cache.get("events").unwrap_or_default();
                    assert!(seen.is_empty() || seen == full);
                }
            });
        }
    });
}

#[tokio::test]
async fn test_concurrent_tasks_mix_put_get_delete() {
    let cache = Arc::new(GrantsCache::new());
    let mut handles = Vec::new();

    for i in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("db-{i}");
            cache.put(name.clone(), vec!["alice".to_string()]);
            assert_eq!(cache.get(&name), Some(vec!["alice".to_string()]));
            if i % 2 == 0 {
                cache.delete(&name);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cache.len(), 8);
    assert!(cache.contains("db-1"));
    assert!(!cache.contains("db-0"));
}
