//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 刷新调度集成测试

use anyhow::anyhow;
use autocache::CacheStore;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[path = "../common/mod.rs"]
mod common;

/// 两个刷新器各自填充自己的键，一轮完整刷新后缓存就绪
#[tokio::test]
async fn test_refreshers_populate_cache_and_set_ready() {
    let cache = common::fast_cache();

    cache.register_fn("stores_x", |store: Arc<CacheStore>| async move {
        store.store("x", json!(1));
        Ok(())
    });
    cache.register_fn("stores_y", |store: Arc<CacheStore>| async move {
        store.store("y", json!(2));
        Ok(())
    });

    assert!(!cache.is_ready());
    cache.start().unwrap();

    common::wait_until("first refresh pass", Duration::from_secs(3), || {
        cache.is_ready()
    })
    .await;

    assert_eq!(cache.get("x"), Some(json!(1)));
    assert_eq!(cache.get("y"), Some(json!(2)));
    assert!(cache.is_cached("x"));
    assert!(cache.is_cached("autorefresher@stores_x"));
    assert!(cache.is_cached("autorefresher@stores_y"));

    cache.shutdown().await.unwrap();
}

/// 失败的刷新器中止本轮，后续刷新器被跳过，就绪标志保持false，
/// 直到一轮无错误的刷新完成
#[tokio::test]
async fn test_failing_refresher_skips_rest_until_a_clean_pass() {
    let cache = common::fast_cache();
    let attempts = Arc::new(AtomicUsize::new(0));

    let attempts2 = attempts.clone();
    cache.register_fn("flaky", move |_store| {
        let attempts = attempts2.clone();
        async move {
            // 第一轮失败，之后恢复
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow!("upstream unavailable"))
            } else {
                Ok(())
            }
        }
    });
    cache.register_fn("stores_y", |store: Arc<CacheStore>| async move {
        store.store("y", json!(2));
        Ok(())
    });

    cache.start().unwrap();

    common::wait_until("first (failing) pass", Duration::from_secs(3), || {
        attempts.load(Ordering::SeqCst) >= 1
    })
    .await;

    // 第一轮失败：stores_y被跳过，缓存未就绪
    assert!(!cache.is_ready());
    assert_eq!(cache.get("y"), None);
    assert!(!cache.is_cached("autorefresher@flaky"));
    assert!(!cache.is_cached("autorefresher@stores_y"));

    common::wait_until("a clean pass", Duration::from_secs(5), || cache.is_ready()).await;

    assert_eq!(cache.get("y"), Some(json!(2)));
    assert!(cache.is_cached("autorefresher@flaky"));

    cache.shutdown().await.unwrap();
}

/// 就绪标志是单调的：一旦为true，后续轮次失败也不会回退
#[tokio::test]
async fn test_ready_flag_survives_later_failures() {
    let cache = common::fast_cache();
    let attempts = Arc::new(AtomicUsize::new(0));

    let attempts2 = attempts.clone();
    cache.register_fn("degrading", move |store: Arc<CacheStore>| {
        let attempts = attempts2.clone();
        async move {
            // 第一轮成功，之后持续失败
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                store.store("x", json!(1));
                Ok(())
            } else {
                Err(anyhow!("source went away"))
            }
        }
    });

    cache.start().unwrap();

    common::wait_until("first refresh pass", Duration::from_secs(3), || {
        cache.is_ready()
    })
    .await;

    common::wait_until("a failed pass", Duration::from_secs(5), || {
        cache.metrics_snapshot().refresh_failures >= 1
    })
    .await;

    assert!(cache.is_ready());
    assert_eq!(cache.get("x"), Some(json!(1)));

    cache.shutdown().await.unwrap();
}

/// start之后注册的刷新器会被后续轮次拾取
#[tokio::test]
async fn test_refresher_registered_after_start_is_picked_up() {
    let cache = common::fast_cache();

    cache.register_fn("stores_x", |store: Arc<CacheStore>| async move {
        store.store("x", json!(1));
        Ok(())
    });

    cache.start().unwrap();
    common::wait_until("first refresh pass", Duration::from_secs(3), || {
        cache.is_ready()
    })
    .await;
    assert_eq!(cache.get("late"), None);

    cache.register_fn("late", |store: Arc<CacheStore>| async move {
        store.store("late", json!("here"));
        Ok(())
    });

    common::wait_until("a pass including the late refresher", Duration::from_secs(5), || {
        cache.get("late").is_some()
    })
    .await;
    assert!(cache.is_cached("autorefresher@late"));

    cache.shutdown().await.unwrap();
}

/// 同名刷新器重复注册是空操作，只会被执行一次
#[tokio::test]
async fn test_duplicate_registration_runs_once_per_pass() {
    let cache = common::fast_cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut outcomes = Vec::new();
    for _ in 0..3 {
        let calls2 = calls.clone();
        outcomes.push(cache.register_fn("counted", move |_store| {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));
    }
    // 只有第一次注册生效
    assert_eq!(outcomes, vec![true, false, false]);

    cache.start().unwrap();
    common::wait_until("first refresh pass", Duration::from_secs(3), || {
        cache.is_ready()
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);

    cache.shutdown().await.unwrap();
}
