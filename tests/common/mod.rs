//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了测试的通用工具函数和设置。

use autocache::{AutoCache, Config};
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn setup_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .try_init()
            .ok();
    });
}

/// 构造刷新节奏足够快的测试配置
///
/// 间隔1秒、无沉降等待，首轮刷新立即执行
#[allow(dead_code)]
pub fn fast_config() -> Config {
    Config {
        refresh_interval_secs: 1,
        settle_delay_ms: 0,
        test_mode: false,
    }
}

/// 构造测试缓存实例
#[allow(dead_code)]
pub fn fast_cache() -> AutoCache {
    setup_logging();
    AutoCache::new(fast_config()).expect("valid test config")
}

/// 轮询等待条件成立
///
/// 超时后panic，避免测试无限挂起
#[allow(dead_code)]
pub async fn wait_until(what: &str, timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        assert!(
            Instant::now() < deadline,
            "timed out after {:?} waiting for: {}",
            timeout,
            what
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
