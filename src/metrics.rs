//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存系统的指标收集和监控功能。

use std::sync::atomic::{AtomicU64, Ordering};

/// 指标收集器
///
/// 用于收集和存储缓存系统的各种运行时指标。
/// 每个缓存实例持有自己的收集器，没有全局单例。
#[derive(Debug, Default)]
pub struct Metrics {
    /// 缓存命中总数
    hits: AtomicU64,
    /// 缓存未命中总数
    misses: AtomicU64,
    /// 写入总数
    stores: AtomicU64,
    /// 已完成的刷新轮次总数
    refresh_passes: AtomicU64,
    /// 失败的刷新轮次总数
    refresh_failures: AtomicU64,
}

/// 某一时刻的指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub refresh_passes: u64,
    pub refresh_failures: u64,
}

impl Metrics {
    /// 记录一次缓存命中
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次缓存未命中
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次写入
    pub fn record_store(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一轮刷新
    ///
    /// # 参数
    ///
    /// * `success` - 该轮次是否在没有刷新器错误的情况下完成
    pub fn record_refresh_pass(&self, success: bool) {
        self.refresh_passes.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.refresh_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 获取当前指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            refresh_passes: self.refresh_passes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
        }
    }
}

/// 获取指标字符串
///
/// 将所有指标格式化为字符串返回，用于监控系统采集
pub fn get_metrics_string(metrics: &Metrics) -> String {
    let snapshot = metrics.snapshot();
    let mut output = String::new();
    output.push_str(&format!("cache_hits_total {}\n", snapshot.hits));
    output.push_str(&format!("cache_misses_total {}\n", snapshot.misses));
    output.push_str(&format!("cache_stores_total {}\n", snapshot.stores));
    output.push_str(&format!(
        "cache_refresh_passes_total {}\n",
        snapshot.refresh_passes
    ));
    output.push_str(&format!(
        "cache_refresh_failures_total {}\n",
        snapshot.refresh_failures
    ));
    output
}
