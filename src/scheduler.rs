//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了刷新调度器，在后台循环中按固定节奏驱动注册表
//! 中的所有刷新器。
//!
//! 节奏：`等待(距上轮开始不足间隔的剩余时间) → 执行 → 固定沉降等待`。
//! 两轮开始之间的真实周期是 `max(间隔, 已消逝时间) + 执行耗时 + 沉降
//! 等待`，不是固定频率的定时器。

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::registry::RefresherRegistry;
use crate::store::CacheStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// 调度器循环的共享依赖
pub(crate) struct SchedulerContext {
    pub store: Arc<CacheStore>,
    pub registry: Arc<RefresherRegistry>,
    pub ready: Arc<AtomicBool>,
    pub config: Config,
}

/// 调度器主循环
///
/// 取消令牌在每个等待点被检查，取消后循环确定性地退出。
pub(crate) async fn run(ctx: SchedulerContext, cancel: CancellationToken) {
    let interval = ctx.config.refresh_interval();
    let settle = ctx.config.settle_delay();
    let mut last_refresh: Option<Instant> = None;

    debug!(
        "refresh loop started, interval={:?}, settle={:?}",
        interval, settle
    );

    loop {
        // 等待阶段：距上一轮开始不足一个间隔时，睡掉剩余时间。
        // 首轮没有上一轮，立即执行。
        if let Some(last) = last_refresh {
            let elapsed = last.elapsed();
            if elapsed < interval {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(interval - elapsed) => {}
                }
            }
        }
        if cancel.is_cancelled() {
            break;
        }

        // 执行阶段。轮次开始时间无论成败都会被记录。
        let outcome = run_pass(&ctx.store, &ctx.registry).await;
        last_refresh = Some(Instant::now());

        match outcome {
            Ok(count) => {
                ctx.store.metrics().record_refresh_pass(true);
                // 第一轮完整成功后，缓存被标记为就绪，此后不再回退
                if !ctx.ready.swap(true, Ordering::SeqCst) {
                    info!("cache is ready after refreshing {} sources", count);
                } else {
                    debug!("refresh pass completed, {} sources", count);
                }
            }
            Err(e) => {
                ctx.store.metrics().record_refresh_pass(false);
                error!(
                    "An error occured while updating the cache: {:#}",
                    anyhow::Error::from(e)
                );
            }
        }

        // 沉降阶段：与轮次耗时无关的固定等待
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(settle) => {}
        }
    }

    debug!("refresh loop stopped");
}

/// 执行一轮刷新
///
/// 按注册顺序调用每个刷新器。某个刷新器失败时，本轮剩余的刷新器
/// 全部跳过（失败不做按刷新器隔离），错误上抛由调用方记录一次。
/// 某个标识的第一次成功调用会在注册表中留下已初始化标记。
///
/// # 返回值
///
/// 整轮无错误时返回被调用的刷新器数量
pub(crate) async fn run_pass(
    store: &Arc<CacheStore>,
    registry: &Arc<RefresherRegistry>,
) -> Result<usize> {
    let refreshers = registry.snapshot();

    for refresher in &refreshers {
        let name = refresher.name().to_string();
        refresher
            .refresh(store.clone())
            .await
            .map_err(|source| CacheError::Refresh {
                name: name.clone(),
                source,
            })?;
        registry.mark_initialized(&name);
    }

    Ok(refreshers.len())
}
