//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存服务对象，将存储、注册表和刷新调度器组装为
//! 一个带有显式 start/shutdown 生命周期的实例。
//!
//! 没有环境全局变量：协作方在进程启动时构造一个实例，并通过
//! 引用或句柄传递给所有调用者。

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::metrics::MetricsSnapshot;
use crate::registry::{FnRefresher, Refresher, RefresherRegistry};
use crate::scheduler::{self, SchedulerContext};
use crate::store::CacheStore;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// 自刷新缓存服务
///
/// 请求处理代码通过 `get`/`is_cached` 从内存中即时读取；
/// 后台刷新任务按固定节奏调用注册的刷新器重新填充条目。
pub struct AutoCache {
    store: Arc<CacheStore>,
    registry: Arc<RefresherRegistry>,
    config: Config,
    ready: Arc<AtomicBool>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AutoCache {
    /// 使用给定配置创建缓存服务
    ///
    /// # 参数
    ///
    /// * `config` - 缓存系统配置
    ///
    /// # 返回值
    ///
    /// 配置合法时返回服务实例，否则返回配置错误
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(CacheStore::new()),
            registry: Arc::new(RefresherRegistry::new(config.test_mode)),
            config,
            ready: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            worker: Mutex::new(None),
        })
    }

    /// 从进程环境变量创建缓存服务
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// 注册一个刷新器
    ///
    /// 可以在 `start` 之前或之后调用。同名刷新器重复注册是空操作。
    pub fn register(&self, refresher: Arc<dyn Refresher>) -> bool {
        self.registry.register(refresher)
    }

    /// 注册一个闭包刷新器
    ///
    /// # 参数
    ///
    /// * `name` - 刷新器标识
    /// * `func` - 接收缓存存储句柄的异步闭包
    pub fn register_fn<F, Fut>(&self, name: impl Into<String>, func: F) -> bool
    where
        F: Fn(Arc<CacheStore>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(Arc::new(FnRefresher::new(name, func)))
    }

    /// 启动后台刷新任务
    ///
    /// 必须在tokio运行时内调用。重复调用返回
    /// [`CacheError::AlreadyStarted`]。
    #[instrument(skip(self), level = "info")]
    pub fn start(&self) -> Result<()> {
        let mut worker = self.lock_worker();
        if worker.is_some() {
            return Err(CacheError::AlreadyStarted);
        }

        info!(
            "starting refresh scheduler with {} refreshers",
            self.registry.len()
        );

        let ctx = SchedulerContext {
            store: self.store.clone(),
            registry: self.registry.clone(),
            ready: self.ready.clone(),
            config: self.config.clone(),
        };
        *worker = Some(tokio::spawn(scheduler::run(ctx, self.cancel.clone())));
        Ok(())
    }

    /// 关闭后台刷新任务
    ///
    /// 触发取消令牌并等待任务退出，关闭是确定性的。
    /// 从未启动时是空操作。
    #[instrument(skip(self), level = "info")]
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel.cancel();

        let handle = self.lock_worker().take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| CacheError::ShutdownError(format!("refresh task panicked: {}", e)))?;
            info!("refresh scheduler stopped");
        }
        Ok(())
    }

    /// 缓存是否就绪
    ///
    /// 第一轮完整无错误的刷新结束后变为true，此后即使某轮失败
    /// 也不会回退。用于健康检查。
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// 存储一个条目
    pub fn store(&self, key: impl Into<String>, value: Value) {
        self.store.store(key, value);
    }

    /// 读取一个条目的深拷贝，键不存在时返回`None`
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    /// 读取一个条目并应用只读投影，见 [`CacheStore::get_with`]
    pub fn get_with<T>(&self, key: &str, project: impl FnOnce(&Value) -> T) -> Option<T> {
        self.store.get_with(key, project)
    }

    /// 检查某个键是否已缓存
    ///
    /// 存储中有条目，或者键与某个刷新器的已初始化标记
    /// （`autorefresher@<name>`）整体匹配时返回true。
    pub fn is_cached(&self, key: &str) -> bool {
        self.store.contains(key) || self.registry.is_initialized_marker(key)
    }

    /// 清空所有条目（仅用于测试隔离）
    pub fn clean(&self) {
        self.store.clean();
    }

    /// 取得缓存存储句柄
    ///
    /// 刷新器之外的写入方（如消息队列消费者）可以持有此句柄
    /// 直接调用 `store`。
    pub fn store_handle(&self) -> Arc<CacheStore> {
        self.store.clone()
    }

    /// 获取当前指标快照
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.store.metrics().snapshot()
    }

    fn lock_worker(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AutoCache {
    fn drop(&mut self) {
        // 实例销毁时让后台任务尽快退出；确定性的关闭请用 shutdown()
        self.cancel.cancel();
    }
}
