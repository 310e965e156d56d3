//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了刷新器注册表，维护按注册顺序排列的刷新回调
//! 以及"已初始化"标记集合。

use crate::store::CacheStore;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// 刷新器接口
///
/// 每个刷新器负责从慢速数据源重新拉取数据，并通过
/// [`CacheStore::store`] 写入它所拥有的键。
#[async_trait]
pub trait Refresher: Send + Sync {
    /// 刷新器标识，注册表按此去重
    fn name(&self) -> &str;

    /// 执行一次刷新
    ///
    /// 实现不得在调用 `store` 时持有外部锁，以避免跨子系统死锁。
    async fn refresh(&self, store: Arc<CacheStore>) -> anyhow::Result<()>;
}

type RefreshFn = Box<dyn Fn(Arc<CacheStore>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// 基于闭包的刷新器
///
/// 将异步闭包适配为 [`Refresher`]，用于不值得单独定义类型的场合。
pub struct FnRefresher {
    name: String,
    func: RefreshFn,
}

impl FnRefresher {
    /// 创建新的闭包刷新器
    ///
    /// # 参数
    ///
    /// * `name` - 刷新器标识
    /// * `func` - 接收缓存存储句柄的异步闭包
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Arc<CacheStore>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move |store| func(store).boxed()),
        }
    }
}

#[async_trait]
impl Refresher for FnRefresher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn refresh(&self, store: Arc<CacheStore>) -> anyhow::Result<()> {
        (self.func)(store).await
    }
}

/// 生成刷新器的"已初始化"标记字符串
///
/// 历史协议：`is_cached` 会把原始缓存键与这些标记字符串做整体比较。
/// 选择缓存键的代码与命名刷新器的代码之间由此存在一条隐式的
/// 字符串约定。行为保持兼容，集中在此函数以便将来替换为显式的
/// 按键注册机制。
pub fn initialized_marker(name: &str) -> String {
    format!("autorefresher@{}", name)
}

struct RegistryState {
    refreshers: Vec<Arc<dyn Refresher>>,
    initialized: HashSet<String>,
}

/// 刷新器注册表
///
/// 按注册顺序保存刷新器，同名注册是幂等的空操作。
/// 另外维护已完成至少一次成功调用的刷新器标记集合。
pub struct RefresherRegistry {
    state: Mutex<RegistryState>,
    test_mode: bool,
}

impl RefresherRegistry {
    /// 创建新的注册表
    ///
    /// # 参数
    ///
    /// * `test_mode` - 测试模式下，刷新器在注册时立即被标记为已初始化，
    ///   测试环境无需等待真实的定时刷新轮次
    pub fn new(test_mode: bool) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                refreshers: Vec::new(),
                initialized: HashSet::new(),
            }),
            test_mode,
        }
    }

    /// 注册一个刷新器
    ///
    /// 同名刷新器重复注册是空操作。
    ///
    /// # 返回值
    ///
    /// 返回该刷新器是否被实际加入
    pub fn register(&self, refresher: Arc<dyn Refresher>) -> bool {
        let mut state = self.lock_state();
        let name = refresher.name().to_string();
        if state.refreshers.iter().any(|r| r.name() == name) {
            debug!("refresher already registered: {}", name);
            return false;
        }

        if self.test_mode {
            state.initialized.insert(initialized_marker(&name));
        }

        state.refreshers.push(refresher);
        debug!("registered refresher: {}", name);
        true
    }

    /// 按注册顺序取得当前刷新器列表的快照
    pub fn snapshot(&self) -> Vec<Arc<dyn Refresher>> {
        self.lock_state().refreshers.clone()
    }

    /// 标记某个刷新器完成了至少一次成功调用
    pub fn mark_initialized(&self, name: &str) {
        self.lock_state().initialized.insert(initialized_marker(name));
    }

    /// 检查原始键是否与某个已初始化标记整体匹配
    pub fn is_initialized_marker(&self, key: &str) -> bool {
        self.lock_state().initialized.contains(key)
    }

    /// 已注册的刷新器数量
    pub fn len(&self) -> usize {
        self.lock_state().refreshers.len()
    }

    /// 注册表是否为空
    pub fn is_empty(&self) -> bool {
        self.lock_state().refreshers.is_empty()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
