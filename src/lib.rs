//! autocache - 进程内自刷新只读缓存
//!
//! 提供基于手写读写锁的进程内缓存：请求处理代码始终从内存中
//! 即时读取，后台刷新任务按固定节奏从慢速数据源（数据库查询、
//! 外部服务）重新填充条目。支持按注册顺序执行的刷新器注册表、
//! 部分失败容忍和单调的就绪标志。

#![doc(html_root_url = "https://docs.rs/autocache/0.1.0")]

pub use serde;
pub use serde_json;
pub use tokio;

pub mod config;
pub mod error;
pub mod lock;
pub mod manager;
pub mod metrics;
pub mod registry;
pub mod store;
pub mod telemetry;

mod scheduler;

// Re-export commonly used items
pub use config::Config;
pub use error::{CacheError, Result};
pub use lock::ReadWriteLock;
pub use manager::AutoCache;
pub use metrics::{Metrics, MetricsSnapshot};
pub use registry::{initialized_marker, FnRefresher, Refresher, RefresherRegistry};
pub use store::CacheStore;

/// autocache 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
