//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存系统的错误类型和处理机制。

use thiserror::Error;

/// 缓存系统错误类型枚举
///
/// 定义了缓存系统中可能发生的各种错误类型
#[derive(Error, Debug)]
pub enum CacheError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 刷新器执行失败
    #[error("Refresher {name} failed")]
    Refresh {
        /// 刷新器标识
        name: String,
        /// 失败原因
        #[source]
        source: anyhow::Error,
    },

    /// 刷新调度器已经启动
    #[error("Refresh scheduler has already been started")]
    AlreadyStarted,

    /// 关闭错误
    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}

/// 缓存操作结果类型别名
///
/// 简化错误处理，所有缓存操作都返回此类型
pub type Result<T> = std::result::Result<T, CacheError>;
