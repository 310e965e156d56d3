//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存系统的日志初始化辅助函数。

use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 此函数应该在应用程序启动时调用一次。日志级别通过 `RUST_LOG`
/// 环境变量控制，未设置时使用给定的默认指令。
///
/// 通常由应用层决定如何配置全局 subscriber，这里仅作为库提供的
/// 辅助函数；重复初始化会被忽略。
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
