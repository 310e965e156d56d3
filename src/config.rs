//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存系统的配置结构和解析逻辑。

use crate::error::{CacheError, Result};
use serde::Deserialize;
use std::time::Duration;

/// 刷新间隔环境变量（秒）
pub const REFRESH_INTERVAL_ENV: &str = "CACHE_REFRESH_INTERVAL";
/// 刷新后固定等待时间环境变量（毫秒）
pub const SETTLE_DELAY_ENV: &str = "CACHE_SETTLE_DELAY_MS";
/// 测试模式环境变量
pub const TEST_MODE_ENV: &str = "TEST";

/// 缓存系统配置
///
/// 定义刷新调度器的节奏和测试模式开关
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// 刷新间隔（秒），两轮刷新开始之间的最小等待时间
    pub refresh_interval_secs: u64,
    /// 每轮刷新结束后的固定等待时间（毫秒），与轮次耗时无关
    pub settle_delay_ms: u64,
    /// 测试模式：刷新器在注册时立即被标记为已初始化
    pub test_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 60,
            settle_delay_ms: 10_000,
            test_mode: false,
        }
    }
}

impl Config {
    /// 从进程环境变量构造配置
    ///
    /// 未设置的变量使用默认值。`TEST=1`启用测试模式。
    ///
    /// # 返回值
    ///
    /// 返回配置，环境变量无法解析时返回相应的错误
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(REFRESH_INTERVAL_ENV) {
            config.refresh_interval_secs = raw.parse().map_err(|_| {
                CacheError::ConfigError(format!(
                    "{} must be an integer number of seconds, got {:?}",
                    REFRESH_INTERVAL_ENV, raw
                ))
            })?;
        }

        if let Ok(raw) = std::env::var(SETTLE_DELAY_ENV) {
            config.settle_delay_ms = raw.parse().map_err(|_| {
                CacheError::ConfigError(format!(
                    "{} must be an integer number of milliseconds, got {:?}",
                    SETTLE_DELAY_ENV, raw
                ))
            })?;
        }

        config.test_mode = std::env::var(TEST_MODE_ENV).map(|v| v == "1").unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    /// 从TOML文本解析配置
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| CacheError::ConfigError(format!("invalid TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    ///
    /// # 返回值
    ///
    /// 配置合法时返回Ok(())，否则返回配置错误
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            return Err(CacheError::ConfigError(
                "refresh_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 刷新间隔
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// 刷新后的固定等待时间
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
