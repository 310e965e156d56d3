//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存存储，一个由读写锁保护的键值映射。
//!
//! 隔离契约：`store` 取得值的所有权，存储的条目从不与调用者的副本
//! 产生别名；`get` 在返回前对存储值做深拷贝。任何一方之后的修改
//! 对另一方都不可见。

use crate::lock::ReadWriteLock;
use crate::metrics::Metrics;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// 缓存存储
///
/// 键到任意JSON值的映射，读写通过自带的读写锁串行化。
/// 条目只会被覆盖或由`clean`整体清除，没有逐条淘汰。
pub struct CacheStore {
    entries: ReadWriteLock<HashMap<String, Value>>,
    metrics: Metrics,
}

impl CacheStore {
    /// 创建空的缓存存储
    pub fn new() -> Self {
        Self {
            entries: ReadWriteLock::new(HashMap::new()),
            metrics: Metrics::default(),
        }
    }

    /// 存储一个条目
    ///
    /// 获取写访问，插入或覆盖`key`处的条目。值通过所有权转移进入
    /// 缓存，调用者无法再修改已存储的数据。
    ///
    /// # 参数
    ///
    /// * `key` - 缓存键
    /// * `value` - 缓存值
    pub fn store(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut entries = self.entries.write();
        entries.insert(key.clone(), value);
        drop(entries);
        self.metrics.record_store();
        debug!("stored in cache: {}", key);
    }

    /// 读取一个条目的深拷贝
    ///
    /// 键不存在时返回`None`，这不是错误。
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_with(key, Value::clone)
    }

    /// 读取一个条目并应用投影
    ///
    /// 投影函数直接作用于存储中的**实时引用**（不是拷贝），其返回值
    /// 作为独立数据交还调用者。多个读者可以同时对同一引用应用投影，
    /// 因此投影必须是只读的。投影内部的panic会传播给调用者，
    /// 读锁仍会在退栈时释放。
    ///
    /// # 参数
    ///
    /// * `key` - 缓存键
    /// * `project` - 投影函数
    pub fn get_with<T>(&self, key: &str, project: impl FnOnce(&Value) -> T) -> Option<T> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(value) => {
                debug!("getting from cache: {}", key);
                let result = project(value);
                drop(entries);
                self.metrics.record_hit();
                Some(result)
            }
            None => {
                debug!("{} is not in cache", key);
                drop(entries);
                self.metrics.record_miss();
                None
            }
        }
    }

    /// 检查某个键是否有已存储的条目
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// 清空所有条目（仅用于测试隔离）
    pub fn clean(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        debug!("cache cleaned");
    }

    /// 当前条目数量
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 访问该存储的指标收集器
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
