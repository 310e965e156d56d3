//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 读写锁实现 - 允许多个读者并行访问，写者独占访问
//!
//! 单个互斥门（gate）同时串行化"读者计数的增减"和"写者的独占持有"。
//! 读者只在递增计数的瞬间持有 gate；写者在整个写临界区持有 gate，
//! 并通过条件变量等待"读者计数为零"。
//!
//! 公平性：写者在等待期间释放 gate，新读者仍可不断递增计数，
//! 因此在持续的读负载下写者可能饥饿（非 starvation-free）。
//! 这一行为是有意保留的，测试会对其断言。

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// 读写锁
///
/// 持有被保护的数据，通过RAII守卫提供读/写访问
pub struct ReadWriteLock<T> {
    /// 互斥门，保护读者计数；写者在整个写临界区持有它
    gate: Mutex<usize>,
    /// "读者计数为零"条件
    drained: Condvar,
    data: UnsafeCell<T>,
}

// 安全性：data 只在两种情况下被访问：
// - 通过 ReadGuard 以 &T 访问，此时写者无法持有 gate（计数 > 0）；
// - 通过 WriteGuard 以 &mut T 访问，此时写者持有 gate 且计数为零。
unsafe impl<T: Send> Send for ReadWriteLock<T> {}
unsafe impl<T: Send + Sync> Sync for ReadWriteLock<T> {}

impl<T> ReadWriteLock<T> {
    /// 创建新的读写锁
    pub fn new(data: T) -> Self {
        Self {
            gate: Mutex::new(0),
            drained: Condvar::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// 获取读访问
    ///
    /// 多个读临界区可以并行打开。gate 只在递增读者计数期间被持有，
    /// 读取本身不持有 gate。
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut readers = lock_gate(&self.gate);
        *readers += 1;
        drop(readers);
        ReadGuard { lock: self }
    }

    /// 获取写访问
    ///
    /// 阻塞直到所有在途读者释放。等待期间 gate 被原子地释放，
    /// 返回的守卫在整个写临界区持有 gate。
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut readers = lock_gate(&self.gate);
        while *readers > 0 {
            readers = self
                .drained
                .wait(readers)
                .unwrap_or_else(PoisonError::into_inner);
        }
        WriteGuard {
            lock: self,
            _gate: readers,
        }
    }

    /// 当前在途读者数量（仅用于诊断和测试）
    pub fn reader_count(&self) -> usize {
        *lock_gate(&self.gate)
    }
}

fn lock_gate(gate: &Mutex<usize>) -> MutexGuard<'_, usize> {
    // gate 临界区内不会 panic，中毒只可能来自极端情况，直接恢复
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 读守卫
///
/// 存活期间保证没有写者；drop 时递减读者计数并在计数归零时唤醒写者
pub struct ReadGuard<'a, T> {
    lock: &'a ReadWriteLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // 安全性：守卫存活期间读者计数 > 0，写者无法取得独占访问
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut readers = lock_gate(&self.lock.gate);
        assert!(*readers > 0, "read lock released without a matching acquire");
        *readers -= 1;
        if *readers == 0 {
            self.lock.drained.notify_all();
        }
    }
}

/// 写守卫
///
/// 存活期间持有 gate，排除所有读者和其他写者
pub struct WriteGuard<'a, T> {
    lock: &'a ReadWriteLock<T>,
    _gate: MutexGuard<'a, usize>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // 安全性：持有 gate 且读者计数为零
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}
