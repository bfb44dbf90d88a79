/// AsyncOp - result of work executed on the render thread
///
/// Proxies poll it (`has_completed`, `try_value`) or block on it
/// (`block_until_complete`). Blocking from the render thread itself would wait
/// for work only that same thread can do, so it is detected and treated as a
/// fatal error.

use std::cell::Cell;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use crate::utils::lock;
use crate::{engine_error, engine_warn};

thread_local! {
    static ON_CORE_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is applying core packets or issuing core
/// commands through `CoreThread`
pub fn is_core_thread() -> bool {
    ON_CORE_THREAD.with(|flag| flag.get())
}

/// Marks the current thread as the core thread until dropped
pub(crate) struct CoreThreadGuard {
    previous: bool,
}

impl CoreThreadGuard {
    pub(crate) fn enter() -> Self {
        let previous = ON_CORE_THREAD.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for CoreThreadGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        ON_CORE_THREAD.with(|flag| flag.set(previous));
    }
}

struct AsyncOpShared<T> {
    value: Mutex<Option<T>>,
    completed: Condvar,
}

/// Completion cell shared between a proxy and the render thread
pub struct AsyncOp<T> {
    shared: Arc<AsyncOpShared<T>>,
}

impl<T> Clone for AsyncOp<T> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

impl<T> Default for AsyncOp<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsyncOp<T> {
    /// Pending operation
    pub fn new() -> Self {
        Self {
            shared: Arc::new(AsyncOpShared {
                value: Mutex::new(None),
                completed: Condvar::new(),
            }),
        }
    }

    /// Already completed operation
    pub fn completed(value: T) -> Self {
        let op = Self::new();
        op.complete(value);
        op
    }

    pub fn has_completed(&self) -> bool {
        lock(&self.shared.value).is_some()
    }

    /// Store the result and wake every waiter
    ///
    /// An operation completes once; later values are dropped with a warning.
    pub fn complete(&self, value: T) {
        let mut slot = lock(&self.shared.value);
        if slot.is_some() {
            engine_warn!("lumen::AsyncOp", "Operation completed twice, second value ignored");
            return;
        }
        *slot = Some(value);
        self.shared.completed.notify_all();
    }
}

impl<T: Clone> AsyncOp<T> {
    /// Result if completed, without blocking
    pub fn try_value(&self) -> Option<T> {
        lock(&self.shared.value).clone()
    }

    /// Wait for the result
    ///
    /// # Panics
    ///
    /// When called on the core thread before completion (self-deadlock).
    pub fn block_until_complete(&self) -> T {
        let mut slot = lock(&self.shared.value);
        loop {
            if let Some(value) = slot.as_ref() {
                return value.clone();
            }
            Self::refuse_core_thread_wait();
            slot = self
                .shared
                .completed
                .wait(slot)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    /// Wait for the result at most `timeout`
    pub fn block_until_complete_timeout(&self, timeout: Duration) -> Option<T> {
        let slot = lock(&self.shared.value);
        if let Some(value) = slot.as_ref() {
            return Some(value.clone());
        }
        Self::refuse_core_thread_wait();
        let (slot, _) = self
            .shared
            .completed
            .wait_timeout_while(slot, timeout, |value| value.is_none())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        slot.clone()
    }

    fn refuse_core_thread_wait() {
        if is_core_thread() {
            engine_error!("lumen::AsyncOp",
                "Blocking on an incomplete operation from the core thread would deadlock");
            panic!("AsyncOp::block_until_complete called on the core thread");
        }
    }
}

#[cfg(test)]
#[path = "async_op_tests.rs"]
mod tests;
