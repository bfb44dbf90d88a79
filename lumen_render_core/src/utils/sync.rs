/// Poison-tolerant mutex helper
///
/// A panic on another thread (for example a fatal sync blob mismatch on the core
/// thread) must not turn every later proxy call into a second panic, so the
/// guarded data is recovered from a poisoned lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, recovering the guard if a previous holder panicked
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
