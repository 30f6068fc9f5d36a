//! Re-entry barrier around a single emit.
//!
//! Sending a webhook can itself produce log records: the transport warns
//! about rate limits and connection failures. Once the handler is installed
//! behind the `log` facade those records loop straight back into the
//! handler. [`ReentryGuard`] turns such nested calls into no-ops.
//!
//! The flag lives behind a re-entrant mutex. The emitting thread can
//! re-acquire the lock and sees the flag set. Any other thread blocks until
//! the emit finishes, so concurrent emits are serialised, not dropped.

use std::cell::Cell;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

#[derive(Debug, Default)]
pub struct ReentryGuard {
    emitting: ReentrantMutex<Cell<bool>>,
}

/// Proof that the current thread holds the guard. Dropping it, including
/// during unwinding, returns the guard to idle.
#[must_use = "the guard is released as soon as this value is dropped"]
pub struct Emitting<'a> {
    state: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl ReentryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the emitting state, or return `None` when this thread is
    /// already inside an emit on the same guard.
    pub fn enter(&self) -> Option<Emitting<'_>> {
        let state = self.emitting.lock();
        if state.replace(true) {
            return None;
        }
        Some(Emitting { state })
    }

    /// Whether an emit is in progress on any thread.
    pub fn is_emitting(&self) -> bool {
        self.emitting.try_lock().is_none_or(|state| state.get())
    }
}

impl Drop for Emitting<'_> {
    fn drop(&mut self) {
        self.state.set(false);
    }
}
