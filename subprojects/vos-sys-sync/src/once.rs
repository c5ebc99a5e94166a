//! # Once
//!
//! The one-time-execution guard: a double-checked flag that guarantees an
//! initializer runs exactly once across arbitrarily many racing callers.
//!
//! The flag is checked **unlocked** first so the common already-initialised
//! path never touches the lock, then re-checked under the caller-supplied
//! Global Lock before running the initializer. The `Release` store / `Acquire` fast-path load
//! pair makes every write the initializer performed visible to any caller
//! that observes the completed flag; callers that lose the race instead
//! synchronise through the mutex itself.
//!
//! There is no timeout and no cancellation — if the initializer never
//! returns, every racing caller blocks forever on the lock. That head-of-
//! line blocking is a documented property of the underlying primitive, not a
//! defect.

use std::sync::atomic::{
    AtomicU32,
    Ordering::{Acquire, Relaxed, Release},
};

use super::Mutex;

/// Not yet run.
const INCOMPLETE: u32 = 0;
/// The initializer has completed.
const COMPLETE: u32 = 1;

/// A one-time-execution flag.
///
/// May be placed in static storage and shared freely between threads. The
/// serialising lock is supplied per call rather than embedded, matching the
/// OSAL design where every `Once` in the process shares the single Global
/// Lock.
pub struct Once {
    done: AtomicU32,
}

impl Once {
    /// Creates a new guard in the not-yet-run state.
    #[inline]
    pub const fn new() -> Self {
        Self {
            done: AtomicU32::new(INCOMPLETE),
        }
    }

    /// Returns `true` if the initializer has already run to completion.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.done.load(Acquire) == COMPLETE
    }

    /// Executes `init` exactly once across all callers racing on this guard.
    ///
    /// Every call returns only after the initializer has completed, whether
    /// it ran on this thread or on another one. `global` must be the same
    /// lock for all callers racing on the same guard.
    pub fn call_once<F>(&self, global: &Mutex, init: F)
    where
        F: FnOnce(),
    {
        // Fast path: initialised earlier; skip the lock entirely.
        if self.is_completed() {
            return;
        }

        // Slow path: re-test under the lock. A racing caller may have run
        // the initializer between our unlocked check and the acquisition.
        global.lock();
        if self.done.load(Relaxed) == INCOMPLETE {
            init();
            self.done.store(COMPLETE, Release);
        }
        global.unlock();
    }
}

impl Default for Once {
    fn default() -> Self {
        Self::new()
    }
}
