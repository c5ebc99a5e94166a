//! One-shot timer implementation.
//!
//! Each [`Timer`] owns a dedicated native worker thread. The worker parks on
//! a control semaphore: unarmed it waits indefinitely, armed it waits with
//! the deadline as timeout. A timed-out wait means the deadline genuinely
//! passed and the callback fires on the worker thread; a posted wait means
//! the armed state changed (set/cancel/shutdown) and the worker re-reads it.
//!
//! Teardown is a handshake: drop marks the shutdown flag, posts the control
//! semaphore and blocks on the `done` semaphore until the worker has posted
//! it on the way out. After drop returns, the callback is guaranteed not to
//! run again.

use std::{
    cell::UnsafeCell,
    os::raw::c_void,
    sync::Arc,
    time::Duration,
};

use vos_sys::{thread as sys_thread, time as sys_time};
use vos_sys_sync::{Mutex, SemInitError, Semaphore, TimedOut};

/// Callback type invoked on the timer's worker thread when the deadline
/// passes. The opaque argument is the one supplied at creation.
pub type TimerFn = fn(*mut c_void);

/// Worker stack size. Callbacks are expected to be small trampolines into
/// upper-layer state, so a modest fixed stack is enough.
const WORKER_STACK_SIZE: usize = 64 * 1024;

/// A one-shot millisecond timer.
///
/// Dropping the timer disarms it and waits for the worker thread to exit, so
/// the callback never outlives the timer object.
pub struct Timer {
    shared: Arc<Shared>,
}

struct Shared {
    /// Guards `inner`.
    state: Mutex,
    inner: UnsafeCell<Inner>,
    /// Posted whenever `inner` changes; the worker re-reads on wake.
    control: Semaphore,
    /// Posted exactly once by the worker as it exits.
    done: Semaphore,
    callback: Option<TimerFn>,
    arg: *mut c_void,
}

struct Inner {
    /// Absolute monotonic deadline in microseconds, when armed.
    deadline_us: Option<u64>,
    shutdown: bool,
}

// SAFETY: `inner` is only touched under `state`; `arg` is an opaque pointer
// whose thread-safety is the creating caller's contract (it is handed back
// verbatim to the callback and never dereferenced here).
unsafe impl Send for Shared {}
unsafe impl Sync for Shared {}

impl Timer {
    /// Creates a new, unarmed timer.
    ///
    /// `name` labels the worker thread for diagnostics. A timer created with
    /// no callback can still be armed; expiry is then a no-op, which is how
    /// the per-thread task-timer slot starts out.
    pub fn new(name: &str, callback: Option<TimerFn>, arg: *mut c_void) -> Result<Self, TimerCreateError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(),
            inner: UnsafeCell::new(Inner {
                deadline_us: None,
                shutdown: false,
            }),
            control: Semaphore::new(0)?,
            done: Semaphore::new(0)?,
            callback,
            arg,
        });

        let worker_arg = Arc::into_raw(Arc::clone(&shared)) as *mut c_void;
        match sys_thread::create(timer_worker, worker_arg, WORKER_STACK_SIZE, name) {
            Ok(_) => Ok(Self { shared }),
            Err(err) => {
                // Reclaim the reference the worker never took.
                // SAFETY: produced by Arc::into_raw above and not consumed.
                drop(unsafe { Arc::from_raw(worker_arg as *const Shared) });
                Err(err.into())
            }
        }
    }

    /// Arms the timer to fire once, `ms` milliseconds from now.
    ///
    /// Re-arming an already armed timer replaces the pending deadline.
    pub fn set(&self, ms: u32) {
        let deadline = sys_time::now_micros() + ms as u64 * 1_000;
        self.shared.with_inner(|inner| inner.deadline_us = Some(deadline));
        self.shared.control.post();
    }

    /// Disarms the timer.
    ///
    /// A callback already past its deadline check may still be executing on
    /// the worker thread when this returns; only drop synchronises with it.
    pub fn cancel(&self) {
        self.shared.with_inner(|inner| inner.deadline_us = None);
        self.shared.control.post();
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.shared.with_inner(|inner| {
            inner.deadline_us = None;
            inner.shutdown = true;
        });
        self.shared.control.post();
        // Wait for the worker's exit handshake so the callback cannot fire
        // after the owner is gone.
        self.shared.done.wait();
    }
}

impl Shared {
    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        self.state.lock();
        // SAFETY: `inner` is only accessed with `state` held.
        let ret = f(unsafe { &mut *self.inner.get() });
        self.state.unlock();
        ret
    }

    /// Re-checks the deadline under the lock and, if it genuinely expired,
    /// disarms and fires. Returns without firing if a racing set/cancel
    /// moved or cleared the deadline.
    fn fire_if_expired(&self) {
        let now = sys_time::now_micros();
        let expired = self.with_inner(|inner| match inner.deadline_us {
            Some(d) if now >= d => {
                inner.deadline_us = None;
                true
            }
            _ => false,
        });
        if expired {
            if let Some(callback) = self.callback {
                callback(self.arg);
            }
        }
    }
}

extern "C" fn timer_worker(arg: *mut c_void) -> *mut c_void {
    // SAFETY: `arg` is the Arc reference produced in `Timer::new`.
    let shared = unsafe { Arc::from_raw(arg as *const Shared) };

    loop {
        let (deadline, shutdown) = shared.with_inner(|inner| (inner.deadline_us, inner.shutdown));
        if shutdown {
            break;
        }
        match deadline {
            None => shared.control.wait(),
            Some(d) => {
                let now = sys_time::now_micros();
                if now >= d {
                    shared.fire_if_expired();
                    continue;
                }
                match shared.control.wait_timeout(Duration::from_micros(d - now)) {
                    // State changed; loop around and re-read it.
                    Ok(()) => continue,
                    Err(TimedOut) => shared.fire_if_expired(),
                }
            }
        }
    }

    log::trace!("timer worker exiting");
    // The exit handshake must be the last touch before the Arc is released.
    shared.done.post();
    drop(shared);
    std::ptr::null_mut()
}

/// Timer creation errors.
#[derive(Debug, thiserror::Error)]
pub enum TimerCreateError {
    /// One of the internal semaphores could not be created.
    #[error("Semaphore creation failed: {0}")]
    Semaphore(#[from] SemInitError),
    /// The worker thread could not be created.
    #[error("Worker thread creation failed: {0}")]
    Worker(#[from] sys_thread::CreateThreadError),
}
