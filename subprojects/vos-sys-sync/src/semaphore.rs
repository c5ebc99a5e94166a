//! # Semaphore
//!
//! A counting semaphore over the kernel's unnamed semaphore object.
//!
//! This is the only blocking hand-off primitive the thread-lifecycle core
//! uses: the trampoline posts a thread's completion semaphore exactly once
//! at exit and `join` consumes it. A wait on an already-posted count returns
//! immediately — standard counting-semaphore behaviour, which is what makes
//! "join after the thread already finished" work without special-casing.
//!
//! Creation is fallible and surfaces the kernel's status; wait and post
//! cannot fail once the object exists (interrupted waits are retried by the
//! raw layer). The kernel object is destroyed on drop.

use std::{cell::UnsafeCell, mem, time::Duration};

use vos_sys::{
    sync::{self as sys, SemInitError, TimedOut},
    time,
};

/// A counting semaphore.
///
/// The kernel semaphore storage is boxed so it never moves while the kernel
/// may be referencing it.
pub struct Semaphore {
    inner: Box<UnsafeCell<libc::sem_t>>,
}

// SAFETY: the kernel semaphore is designed for cross-thread use; all access
// to the inner storage goes through the kernel calls.
unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// Creates a new semaphore with the given initial count.
    pub fn new(initial: u32) -> Result<Self, SemInitError> {
        // SAFETY: zeroed storage is a valid placeholder; sem_init overwrites
        // it before first use and the box keeps the address stable.
        let inner = Box::new(UnsafeCell::new(unsafe { mem::zeroed::<libc::sem_t>() }));
        // SAFETY: freshly allocated, uninitialised semaphore storage.
        unsafe { sys::sem_init(inner.get(), initial)? };
        Ok(Self { inner })
    }

    /// Decrements the count, blocking the calling thread until it is
    /// positive.
    pub fn wait(&self) {
        // SAFETY: initialised in `new`, pinned by the box for `self`'s
        // lifetime.
        unsafe { sys::sem_wait(self.inner.get()) }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<(), TimedOut> {
        let deadline = time::realtime_deadline(timeout);
        // SAFETY: as in `wait`.
        unsafe { sys::sem_timedwait(self.inner.get(), &deadline) }
    }

    /// Increments the count, waking one blocked waiter if any.
    pub fn post(&self) {
        // SAFETY: as in `wait`.
        unsafe { sys::sem_post(self.inner.get()) }
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        // SAFETY: `&mut self` guarantees no thread is blocked on the
        // semaphore; destroying it is then permitted.
        unsafe { sys::sem_destroy(self.inner.get()) }
    }
}
