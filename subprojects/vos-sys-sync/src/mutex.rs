//! # Mutex
//!
//! A non-reentrant mutual-exclusion primitive with process lifetime, used as
//! the OSAL's Global Lock and available to upper layers for coarse
//! protection of shared bookkeeping (the live-thread registry, the once
//! flags).
//!
//! Unlike the standard library's `Mutex<T>`, this type guards no data of its
//! own; it exposes raw `lock`/`unlock` the way the kernel primitive does and
//! the way upper OSAL layers consume it. Only blocking acquisition is
//! offered — a try-lock is intentionally not part of the contract.
//!
//! Re-locking from the thread that already holds the mutex deadlocks, as
//! does unlocking from a thread that does not hold it; both are contract
//! violations, not recoverable conditions.

use std::cell::UnsafeCell;

use vos_sys::sync as sys;

/// A non-reentrant blocking mutex.
///
/// The kernel mutex object is boxed so the `Mutex` value itself may move
/// while the kernel-visible storage stays pinned.
pub struct Mutex {
    inner: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

// SAFETY: the kernel mutex is designed for cross-thread use; all access to
// the inner storage goes through the kernel calls.
unsafe impl Send for Mutex {}
unsafe impl Sync for Mutex {}

impl Mutex {
    /// Creates a new unlocked mutex.
    pub fn new() -> Self {
        Self {
            inner: Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER)),
        }
    }

    /// Acquires the mutex, blocking the calling thread until it is available.
    pub fn lock(&self) {
        // SAFETY: the boxed storage is initialised and pinned for the
        // lifetime of `self`.
        unsafe { sys::mutex_lock(self.inner.get()) }
    }

    /// Releases the mutex.
    ///
    /// Must only be called by the thread that currently holds the lock.
    pub fn unlock(&self) {
        // SAFETY: as in `lock`; holding discipline is the caller's contract.
        unsafe { sys::mutex_unlock(self.inner.get()) }
    }

    /// Runs `f` with the mutex held.
    pub fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        self.lock();
        let ret = f();
        self.unlock();
        ret
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        // SAFETY: `&mut self` guarantees no outstanding guards or waiters.
        unsafe { sys::mutex_destroy(self.inner.get()) }
    }
}
