//! Raw kernel synchronization primitives.
//!
//! Thin wrappers around the kernel's unnamed counting semaphores and the
//! default (non-recursive) mutex. All functions here operate on raw storage
//! supplied by the caller; the owned `Semaphore` and `Mutex` types live in
//! `vos-sys-sync`.
//!
//! Interrupted waits (`EINTR`) are retried transparently, so callers never
//! observe a wait cut short by a signal.
//! Failures that can only arise from handing these functions invalid storage
//! are contract violations and abort via `debug_assert!` rather than being
//! surfaced as recoverable errors.

use std::os::raw::c_int;

use crate::last_errno;

/// Initialises the semaphore storage at `sem` with the given initial count.
///
/// # Safety
/// `sem` must point to writable storage for a semaphore object that is not
/// currently initialised (or whose previous initialisation has been
/// destroyed), and that storage must not move for as long as the semaphore
/// is in use.
pub unsafe fn sem_init(sem: *mut libc::sem_t, value: u32) -> Result<(), SemInitError> {
    // SAFETY: per this function's contract.
    let rc = unsafe { libc::sem_init(sem, 0, value as libc::c_uint) };
    if rc == 0 {
        return Ok(());
    }
    Err(match last_errno() {
        libc::EINVAL => SemInitError::ValueTooLarge,
        libc::ENOSYS => SemInitError::Unsupported,
        other => SemInitError::Unknown(other),
    })
}

/// Decrements the semaphore, blocking until the count is positive.
///
/// # Safety
/// `sem` must point to an initialised semaphore that outlives the call.
pub unsafe fn sem_wait(sem: *mut libc::sem_t) {
    loop {
        // SAFETY: per this function's contract.
        if unsafe { libc::sem_wait(sem) } == 0 {
            return;
        }
        match last_errno() {
            libc::EINTR => continue,
            err => {
                debug_assert!(false, "sem_wait on invalid semaphore (errno {err})");
                return;
            }
        }
    }
}

/// Like [`sem_wait`] but gives up once the absolute wall-clock `deadline`
/// passes.
///
/// # Safety
/// `sem` must point to an initialised semaphore that outlives the call.
pub unsafe fn sem_timedwait(sem: *mut libc::sem_t, deadline: &libc::timespec) -> Result<(), TimedOut> {
    loop {
        // SAFETY: per this function's contract; `deadline` is a valid timespec.
        if unsafe { libc::sem_timedwait(sem, deadline) } == 0 {
            return Ok(());
        }
        match last_errno() {
            libc::EINTR => continue,
            libc::ETIMEDOUT => return Err(TimedOut),
            err => {
                debug_assert!(false, "sem_timedwait on invalid semaphore (errno {err})");
                return Err(TimedOut);
            }
        }
    }
}

/// Increments the semaphore, waking one waiter if any are blocked.
///
/// # Safety
/// `sem` must point to an initialised semaphore that outlives the call.
pub unsafe fn sem_post(sem: *mut libc::sem_t) {
    // SAFETY: per this function's contract.
    let rc = unsafe { libc::sem_post(sem) };
    // The only failure for a valid semaphore is counter overflow, which the
    // OSAL's post-exactly-once discipline cannot reach.
    debug_assert!(rc == 0, "sem_post failed (errno {})", last_errno());
}

/// Destroys the semaphore at `sem`.
///
/// # Safety
/// `sem` must point to an initialised semaphore upon which no threads are
/// currently blocked.
pub unsafe fn sem_destroy(sem: *mut libc::sem_t) {
    // SAFETY: per this function's contract.
    unsafe {
        libc::sem_destroy(sem);
    }
}

/// Acquires the mutex at `mutex`, blocking until it is available.
///
/// # Safety
/// `mutex` must point to an initialised, non-recursive mutex that outlives
/// the call, and the calling thread must not already hold it.
pub unsafe fn mutex_lock(mutex: *mut libc::pthread_mutex_t) {
    // SAFETY: per this function's contract.
    let rc = unsafe { libc::pthread_mutex_lock(mutex) };
    debug_assert!(rc == 0, "mutex_lock failed (rc {rc})");
}

/// Releases the mutex at `mutex`.
///
/// # Safety
/// `mutex` must point to an initialised mutex held by the calling thread.
pub unsafe fn mutex_unlock(mutex: *mut libc::pthread_mutex_t) {
    // SAFETY: per this function's contract.
    let rc = unsafe { libc::pthread_mutex_unlock(mutex) };
    debug_assert!(rc == 0, "mutex_unlock failed (rc {rc})");
}

/// Destroys the mutex at `mutex`.
///
/// # Safety
/// `mutex` must point to an initialised, unlocked mutex with no waiters.
pub unsafe fn mutex_destroy(mutex: *mut libc::pthread_mutex_t) {
    // SAFETY: per this function's contract.
    unsafe {
        libc::pthread_mutex_destroy(mutex);
    }
}

/// Semaphore initialisation errors.
#[derive(Debug, thiserror::Error)]
pub enum SemInitError {
    /// The requested initial count exceeds the kernel's maximum semaphore
    /// value.
    #[error("Initial count exceeds the maximum semaphore value")]
    ValueTooLarge,
    /// The kernel does not support unnamed semaphores.
    #[error("Unnamed semaphores are not supported on this system")]
    Unsupported,
    /// Any unforeseen kernel error, carrying the raw error number.
    #[error("Unknown error: {0}")]
    Unknown(c_int),
}

/// Returned by [`sem_timedwait`] when the deadline passes before the
/// semaphore count becomes positive.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Operation timed out")]
pub struct TimedOut;
