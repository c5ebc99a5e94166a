//! Kernel clock reads.
//!
//! Two clocks matter to the OSAL: the monotonic clock, which feeds the
//! microsecond timestamps and timer deadlines used by upper layers, and the
//! wall clock, which the kernel's timed semaphore wait is specified against.

use std::{mem::MaybeUninit, time::Duration};

/// Returns the monotonic clock in microseconds.
///
/// The origin is unspecified; only differences between two reads are
/// meaningful.
pub fn now_micros() -> u64 {
    let ts = clock_gettime(libc::CLOCK_MONOTONIC);
    ts.tv_sec as u64 * 1_000_000 + ts.tv_nsec as u64 / 1_000
}

/// Computes the absolute wall-clock deadline `from_now` in the future, in the
/// form the kernel's timed semaphore wait expects.
pub fn realtime_deadline(from_now: Duration) -> libc::timespec {
    let mut ts = clock_gettime(libc::CLOCK_REALTIME);
    ts.tv_sec += from_now.as_secs() as libc::time_t;
    ts.tv_nsec += from_now.subsec_nanos() as libc::c_long;
    if ts.tv_nsec >= 1_000_000_000 {
        ts.tv_sec += 1;
        ts.tv_nsec -= 1_000_000_000;
    }
    ts
}

fn clock_gettime(clock: libc::clockid_t) -> libc::timespec {
    let mut ts = MaybeUninit::<libc::timespec>::uninit();
    // SAFETY: `ts` is valid storage for a timespec; the clock ids used in
    // this module are required to exist on all supported kernels.
    let rc = unsafe { libc::clock_gettime(clock, ts.as_mut_ptr()) };
    debug_assert!(rc == 0, "clock_gettime failed (errno {})", crate::last_errno());
    // SAFETY: written by clock_gettime above.
    unsafe { ts.assume_init() }
}
