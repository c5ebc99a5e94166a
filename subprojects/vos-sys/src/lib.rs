//! # vos-sys
//!
//! Raw host-kernel bindings for the vos OS-abstraction layer.
//!
//! This crate is the lowest layer of the backend: thin, typed wrappers around
//! the kernel facilities that the rest of the OSAL is built on — native
//! thread creation, unnamed semaphores, the process-wide mutex primitive and
//! the monotonic clock. Each wrapper maps almost one-to-one to the underlying
//! kernel call while translating raw `errno` values into strongly typed Rust
//! error enums.
//!
//! Nothing in this crate owns resources; ownership lives one layer up (see
//! `vos-sys-sync` and `vos-sys-thread`). The functions here operate on raw
//! pointers and handles exactly the way the kernel does.

pub mod sync;
pub mod thread;
pub mod time;

/// Reads the calling thread's `errno`-style error for the last failed call.
pub(crate) fn last_errno() -> std::os::raw::c_int {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
