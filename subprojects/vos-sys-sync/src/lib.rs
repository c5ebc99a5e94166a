//! # vos-sys-sync
//!
//! Owned synchronization primitives for the vos OS-abstraction layer.
//!
//! Three primitives live here, each a direct counterpart of something the
//! thread-lifecycle core depends on:
//!
//! - [`Mutex`] — the non-reentrant blocking lock used as the OSAL's Global
//!   Lock. Blocking acquisition only; there is deliberately no try-lock.
//! - [`Semaphore`] — a counting semaphore with create/wait/post semantics.
//!   The thread control block embeds two of these (completion and suspend).
//! - [`Once`] — the double-checked one-time-execution guard, layered on an
//!   atomic flag plus a caller-supplied [`Mutex`] for the slow path.

mod mutex;
mod once;
mod semaphore;

#[doc(inline)]
pub use self::{mutex::Mutex, once::Once, semaphore::Semaphore};
pub use vos_sys::sync::{SemInitError, TimedOut};
