//! # vos-time
//!
//! One-shot millisecond timers for the vos OS-abstraction layer.
//!
//! Every thread control block carries one of these as its task-timer slot,
//! so the type is deliberately small: create with an optional callback,
//! [`set`](Timer::set) to arm, [`cancel`](Timer::cancel) to disarm, drop to
//! tear down. The lifecycle core only requires that the timer can be created
//! and destroyed; firing semantics exist for the task-timer helpers layered
//! on top.

mod timer;

#[doc(inline)]
pub use self::timer::{Timer, TimerCreateError, TimerFn};
