//! # vos-sys-thread
//!
//! Thread lifecycle management for the vos OS-abstraction layer.
//!
//! This crate is the heart of the platform backend: it maps the OSAL's
//! uniform thread API onto native kernel threads. A caller-owned
//! [`Thread`] control block is populated by [`create`], a trampoline runs on
//! the new native thread to register it, emulate TLS if configured, invoke
//! the user entry function and signal completion, and [`join`] consumes that
//! signal and tears the synchronization objects down.
//!
//! Process-wide state — the Global Lock, the live-thread registry and the
//! TLS key space — is owned by a [`Context`] created at process start and
//! passed by reference, so its lifecycle is explicit and multiple contexts
//! can coexist in tests.
//!
//! ## Ownership contract
//!
//! The [`Thread`] storage belongs to the creating caller and must stay in
//! place, unmoved and untouched, until the thread is joined; [`create`] and
//! [`join`] are `unsafe fn`s carrying that contract, since the running
//! native thread writes into the block through a raw pointer. A thread that
//! was created but never joined leaks its kernel-side resources; that is
//! the caller's responsibility, exactly as on the other backends of this
//! abstraction.

mod context;
mod registry;
mod task_timer;
mod thread_impl;
#[cfg(feature = "tls-emulation")]
mod tls;

pub use context::Context;
pub use thread_impl::*;
#[cfg(feature = "tls-emulation")]
pub use tls::{NUM_TLS_SLOTS, TlsKey, TlsKeyCreateError};
pub use vos_time::{TimerCreateError, TimerFn};
