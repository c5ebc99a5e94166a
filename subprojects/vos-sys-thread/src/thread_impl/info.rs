//! The thread control block and its creation-time parameters.

use std::{os::raw::c_void, ptr, sync::Arc};

use arrayvec::ArrayString;
use static_assertions::const_assert;
use vos_sys::thread as sys;
use vos_sys_sync::Semaphore;

use crate::{Context, task_timer::TaskTimerSlot};
#[cfg(feature = "tls-emulation")]
use crate::tls::TlsSlots;

/// Maximum stored thread-name length in bytes. Longer names are silently
/// truncated, as on the other backends of this abstraction.
pub const THREAD_NAME_LEN: usize = 32;

// The native layer truncates further for the kernel; the stored name must
// never be the shorter of the two.
const_assert!(THREAD_NAME_LEN >= sys::NATIVE_NAME_LEN);

/// Default stack size for threads whose attributes do not request one.
pub const DEFAULT_STACK_SIZE: usize = 128 * 1024;

/// Sentinel marking a control block that [`create`](crate::create)
/// has fully initialised. Operations on a block failing this check are
/// programming errors, not runtime errors.
pub(crate) const MAGIC: u32 = 0x564f_5354; // "VOST"

/// A user-supplied thread entry point.
///
/// The two calling conventions are a tagged variant selected at creation
/// time rather than a flag plus a function-pointer cast, so no unsafe
/// reinterpretation is ever needed to dispatch them.
#[derive(Clone, Copy, Debug)]
pub enum ThreadEntry {
    /// The current convention: one opaque argument in, one opaque result
    /// out. The result becomes the join payload.
    Modern(fn(*mut c_void) -> *mut c_void),
    /// The backward-compatible convention retained for older call sites: an
    /// integer (always `0` on this backend) and an opaque argument, no
    /// return value. The join payload is null.
    Legacy(fn(i32, *mut c_void)),
}

/// Creation-time thread attributes.
#[derive(Clone, Copy, Debug)]
pub struct ThreadAttr {
    /// Requested stack size in bytes; rounded up to the kernel minimum.
    pub stack_size: usize,
}

impl Default for ThreadAttr {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// The thread control block.
///
/// One per logical thread, owned by the caller that created it — not by the
/// native thread. The storage must stay where it is, untouched, from
/// [`create`](crate::create) until [`join`](crate::join)
/// returns; both functions are `unsafe` with exactly that storage contract.
/// Only the embedded resources are torn down by join, never the struct
/// itself.
///
/// Reuse after a completed join is permitted because `create` fully
/// re-populates the block, but a block must never be handed to `create`
/// while a previous thread of it is still running.
pub struct Thread {
    pub(crate) magic: u32,
    pub(crate) name: ArrayString<THREAD_NAME_LEN>,
    pub(crate) entry: Option<ThreadEntry>,
    pub(crate) arg: *mut c_void,
    /// Completion semaphore: posted exactly once by the trampoline at exit,
    /// waited on by join.
    pub(crate) wait: Option<Semaphore>,
    /// Suspend semaphore for pause/resume.
    pub(crate) suspend: Option<Semaphore>,
    /// Per-thread timer slot, created at creation time so the task-timer
    /// helpers have somewhere to work without further setup.
    pub(crate) task_timer: Option<TaskTimerSlot>,
    pub(crate) exit_data: *mut c_void,
    /// Set by `Context::thread_exit`; once set, the entry function's own
    /// return value no longer overwrites the payload.
    pub(crate) exited: bool,
    /// Native-handle back-reference, recorded by the trampoline once it
    /// begins executing. Not available to the creator before that point.
    pub(crate) handle: Option<sys::Handle>,
    pub(crate) joined: bool,
    pub(crate) ctx: Option<Arc<Context>>,
    #[cfg(feature = "tls-emulation")]
    pub(crate) tls_slots: Option<Box<TlsSlots>>,
}

impl Thread {
    /// Creates an empty, not-yet-created control block.
    pub fn new() -> Self {
        Self {
            magic: 0,
            name: ArrayString::new(),
            entry: None,
            arg: ptr::null_mut(),
            wait: None,
            suspend: None,
            task_timer: None,
            exit_data: ptr::null_mut(),
            exited: false,
            handle: None,
            joined: false,
            ctx: None,
            #[cfg(feature = "tls-emulation")]
            tls_slots: None,
        }
    }

    /// The thread's human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}
