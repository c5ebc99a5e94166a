//! Thread creation and the entry trampoline.

use std::{os::raw::c_void, ptr::NonNull, sync::Arc};

use arrayvec::ArrayString;
use vos_sys::thread as sys;
use vos_sys_sync::{SemInitError, Semaphore};

use super::info::{MAGIC, THREAD_NAME_LEN, Thread, ThreadAttr, ThreadEntry};
use crate::{Context, task_timer::TaskTimerSlot};
#[cfg(feature = "tls-emulation")]
use crate::tls::TlsSlots;

/// Creates a new thread.
///
/// Populates the caller-owned control block, creates its synchronization
/// objects and asks the kernel to schedule a new native thread running the
/// entry trampoline. Success means the native thread has been *requested*,
/// not that it has started running; in particular the block's native-handle
/// back-reference is filled in by the trampoline and must not be read by the
/// creator without synchronizing through [`join`](crate::join).
///
/// `thread` may be a fresh [`Thread::new`] value or one whose previous
/// thread has been joined; it is fully re-populated here. Handing in the
/// block of a still-running thread is a caller error with undefined results.
///
/// Failure to create either semaphore aborts the operation and propagates
/// that status without creating a native thread. No rollback of an already
/// created first semaphore is attempted on that path; it is released
/// whenever the caller drops or reuses the block (a deliberate match for the
/// reference behaviour of this backend family).
///
/// # Safety
/// On success the new native thread keeps writing into `*thread` through a
/// raw pointer until [`join`](crate::join) on the same block returns. The
/// caller must keep the storage in place for that whole span: the block must
/// not be moved, dropped or otherwise accessed (except through
/// [`join`](crate::join) and [`resume`](crate::resume)) while the thread it
/// names is running. On error no native thread exists and the block may be
/// used freely.
///
/// # Panics
/// Native thread creation failure is treated as unrecoverable: kernel
/// thread-table exhaustion at this layer has no graceful recovery path, so
/// the process panics after logging the kernel status.
pub unsafe fn create(
    ctx: &Arc<Context>,
    thread: &mut Thread,
    name: &str,
    attrs: Option<&ThreadAttr>,
    entry: ThreadEntry,
    arg: *mut c_void,
) -> Result<(), ThreadCreateError> {
    if name.is_empty() {
        return Err(ThreadCreateError::EmptyName);
    }

    let attrs = attrs.copied().unwrap_or_default();

    *thread = Thread::new();
    thread.magic = MAGIC;
    thread.name = bounded_name(name);
    thread.entry = Some(entry);
    thread.arg = arg;
    thread.ctx = Some(Arc::clone(ctx));

    thread.wait = Some(Semaphore::new(0)?);
    thread.suspend = Some(Semaphore::new(0)?);

    // Best-effort: a missing task-timer slot degrades the task-timer
    // helpers, not the lifecycle.
    thread.task_timer = Some(TaskTimerSlot::new());

    let tcb = thread as *mut Thread as *mut c_void;
    if let Err(err) = sys::create(trampoline, tcb, attrs.stack_size, name) {
        log::error!("native thread creation for '{name}' failed: {err}");
        panic!("native thread creation failed: {err}");
    }

    log::trace!("thread '{}' requested", thread.name());
    Ok(())
}

/// Wrapper function that actually runs on the newly scheduled native thread.
///
/// Bridges registry bookkeeping and the user entry point: it records the
/// native handle, registers the thread in the live-thread registry, sets up
/// TLS emulation if configured, dispatches whichever entry convention was
/// recorded at creation, stores the exit payload, deregisters and posts the
/// completion semaphore exactly once. No other code is permitted to post
/// that semaphore.
extern "C" fn trampoline(arg: *mut c_void) -> *mut c_void {
    // SAFETY: `create` passes a pointer derived from a caller-owned
    // `&mut Thread`, which is never null.
    let tcb = unsafe { NonNull::new_unchecked(arg as *mut Thread) };
    let raw = tcb.as_ptr();

    // SAFETY: the creator populated the block before requesting this thread
    // and agreed not to touch it until join; until the completion post below
    // this thread is the only writer.
    unsafe {
        assert!((*raw).is_valid(), "thread trampoline: corrupt thread control block");
        (*raw).handle = Some(sys::current());
    }

    // SAFETY: a fully populated block always carries its context.
    let Some(ctx) = (unsafe { (*raw).ctx.clone() }) else {
        panic!("thread trampoline: thread control block has no context");
    };

    // Registration must precede the entry call so `current_thread` works
    // from the moment user code runs.
    ctx.register_thread(tcb);

    #[cfg(feature = "tls-emulation")]
    // SAFETY: still the only writer; runs after registry registration and
    // before the entry call, as the TLS ordering contract requires.
    unsafe {
        (*raw).tls_slots = Some(Box::new(TlsSlots::new()));
    }

    // SAFETY: entry and arg were recorded at creation and are not written
    // again until the block is reused.
    let (entry, entry_arg) = unsafe { ((*raw).entry, (*raw).arg) };
    let ret = match entry {
        Some(ThreadEntry::Modern(f)) => f(entry_arg),
        Some(ThreadEntry::Legacy(f)) => {
            f(0, entry_arg);
            std::ptr::null_mut()
        }
        None => panic!("thread trampoline: no entry point recorded"),
    };

    // SAFETY: single writer until the completion post. An explicit
    // thread_exit payload wins over the entry function's return value.
    unsafe {
        if !(*raw).exited {
            (*raw).exit_data = ret;
        }
    }

    #[cfg(feature = "tls-emulation")]
    // SAFETY: the entry function has returned; its TLS values die with it.
    unsafe {
        (*raw).tls_slots = None;
    }

    ctx.deregister_thread(tcb);
    log::trace!("thread exiting");
    drop(ctx);

    // SAFETY: the completion semaphore exists from create until join, and
    // join cannot tear it down before the post below wakes it.
    let wait: *const Semaphore = unsafe {
        match (*raw).wait.as_ref() {
            Some(sem) => sem,
            None => panic!("thread trampoline: completion semaphore missing"),
        }
    };

    // The single synchronization point join relies on. After this post the
    // joiner owns the block again, so nothing below may touch `tcb`.
    // SAFETY: posting a semaphore with a live waiter (or a pending join) is
    // the kernel primitive's self-synchronizing hand-off.
    unsafe {
        (*wait).post();
    }

    std::ptr::null_mut()
}

fn bounded_name(name: &str) -> ArrayString<THREAD_NAME_LEN> {
    let mut stored = ArrayString::new();
    for ch in name.chars() {
        if stored.try_push(ch).is_err() {
            break;
        }
    }
    stored
}

/// Thread creation errors.
///
/// Only resource exhaustion at synchronization-object creation is
/// recoverable; native-thread creation failure panics (see [`create`]) and
/// contract violations assert.
#[derive(Debug, thiserror::Error)]
pub enum ThreadCreateError {
    /// A thread must have a non-empty name.
    #[error("Thread name must not be empty")]
    EmptyName,
    /// One of the control block's semaphores could not be created.
    #[error("Semaphore creation failed: {0}")]
    Semaphore(#[from] SemInitError),
}
