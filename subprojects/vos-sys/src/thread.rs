//! Native thread management for the host kernel.
//!
//! This module provides a thin wrapper around the kernel's thread-creation
//! facility. Threads are created **detached**: the OSAL layered on top never
//! uses the kernel's own join mechanism — thread completion is signalled
//! through a semaphore owned by the thread control block one layer up, which
//! mirrors how the abstraction behaves on kernels whose native threads cannot
//! be joined at all.

use std::{
    ffi::CString,
    mem::MaybeUninit,
    os::raw::{c_int, c_void},
};

/// Entry point type for a native thread.
///
/// This is the raw calling convention the kernel hands control to; the OSAL's
/// two user-facing entry conventions are dispatched by a trampoline of this
/// type one layer up.
pub type NativeEntry = extern "C" fn(*mut c_void) -> *mut c_void;

/// A handle to a native kernel thread.
///
/// Handles are plain identifiers; they do not own the thread and may be
/// freely copied. A handle stays meaningful only while the thread it names is
/// alive.
#[derive(Clone, Copy, Debug)]
pub struct Handle(libc::pthread_t);

impl Handle {
    /// Returns `true` if `self` and `other` name the same native thread.
    ///
    /// Thread identifiers are opaque; the kernel's own comparison must be
    /// used rather than a bitwise equality check.
    pub fn same_as(&self, other: &Handle) -> bool {
        // SAFETY: pthread_equal only compares identifier values.
        unsafe { libc::pthread_equal(self.0, other.0) != 0 }
    }
}

/// Returns a [`Handle`] for the calling thread.
pub fn current() -> Handle {
    // SAFETY: pthread_self has no preconditions and cannot fail.
    Handle(unsafe { libc::pthread_self() })
}

/// Creates and schedules a new detached native thread running `entry(arg)`.
///
/// * `entry` – the raw entry function the kernel transfers control to.
/// * `arg` – opaque argument forwarded unchanged to `entry`.
/// * `stack_size` – requested stack size in bytes; `0` keeps the kernel
///   default. Non-zero values are rounded up to the kernel minimum.
/// * `name` – human-readable thread name, applied best-effort (the kernel
///   bounds names to [`NATIVE_NAME_LEN`] bytes and we truncate silently).
///
/// On success the thread has been *requested*; it may or may not have started
/// running by the time this returns. Because the thread is detached, the
/// returned [`Handle`] must not be passed to any kernel join facility.
pub fn create(
    entry: NativeEntry,
    arg: *mut c_void,
    stack_size: usize,
    name: &str,
) -> Result<Handle, CreateThreadError> {
    let mut attr = MaybeUninit::<libc::pthread_attr_t>::uninit();

    // SAFETY: pthread_attr_init initialises the storage we hand it; the only
    // documented failure is memory exhaustion.
    let rc = unsafe { libc::pthread_attr_init(attr.as_mut_ptr()) };
    if rc != 0 {
        return Err(CreateThreadError::OutOfMemory);
    }
    // SAFETY: initialised just above.
    let mut attr = unsafe { attr.assume_init() };

    // SAFETY: `attr` is a valid, initialised attribute object and the
    // detach-state constant is one of the two documented values.
    unsafe {
        libc::pthread_attr_setdetachstate(&mut attr, libc::PTHREAD_CREATE_DETACHED);
    }

    if stack_size > 0 {
        let size = stack_size.max(min_stack_size());
        // SAFETY: `size` is at least the kernel minimum, which is the only
        // precondition pthread_attr_setstacksize documents.
        unsafe {
            libc::pthread_attr_setstacksize(&mut attr, size);
        }
    }

    // SAFETY: all-zero bits are a valid placeholder for an identifier that is
    // only read back after pthread_create reports success.
    let mut native: libc::pthread_t = unsafe { std::mem::zeroed() };

    // SAFETY: `attr` is valid, `entry` matches the required signature and
    // `arg` is forwarded opaquely; the new thread takes no references into
    // our stack frame.
    let rc = unsafe { libc::pthread_create(&mut native, &attr, entry, arg) };

    // SAFETY: `attr` was initialised above and is not used past this point.
    unsafe {
        libc::pthread_attr_destroy(&mut attr);
    }

    if rc != 0 {
        return Err(match rc {
            libc::EAGAIN => CreateThreadError::OutOfResource,
            libc::EPERM => CreateThreadError::PermissionDenied,
            libc::EINVAL => CreateThreadError::InvalidAttributes,
            other => CreateThreadError::Unknown(other),
        });
    }

    let handle = Handle(native);
    set_name(&handle, name);
    Ok(handle)
}

/// Maximum native thread-name length, excluding the NUL terminator.
pub const NATIVE_NAME_LEN: usize = 15;

/// Applies a human-readable name to a native thread, best-effort.
///
/// Names longer than [`NATIVE_NAME_LEN`] bytes are truncated; interior NUL
/// bytes and kernel refusals are ignored — naming is purely diagnostic.
pub fn set_name(handle: &Handle, name: &str) {
    // Back off to a char boundary so the truncated name stays valid UTF-8.
    let mut end = name.len().min(NATIVE_NAME_LEN);
    while end > 0 && !name.is_char_boundary(end) {
        end -= 1;
    }
    let Ok(cname) = CString::new(&name.as_bytes()[..end]) else {
        return;
    };

    #[cfg(target_os = "linux")]
    // SAFETY: `cname` is a valid NUL-terminated string of at most
    // NATIVE_NAME_LEN bytes; a stale handle at worst makes the call fail.
    unsafe {
        libc::pthread_setname_np(handle.0, cname.as_ptr());
    }
    #[cfg(not(target_os = "linux"))]
    let _ = cname;
}

fn min_stack_size() -> usize {
    libc::PTHREAD_STACK_MIN
}

/// Native thread creation errors.
///
/// Kernel thread-table exhaustion is reported here as a plain error; the
/// *policy* that it is fatal belongs to the lifecycle layer, not to this
/// binding.
#[derive(Debug, thiserror::Error)]
pub enum CreateThreadError {
    /// Attribute storage could not be initialised.
    #[error("Out of memory")]
    OutOfMemory,
    /// The kernel is out of thread resources or the thread limit was reached.
    #[error("Out of native thread resources")]
    OutOfResource,
    /// The caller lacks permission for the requested scheduling parameters.
    #[error("Permission denied")]
    PermissionDenied,
    /// The attribute object was rejected by the kernel.
    #[error("Invalid thread attributes")]
    InvalidAttributes,
    /// Any unforeseen kernel error, carrying the raw error number.
    #[error("Unknown error: {0}")]
    Unknown(c_int),
}
