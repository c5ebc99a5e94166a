//! The OSAL context: process-wide state with an explicit owner.
//!
//! The Global Lock, the live-thread registry and (when configured) the TLS
//! key space are the only process-wide mutable structures this backend
//! touches. Rather than file-level statics they live in a single [`Context`]
//! object created at process start and passed by reference, which keeps the
//! lifecycle explicit and lets tests run several isolated contexts side by
//! side.

use std::{ptr::NonNull, sync::Arc};

use vos_sys::thread as sys;
use vos_sys_sync::{Mutex, Once};

use crate::{Thread, registry::Registry};
#[cfg(feature = "tls-emulation")]
use crate::tls::KeySpace;

/// Process-wide OSAL state.
///
/// Handed out as `Arc<Context>` because every running thread keeps a
/// back-reference for registry bookkeeping; the context must outlive all
/// threads created through it, and the reference count enforces that.
pub struct Context {
    /// The Global Lock: guards the registry, the once-guard slow path and
    /// whatever coarse shared bookkeeping upper layers put under it.
    global: Mutex,
    registry: Registry,
    #[cfg(feature = "tls-emulation")]
    pub(crate) tls_keys: KeySpace,
}

impl Context {
    /// Creates a fresh context with an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            global: Mutex::new(),
            registry: Registry::new(),
            #[cfg(feature = "tls-emulation")]
            tls_keys: KeySpace::new(),
        })
    }

    /// Acquires the Global Lock, blocking until it is available.
    ///
    /// Non-reentrant; pair every acquisition with
    /// [`global_unlock`](Self::global_unlock) on the same thread.
    pub fn global_lock(&self) {
        self.global.lock();
    }

    /// Releases the Global Lock.
    pub fn global_unlock(&self) {
        self.global.unlock();
    }

    /// Runs `init` exactly once across all callers racing on `guard`,
    /// serialised by this context's Global Lock.
    ///
    /// See [`Once::call_once`] for the full contract; every guard used with
    /// a context must always be used with that same context.
    pub fn once(&self, guard: &Once, init: impl FnOnce()) {
        guard.call_once(&self.global, init);
    }

    /// Looks up the control block of the calling thread, if the calling
    /// thread was created through this context and is still registered.
    ///
    /// The returned pointer stays valid while the thread is alive; callers
    /// that are not the thread itself must not dereference it without their
    /// own synchronization.
    pub fn current_thread(&self) -> Option<NonNull<Thread>> {
        let native = sys::current();
        self.global.lock();
        // SAFETY: Global Lock held.
        let found = unsafe { self.registry.find_native(&native) };
        self.global.unlock();
        found
    }

    /// Runs `f` on every thread currently live in this context, in
    /// registration order, with the Global Lock held for the whole
    /// traversal.
    ///
    /// `f` must not take the Global Lock itself or call anything that does
    /// (creating, joining or looking up threads of this context included);
    /// doing so deadlocks.
    pub fn for_each_thread(&self, f: impl FnMut(&Thread)) {
        self.global.lock();
        // SAFETY: Global Lock held for the whole traversal.
        unsafe { self.registry.for_each(f) };
        self.global.unlock();
    }

    /// Number of threads currently registered as live in this context.
    pub fn live_threads(&self) -> usize {
        self.global.lock();
        // SAFETY: Global Lock held.
        let count = unsafe { self.registry.len() };
        self.global.unlock();
        count
    }

    /// Registers a thread whose trampoline has begun executing.
    ///
    /// Called by the trampoline only, after it has recorded its native
    /// handle into the block.
    pub(crate) fn register_thread(&self, tcb: NonNull<Thread>) {
        // SAFETY: the trampoline recorded the handle immediately before
        // calling in, and is the block's only writer at this point.
        let Some(native) = (unsafe { (*tcb.as_ptr()).handle }) else {
            panic!("register_thread: native handle not recorded");
        };
        self.global.lock();
        // SAFETY: Global Lock held; the block outlives its registration by
        // the lifecycle contract.
        unsafe { self.registry.insert(tcb, native) };
        self.global.unlock();
    }

    /// Removes a thread on its way out. Called by the trampoline only.
    pub(crate) fn deregister_thread(&self, tcb: NonNull<Thread>) {
        self.global.lock();
        // SAFETY: Global Lock held.
        unsafe { self.registry.remove(tcb) };
        self.global.unlock();
    }
}
