//! Explicit thread exit.

use std::os::raw::c_void;

use crate::Context;

impl Context {
    /// Records `data` as the calling thread's exit payload.
    ///
    /// Callable only from within a thread created through this context. The
    /// native thread is **not** terminated: immediate termination would leak
    /// kernel-side bookkeeping on this backend family, so actual termination
    /// happens only when the entry function returns control to the
    /// trampoline. Nothing here unwinds or aborts the entry function's
    /// remaining code — a caller of this function must itself return
    /// promptly. That asymmetry versus a true thread-termination primitive
    /// is part of the contract.
    ///
    /// Once a payload has been recorded here, the entry function's own
    /// return value no longer replaces it.
    ///
    /// # Panics
    /// Panics if called from a thread this context does not know about.
    pub fn thread_exit(&self, data: *mut c_void) {
        let Some(tcb) = self.current_thread() else {
            panic!("thread_exit called outside a thread of this context");
        };

        // SAFETY: only the owning thread writes its exit fields while it is
        // running, and the joiner reads them only after the completion post.
        unsafe {
            let raw = tcb.as_ptr();
            (*raw).exit_data = data;
            (*raw).exited = true;
        }
    }
}
