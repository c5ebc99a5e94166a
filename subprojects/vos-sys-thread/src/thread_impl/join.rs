//! Thread join: consuming the completion signal and tearing down resources.

use std::os::raw::c_void;

use super::info::Thread;

/// Waits for the thread behind `thread` to finish and retrieves its exit
/// payload.
///
/// Blocks the calling thread — not the process — on the completion
/// semaphore until the trampoline posts it; if the thread has already
/// finished, the wait returns immediately (ordinary counting-semaphore
/// behaviour, no special case). On wake the stored exit payload is written
/// to `data_out` if one was supplied, and the block's semaphores and timer
/// slot are destroyed. The block's storage itself stays with the caller.
///
/// At most one join is permitted per created thread, and only after
/// [`create`](crate::create) returned success for this block;
/// concurrent joins on the same block are a caller error. Once the
/// preconditions hold the operation cannot fail, so nothing is returned.
///
/// # Safety
/// `thread` must be the same storage a successful
/// [`create`](crate::create) populated, still at the same address, and no
/// other thread may access the block for the duration of the call. When the
/// block was never created (or is already joined) there is no native thread
/// aliasing it and the call merely panics.
///
/// # Panics
/// Panics on contract violation: a block `create` never initialised (or
/// whose magic has been corrupted), or one that has already been joined.
pub unsafe fn join(thread: &mut Thread, data_out: Option<&mut *mut c_void>) {
    assert!(thread.is_valid(), "join: invalid thread control block");

    thread.joined = true;

    {
        let Some(wait) = thread.wait.as_ref() else {
            panic!("join: thread already joined");
        };
        wait.wait();
    }

    // The trampoline has posted and no longer touches the block; the joiner
    // is the single reader from here on.
    if let Some(out) = data_out {
        *out = thread.exit_data;
    }

    // Tear down the resources created by `create`.
    thread.wait = None;
    thread.suspend = None;
    thread.task_timer = None;
    thread.ctx = None;

    log::trace!("thread '{}' joined", thread.name());
}
