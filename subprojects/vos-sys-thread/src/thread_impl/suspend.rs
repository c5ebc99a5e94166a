//! Cooperative suspend and resume on the control block's suspend semaphore.

use super::info::Thread;
use crate::Context;

impl Context {
    /// Suspends the calling thread until another thread calls [`resume`] on
    /// its control block.
    ///
    /// Purely cooperative: the thread parks itself on its own suspend
    /// semaphore, so only code inside the thread can suspend it. A resume
    /// issued before the pause is not lost — the semaphore counts it and the
    /// pause returns immediately.
    ///
    /// # Panics
    /// Panics if called from a thread this context does not know about.
    pub fn thread_pause(&self) {
        let Some(tcb) = self.current_thread() else {
            panic!("thread_pause called outside a thread of this context");
        };

        // SAFETY: the suspend semaphore exists from create until join, and
        // join cannot run while this thread is still executing.
        let suspend = unsafe {
            match (*tcb.as_ptr()).suspend.as_ref() {
                Some(sem) => sem,
                None => panic!("thread_pause: suspend semaphore missing"),
            }
        };
        suspend.wait();
    }
}

/// Wakes a thread parked in [`Context::thread_pause`].
///
/// May be called from any thread while `thread` is created-and-not-joined.
///
/// # Panics
/// Panics on a control block that is invalid or already joined.
pub fn resume(thread: &Thread) {
    assert!(thread.is_valid(), "resume: invalid thread control block");
    let Some(suspend) = thread.suspend.as_ref() else {
        panic!("resume: thread already joined");
    };
    suspend.post();
}
