//! Per-thread task-timer helpers.
//!
//! Every control block carries a timer slot from creation so these helpers
//! have somewhere to work; the slot is torn down by join. The slot starts as
//! a callback-less placeholder timer — arming replaces it with a timer that
//! carries the requested callback, cancelling tears the armed timer down
//! again.

use std::os::raw::c_void;

use vos_time::{Timer, TimerCreateError, TimerFn};

use crate::Context;

/// Fixed name for every per-thread task timer.
const TASK_TIMER_NAME: &str = "TaskTimer";

/// The control block's timer slot.
pub(crate) struct TaskTimerSlot {
    timer: Option<Timer>,
    armed: bool,
}

impl TaskTimerSlot {
    /// Creates the slot with its unarmed placeholder timer, best-effort: a
    /// kernel refusal leaves the slot empty and only degrades the task-timer
    /// helpers.
    pub(crate) fn new() -> Self {
        let timer = match Timer::new(TASK_TIMER_NAME, None, std::ptr::null_mut()) {
            Ok(timer) => Some(timer),
            Err(err) => {
                log::warn!("task timer slot unavailable: {err}");
                None
            }
        };
        Self { timer, armed: false }
    }
}

impl Context {
    /// Arms the calling thread's task timer to invoke `callback(arg)` once,
    /// `ms` milliseconds from now, on the timer's worker thread.
    ///
    /// # Panics
    /// Panics if called from a thread this context does not know about, or
    /// if the calling thread's task timer is already armed — arming twice
    /// without an intervening
    /// [`task_timer_cancel`](Self::task_timer_cancel) is a contract
    /// violation.
    pub fn task_timer_set(
        &self,
        callback: TimerFn,
        arg: *mut c_void,
        ms: u32,
    ) -> Result<(), TimerCreateError> {
        let Some(tcb) = self.current_thread() else {
            panic!("task_timer_set called outside a thread of this context");
        };

        // SAFETY: the slot belongs to the calling thread; nobody else
        // touches it while the thread is running.
        let slot = unsafe {
            match (*tcb.as_ptr()).task_timer.as_mut() {
                Some(slot) => slot,
                None => panic!("task_timer_set: timer slot missing"),
            }
        };
        assert!(!slot.armed, "task_timer_set: task timer already armed");

        // Swap the placeholder for a timer carrying the real callback.
        let timer = Timer::new(TASK_TIMER_NAME, Some(callback), arg)?;
        timer.set(ms);
        slot.timer = Some(timer);
        slot.armed = true;
        Ok(())
    }

    /// Cancels and tears down the calling thread's armed task timer.
    ///
    /// Safe to call with nothing armed; the next
    /// [`task_timer_set`](Context::task_timer_set) starts from scratch.
    ///
    /// # Panics
    /// Panics if called from a thread this context does not know about.
    pub fn task_timer_cancel(&self) {
        let Some(tcb) = self.current_thread() else {
            panic!("task_timer_cancel called outside a thread of this context");
        };

        // SAFETY: as in `task_timer_set`.
        let slot = unsafe {
            match (*tcb.as_ptr()).task_timer.as_mut() {
                Some(slot) => slot,
                None => panic!("task_timer_cancel: timer slot missing"),
            }
        };
        if let Some(timer) = slot.timer.take() {
            timer.cancel();
            // Dropping waits for the worker, so the callback cannot fire
            // after this returns.
        }
        slot.armed = false;
    }
}
