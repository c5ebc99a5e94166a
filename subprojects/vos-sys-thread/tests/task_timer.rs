//! Task-timer helper tests: arming and cancelling from inside a thread.

use std::{
    os::raw::c_void,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use vos_sys_thread::{Context, Thread, ThreadEntry, create, join};

struct Job {
    ctx: *const Context,
    fired: AtomicUsize,
}

fn on_fire(arg: *mut c_void) {
    let job = unsafe { &*(arg as *const Job) };
    job.fired.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn armed_task_timer_fires() {
    fn entry(arg: *mut c_void) -> *mut c_void {
        let job = unsafe { &*(arg as *const Job) };
        let ctx = unsafe { &*job.ctx };

        ctx.task_timer_set(on_fire, arg, 20).unwrap();

        let start = Instant::now();
        while job.fired.load(Ordering::SeqCst) == 0 && start.elapsed() < Duration::from_secs(5) {
            std::thread::sleep(Duration::from_millis(5));
        }
        ctx.task_timer_cancel();
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let job = Box::new(Job {
        ctx: &*ctx,
        fired: AtomicUsize::new(0),
    });
    let job_ptr = &*job as *const Job as *mut c_void;

    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "timed", None, ThreadEntry::Modern(entry), job_ptr).unwrap();
        join(&mut thread, None);
    }
    assert_eq!(job.fired.load(Ordering::SeqCst), 1);
}

#[test]
fn cancelled_task_timer_never_fires() {
    fn entry(arg: *mut c_void) -> *mut c_void {
        let job = unsafe { &*(arg as *const Job) };
        let ctx = unsafe { &*job.ctx };

        ctx.task_timer_set(on_fire, arg, 500).unwrap();
        ctx.task_timer_cancel();
        // The cancel waits out the worker, so a late fire would already
        // have happened by now.
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let job = Box::new(Job {
        ctx: &*ctx,
        fired: AtomicUsize::new(0),
    });
    let job_ptr = &*job as *const Job as *mut c_void;

    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "cancelled", None, ThreadEntry::Modern(entry), job_ptr).unwrap();
        join(&mut thread, None);
    }
    assert_eq!(job.fired.load(Ordering::SeqCst), 0);
}
