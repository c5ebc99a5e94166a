//! End-to-end lifecycle tests: create, trampoline, exit, join, once.

use std::{
    os::raw::c_void,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use vos_sys_sync::Once;
use vos_sys_thread::{Context, Thread, ThreadAttr, ThreadEntry, create, join, resume};

static SENTINEL: u8 = 0;

fn sentinel() -> *mut c_void {
    &SENTINEL as *const u8 as *mut c_void
}

#[test]
fn join_returns_the_entry_result() {
    fn entry(arg: *mut c_void) -> *mut c_void {
        arg
    }

    let ctx = Context::new();
    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "worker", None, ThreadEntry::Modern(entry), sentinel()).unwrap();
    }

    let mut data = std::ptr::null_mut();
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, Some(&mut data)) };
    assert_eq!(data, sentinel());
}

#[test]
fn legacy_entry_always_yields_null() {
    static RAN: AtomicUsize = AtomicUsize::new(0);
    fn legacy(zero: i32, _arg: *mut c_void) {
        assert_eq!(zero, 0);
        RAN.fetch_add(1, Ordering::SeqCst);
    }

    let ctx = Context::new();
    let mut thread = Thread::new();
    // Non-null argument on purpose: the payload must still come out null.
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "legacy", None, ThreadEntry::Legacy(legacy), sentinel()).unwrap();
    }

    let mut data = sentinel();
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, Some(&mut data)) };
    assert!(data.is_null());
    assert_eq!(RAN.load(Ordering::SeqCst), 1);
}

#[test]
fn explicit_exit_payload_wins_over_return_value() {
    fn entry(arg: *mut c_void) -> *mut c_void {
        // `arg` is the context; record an explicit payload, then return a
        // different one. The explicit payload must survive.
        let ctx = unsafe { &*(arg as *const Context) };
        ctx.thread_exit(sentinel());
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let ctx_ptr = &*ctx as *const Context as *mut c_void;
    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "exiter", None, ThreadEntry::Modern(entry), ctx_ptr).unwrap();
    }

    let mut data = std::ptr::null_mut();
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, Some(&mut data)) };
    assert_eq!(data, sentinel());
}

#[test]
fn once_runs_exactly_once_across_racing_threads() {
    struct Race {
        ctx: *const Context,
        once: Once,
        runs: AtomicUsize,
    }

    fn entry(arg: *mut c_void) -> *mut c_void {
        let race = unsafe { &*(arg as *const Race) };
        let ctx = unsafe { &*race.ctx };
        ctx.once(&race.once, || {
            race.runs.fetch_add(1, Ordering::SeqCst);
        });
        assert!(race.once.is_completed());
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let race = Box::new(Race {
        ctx: &*ctx,
        once: Once::new(),
        runs: AtomicUsize::new(0),
    });
    let race_ptr = &*race as *const Race as *mut c_void;

    const RACERS: usize = 8;
    let mut threads: Vec<Thread> = (0..RACERS).map(|_| Thread::new()).collect();
    for (i, thread) in threads.iter_mut().enumerate() {
        let name = format!("racer-{i}");
        // SAFETY: the vec is not touched again until every block is joined.
        unsafe {
            create(&ctx, thread, &name, None, ThreadEntry::Modern(entry), race_ptr).unwrap();
        }
    }
    for thread in threads.iter_mut() {
        // SAFETY: each block was populated by the create above.
        unsafe { join(thread, None) };
    }
    assert_eq!(race.runs.load(Ordering::SeqCst), 1);
}

#[test]
fn control_block_is_reusable_after_join() {
    fn entry(arg: *mut c_void) -> *mut c_void {
        arg
    }

    let ctx = Context::new();
    let mut thread = Thread::new();

    // First cycle through the same storage.
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "first", None, ThreadEntry::Modern(entry), sentinel()).unwrap();
    }
    let mut data = std::ptr::null_mut();
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, Some(&mut data)) };
    assert_eq!(data, sentinel());

    // Second cycle: create fully re-populates a joined block, so nothing of
    // the first thread may leak into the second's payload.
    // SAFETY: the previous thread is joined; the block is ours again.
    unsafe {
        create(&ctx, &mut thread, "second", None, ThreadEntry::Modern(entry), std::ptr::null_mut())
            .unwrap();
    }
    let mut data = sentinel();
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, Some(&mut data)) };
    assert!(data.is_null());

    assert_eq!(ctx.live_threads(), 0);
}

#[test]
fn join_after_completion_returns_immediately() {
    fn entry(_arg: *mut c_void) -> *mut c_void {
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "quick", None, ThreadEntry::Modern(entry), std::ptr::null_mut())
            .unwrap();
    }

    // Give the thread ample time to finish before joining.
    std::thread::sleep(Duration::from_millis(200));

    let start = Instant::now();
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, None) };
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
#[should_panic(expected = "invalid thread control block")]
fn join_rejects_a_zeroed_control_block() {
    let mut thread = Thread::new();
    // SAFETY: no native thread aliases a never-created block; the call
    // panics on the validity check before touching anything else.
    unsafe { join(&mut thread, None) };
}

#[test]
fn counter_under_global_lock_end_to_end() {
    struct Job {
        ctx: *const Context,
        counter: AtomicUsize,
    }

    fn entry(arg: *mut c_void) -> *mut c_void {
        let job = unsafe { &*(arg as *const Job) };
        let ctx = unsafe { &*job.ctx };
        ctx.global_lock();
        job.counter.fetch_add(1, Ordering::Relaxed);
        ctx.global_unlock();
        sentinel()
    }

    let ctx = Context::new();
    let job = Box::new(Job {
        ctx: &*ctx,
        counter: AtomicUsize::new(0),
    });
    let job_ptr = &*job as *const Job as *mut c_void;

    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "counter", None, ThreadEntry::Modern(entry), job_ptr).unwrap();
    }

    let mut data = std::ptr::null_mut();
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, Some(&mut data)) };
    assert_eq!(job.counter.load(Ordering::SeqCst), 1);
    assert_eq!(data, sentinel());
}

#[test]
fn current_thread_sees_its_own_control_block() {
    struct Probe {
        ctx: *const Context,
        matched: AtomicUsize,
    }

    fn entry(arg: *mut c_void) -> *mut c_void {
        let probe = unsafe { &*(arg as *const Probe) };
        let ctx = unsafe { &*probe.ctx };
        if ctx.current_thread().is_some() {
            probe.matched.fetch_add(1, Ordering::SeqCst);
        }
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let probe = Box::new(Probe {
        ctx: &*ctx,
        matched: AtomicUsize::new(0),
    });
    let probe_ptr = &*probe as *const Probe as *mut c_void;

    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "probe", None, ThreadEntry::Modern(entry), probe_ptr).unwrap();
    }
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, None) };
    assert_eq!(probe.matched.load(Ordering::SeqCst), 1);

    // The creating thread was not created through the context and must not
    // resolve to anything.
    assert!(ctx.current_thread().is_none());
}

#[test]
fn pause_parks_until_resumed() {
    struct Gate {
        ctx: *const Context,
        resumed: AtomicUsize,
    }

    fn entry(arg: *mut c_void) -> *mut c_void {
        let gate = unsafe { &*(arg as *const Gate) };
        let ctx = unsafe { &*gate.ctx };
        ctx.thread_pause();
        gate.resumed.fetch_add(1, Ordering::SeqCst);
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let gate = Box::new(Gate {
        ctx: &*ctx,
        resumed: AtomicUsize::new(0),
    });
    let gate_ptr = &*gate as *const Gate as *mut c_void;

    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "pauser", None, ThreadEntry::Modern(entry), gate_ptr).unwrap();
    }

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(gate.resumed.load(Ordering::SeqCst), 0);

    resume(&thread);
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, None) };
    assert_eq!(gate.resumed.load(Ordering::SeqCst), 1);
}

#[test]
fn visitor_sees_live_threads_by_name() {
    struct Gate {
        ctx: *const Context,
    }

    fn entry(arg: *mut c_void) -> *mut c_void {
        let gate = unsafe { &*(arg as *const Gate) };
        let ctx = unsafe { &*gate.ctx };
        ctx.thread_pause();
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let gate = Box::new(Gate { ctx: &*ctx });
    let gate_ptr = &*gate as *const Gate as *mut c_void;

    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "visitee", None, ThreadEntry::Modern(entry), gate_ptr).unwrap();
    }

    // Wait for the trampoline to register the thread.
    let start = Instant::now();
    while ctx.live_threads() == 0 && start.elapsed() < Duration::from_secs(5) {
        std::thread::sleep(Duration::from_millis(5));
    }

    let mut names = Vec::new();
    ctx.for_each_thread(|th| names.push(th.name().to_owned()));
    assert_eq!(names, ["visitee"]);

    resume(&thread);
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, None) };

    let mut names = Vec::new();
    ctx.for_each_thread(|th| names.push(th.name().to_owned()));
    assert!(names.is_empty());
}

#[test]
fn custom_stack_size_attr_is_honoured() {
    fn entry(arg: *mut c_void) -> *mut c_void {
        // Burn a little stack to prove the thread is viable.
        let buf = [0u8; 8 * 1024];
        std::hint::black_box(&buf);
        arg
    }

    let ctx = Context::new();
    let attrs = ThreadAttr {
        stack_size: 256 * 1024,
    };
    let mut thread = Thread::new();
    // SAFETY: the block stays in place until the join below returns.
    unsafe {
        create(&ctx, &mut thread, "stacky", Some(&attrs), ThreadEntry::Modern(entry), sentinel())
            .unwrap();
    }

    let mut data = std::ptr::null_mut();
    // SAFETY: same block the create above populated.
    unsafe { join(&mut thread, Some(&mut data)) };
    assert_eq!(data, sentinel());
}
