//! Emulated-TLS tests (compile-time option).

#![cfg(feature = "tls-emulation")]

use std::{os::raw::c_void, sync::atomic::{AtomicUsize, Ordering}};

use vos_sys_thread::{Context, Thread, ThreadEntry, create, join};

struct Probe {
    ctx: *const Context,
    key: vos_sys_thread::TlsKey,
    ok: AtomicUsize,
}

#[test]
fn slots_are_private_per_thread() {
    fn entry(arg: *mut c_void) -> *mut c_void {
        let probe = unsafe { &*(arg as *const Probe) };
        let ctx = unsafe { &*probe.ctx };

        // Fresh slot reads null, then round-trips a thread-private value.
        if ctx.tls_get(probe.key).is_null() {
            ctx.tls_set(probe.key, arg);
            if ctx.tls_get(probe.key) == arg {
                probe.ok.fetch_add(1, Ordering::SeqCst);
            }
        }
        std::ptr::null_mut()
    }

    let ctx = Context::new();
    let key = ctx.tls_key_create().unwrap();
    let probe = Box::new(Probe {
        ctx: &*ctx,
        key,
        ok: AtomicUsize::new(0),
    });
    let probe_ptr = &*probe as *const Probe as *mut c_void;

    let mut threads: Vec<Thread> = (0..4).map(|_| Thread::new()).collect();
    for (i, thread) in threads.iter_mut().enumerate() {
        let name = format!("tls-{i}");
        // SAFETY: the vec is not touched again until every block is joined.
        unsafe {
            create(&ctx, thread, &name, None, ThreadEntry::Modern(entry), probe_ptr).unwrap();
        }
    }
    for thread in threads.iter_mut() {
        // SAFETY: each block was populated by the create above.
        unsafe { join(thread, None) };
    }
    assert_eq!(probe.ok.load(Ordering::SeqCst), 4);
    ctx.tls_key_delete(key);
}
