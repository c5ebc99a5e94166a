//! Emulated thread-local storage slots.
//!
//! For configurations whose upper layers expect TLS on kernels that provide
//! none, every thread carries a small array of opaque pointer slots in its
//! control block. The trampoline registers the array after the thread has
//! entered the registry and before the user entry function runs, so TLS is
//! usable from the first user instruction; the array dies when the entry
//! function returns.
//!
//! Key allocation is an atomic bitmask on the context — no lock needed, and
//! compare-exchange with `AcqRel`/`Acquire` is enough to order mask changes
//! between allocating and freeing threads.

use std::{
    os::raw::c_void,
    ptr,
    sync::atomic::{AtomicU32, Ordering},
};

use crate::Context;

/// Number of emulated TLS slots per thread.
pub const NUM_TLS_SLOTS: usize = 16;

/// A handle to an allocated TLS slot, shared by all threads of the context
/// that allocated it.
#[derive(Clone, Copy, Debug)]
pub struct TlsKey(usize);

/// Per-context allocation state for TLS keys.
pub(crate) struct KeySpace {
    mask: AtomicU32,
}

impl KeySpace {
    pub(crate) fn new() -> Self {
        Self {
            mask: AtomicU32::new(0),
        }
    }

    fn alloc(&self) -> Option<usize> {
        let mut mask = self.mask.load(Ordering::Acquire);
        loop {
            let free = (!mask).trailing_zeros() as usize;
            if free >= NUM_TLS_SLOTS {
                return None;
            }
            match self.mask.compare_exchange(
                mask,
                mask | (1 << free),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(free),
                Err(current) => mask = current,
            }
        }
    }

    fn free(&self, slot: usize) {
        self.mask.fetch_and(!(1 << slot), Ordering::AcqRel);
    }
}

/// A thread's slot array, created by the trampoline.
pub(crate) struct TlsSlots {
    cells: [*mut c_void; NUM_TLS_SLOTS],
}

impl TlsSlots {
    pub(crate) fn new() -> Self {
        Self {
            cells: [ptr::null_mut(); NUM_TLS_SLOTS],
        }
    }
}

impl Context {
    /// Allocates a TLS key usable by every thread of this context. The slot
    /// starts out null in all threads, current and future.
    pub fn tls_key_create(&self) -> Result<TlsKey, TlsKeyCreateError> {
        self.tls_keys
            .alloc()
            .map(TlsKey)
            .ok_or(TlsKeyCreateError::OutOfSlots)
    }

    /// Returns a key to the pool. Values other threads still hold in the
    /// slot are abandoned, not destroyed — there are no destructors in this
    /// emulation.
    pub fn tls_key_delete(&self, key: TlsKey) {
        self.tls_keys.free(key.0);
    }

    /// Stores `value` in the calling thread's slot for `key`.
    ///
    /// # Panics
    /// Panics if called from a thread this context does not know about.
    pub fn tls_set(&self, key: TlsKey, value: *mut c_void) {
        let Some(tcb) = self.current_thread() else {
            panic!("tls_set called outside a thread of this context");
        };
        // SAFETY: the slot array belongs to the calling thread; it exists
        // for the entire span in which user code can run.
        unsafe {
            match (*tcb.as_ptr()).tls_slots.as_mut() {
                Some(slots) => slots.cells[key.0] = value,
                None => panic!("tls_set: slot array missing"),
            }
        }
    }

    /// Reads the calling thread's slot for `key`. Slots read null until the
    /// thread stores something.
    ///
    /// # Panics
    /// Panics if called from a thread this context does not know about.
    pub fn tls_get(&self, key: TlsKey) -> *mut c_void {
        let Some(tcb) = self.current_thread() else {
            panic!("tls_get called outside a thread of this context");
        };
        // SAFETY: as in `tls_set`.
        unsafe {
            match (*tcb.as_ptr()).tls_slots.as_ref() {
                Some(slots) => slots.cells[key.0],
                None => panic!("tls_get: slot array missing"),
            }
        }
    }
}

/// TLS key allocation errors.
#[derive(Debug, thiserror::Error)]
pub enum TlsKeyCreateError {
    /// All [`NUM_TLS_SLOTS`] slots are allocated.
    #[error("All TLS slots are in use")]
    OutOfSlots,
}
