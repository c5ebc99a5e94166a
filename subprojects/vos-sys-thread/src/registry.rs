//! # Live-thread registry
//!
//! Tracks every [`Thread`] that is currently alive in a [`Context`].
//!
//! Threads are not linked into the list directly — that would grow the
//! control block for the registry's benefit. Instead every entry is a
//! heap-allocated `Box<Node>` holding the intrusive link, a raw non-null
//! pointer back to the real control block, and the native handle used for
//! current-thread lookup. The allocation is created on insertion and
//! destroyed immediately after removal.
//!
//! The registry holds no lock of its own: all access is serialised by the
//! context's Global Lock, which is why every method here is `unsafe` with a
//! "lock must be held" contract. None of the methods hand out references
//! that outlive the lock; lookups return raw pointers whose dereference is
//! the caller's contract.
//!
//! All operations are `O(n)` in the number of live threads; the populations
//! this layer sees are small.
//!
//! [`Context`]: crate::Context

use std::{cell::UnsafeCell, ptr::NonNull};

use intrusive_collections::{LinkedList, LinkedListLink, intrusive_adapter};
use vos_sys::thread as sys;

use crate::Thread;

struct Node {
    link: LinkedListLink,
    thread: NonNull<Thread>,
    native: sys::Handle,
}

intrusive_adapter!(NodeAdapter = Box<Node>: Node { link: LinkedListLink });

pub(crate) struct Registry {
    list: UnsafeCell<LinkedList<NodeAdapter>>,
}

// SAFETY: every access to `list` is serialised by the context's Global Lock
// per the `unsafe fn` contracts below.
unsafe impl Send for Registry {}
unsafe impl Sync for Registry {}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            list: UnsafeCell::new(LinkedList::new(NodeAdapter::new())),
        }
    }

    /// Inserts a thread keyed by its native handle.
    ///
    /// # Safety
    /// The context's Global Lock must be held, and `thread` must stay valid
    /// until it is removed again.
    pub(crate) unsafe fn insert(&self, thread: NonNull<Thread>, native: sys::Handle) {
        // SAFETY: exclusive access per the lock contract.
        let list = unsafe { &mut *self.list.get() };
        list.push_back(Box::new(Node {
            link: LinkedListLink::new(),
            thread,
            native,
        }));
    }

    /// Removes a previously inserted thread. Unknown threads are ignored.
    ///
    /// # Safety
    /// The context's Global Lock must be held.
    pub(crate) unsafe fn remove(&self, thread: NonNull<Thread>) {
        // SAFETY: exclusive access per the lock contract.
        let list = unsafe { &mut *self.list.get() };
        let mut cursor = list.front_mut();
        while let Some(node) = cursor.get() {
            if node.thread == thread {
                cursor.remove();
                return;
            }
            cursor.move_next();
        }
    }

    /// Looks a live thread up by its native handle.
    ///
    /// # Safety
    /// The context's Global Lock must be held. The returned pointer is only
    /// guaranteed valid while the thread remains registered.
    pub(crate) unsafe fn find_native(&self, native: &sys::Handle) -> Option<NonNull<Thread>> {
        // SAFETY: shared access per the lock contract.
        let list = unsafe { &*self.list.get() };
        list.iter()
            .find(|node| node.native.same_as(native))
            .map(|node| node.thread)
    }

    /// Visits every registered thread in registration order.
    ///
    /// # Safety
    /// The context's Global Lock must be held for the whole traversal, and
    /// `f` must not call back into the registry.
    pub(crate) unsafe fn for_each(&self, mut f: impl FnMut(&Thread)) {
        // SAFETY: shared access per the lock contract.
        let list = unsafe { &*self.list.get() };
        for node in list.iter() {
            // SAFETY: registered blocks stay valid until removed, which the
            // held lock excludes.
            f(unsafe { node.thread.as_ref() });
        }
    }

    /// Number of currently registered threads.
    ///
    /// # Safety
    /// The context's Global Lock must be held.
    pub(crate) unsafe fn len(&self) -> usize {
        // SAFETY: shared access per the lock contract.
        let list = unsafe { &*self.list.get() };
        list.iter().count()
    }
}
