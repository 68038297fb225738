//! Per-thread attachment bookkeeping.
//!
//! The thread that creates the VM is attached by creation and stays attached
//! until shutdown. Any other thread must hold an [`AttachGuard`] while it
//! invokes operations; guards nest, and the native detach happens when the
//! last guard on a thread is dropped.

use super::Runtime;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
pub(crate) struct AttachRegistry {
    owner: Mutex<Option<ThreadId>>,
    counts: Mutex<HashMap<ThreadId, usize>>,
}

impl AttachRegistry {
    pub(crate) fn set_owner(&self, id: ThreadId) {
        *self.owner.lock() = Some(id);
    }

    pub(crate) fn is_owner(&self, id: ThreadId) -> bool {
        *self.owner.lock() == Some(id)
    }

    pub(crate) fn is_attached(&self, id: ThreadId) -> bool {
        self.is_owner(id) || self.counts.lock().contains_key(&id)
    }

    /// Bumps the guard count; returns true when this is the first guard and
    /// a native attach is needed.
    pub(crate) fn acquire(&self, id: ThreadId) -> bool {
        let mut counts = self.counts.lock();
        let count = counts.entry(id).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Undoes an `acquire` whose native attach failed.
    pub(crate) fn forget(&self, id: ThreadId) {
        self.counts.lock().remove(&id);
    }

    /// Drops one guard; returns true when the thread needs a native detach.
    pub(crate) fn release(&self, id: ThreadId) -> bool {
        let mut counts = self.counts.lock();
        match counts.get_mut(&id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                counts.remove(&id);
                true
            }
            None => false,
        }
    }

    pub(crate) fn attached_count(&self) -> usize {
        let counts = self.counts.lock();
        counts.len() + usize::from(self.owner.lock().is_some())
    }

    pub(crate) fn clear(&self) {
        *self.owner.lock() = None;
        self.counts.lock().clear();
    }
}

/// Keeps the current thread attached to the runtime while alive.
#[must_use = "the thread is detached again as soon as the guard is dropped"]
pub struct AttachGuard<'rt> {
    runtime: &'rt Runtime,
    thread: ThreadId,
    /// False on the owning thread, which never detaches through a guard.
    counted: bool,
    /// Attachment is per OS thread, so the guard must be dropped where it was made.
    _not_send: PhantomData<*const ()>,
}

impl<'rt> AttachGuard<'rt> {
    pub(crate) fn new(runtime: &'rt Runtime, counted: bool) -> Self {
        Self {
            runtime,
            thread: thread::current().id(),
            counted,
            _not_send: PhantomData,
        }
    }

    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }
}

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        if !self.counted {
            return;
        }
        if self.runtime.threads.release(self.thread) {
            if let Err(failure) = self.runtime.backend.detach_current_thread() {
                log::warn!("failed to detach thread {:?}: {}", self.thread, failure);
            } else {
                log::debug!("detached thread {:?}", self.thread);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_guards_detach_once() {
        let registry = AttachRegistry::default();
        let id = thread::current().id();
        assert!(registry.acquire(id));
        assert!(!registry.acquire(id));
        assert!(!registry.release(id));
        assert!(registry.is_attached(id));
        assert!(registry.release(id));
        assert!(!registry.is_attached(id));
        assert!(!registry.release(id));
    }

    #[test]
    fn owner_counts_as_attached() {
        let registry = AttachRegistry::default();
        let id = thread::current().id();
        registry.set_owner(id);
        assert!(registry.is_attached(id));
        assert_eq!(registry.attached_count(), 1);
        registry.clear();
        assert!(!registry.is_attached(id));
    }
}
