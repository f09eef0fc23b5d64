//! Undo grouping.
//!
//! Every resolved command runs inside one [`UndoTransaction`], so a single
//! host-side undo reverts exactly one logical edit. Insert and Replace
//! sessions keep their transaction open across keystrokes as a
//! [`LinkedTransaction`] until the mode is left.

use std::ops::{Deref, DerefMut};

use tracing::{trace, warn};

/// Opaque token identifying an open transaction.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "an undo handle must be committed or rolled back"]
pub struct UndoHandle(u64);

impl UndoHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Undo history owned by the host buffer.
pub trait UndoHost {
    fn begin_transaction(&mut self, name: &str) -> UndoHandle;

    /// Closes the transaction; its edits become one undo step.
    fn commit(&mut self, handle: UndoHandle);

    /// Reverts every edit made since the transaction began.
    fn rollback(&mut self, handle: UndoHandle);

    /// Undoes up to `count` steps. Returns false if there was nothing to undo.
    fn undo(&mut self, count: usize) -> bool;

    /// Redoes up to `count` steps. Returns false if there was nothing to redo.
    fn redo(&mut self, count: usize) -> bool;
}

/// Scoped transaction. Dereferences to the host so edits go through it.
///
/// Dropping an uncommitted transaction rolls it back.
pub struct UndoTransaction<'a, H: UndoHost + ?Sized> {
    host: &'a mut H,
    handle: Option<UndoHandle>,
    name: String,
}

impl<'a, H: UndoHost + ?Sized> UndoTransaction<'a, H> {
    pub fn begin(host: &'a mut H, name: &str) -> Self {
        trace!(name, "begin undo transaction");
        let handle = host.begin_transaction(name);
        Self {
            host,
            handle: Some(handle),
            name: name.to_string(),
        }
    }

    /// Re-attaches to a transaction kept open across keystrokes.
    pub fn resume(host: &'a mut H, linked: LinkedTransaction) -> Self {
        Self {
            host,
            handle: Some(linked.handle),
            name: linked.name,
        }
    }

    pub fn commit(mut self) {
        if let Some(handle) = self.handle.take() {
            trace!(name = %self.name, "commit undo transaction");
            self.host.commit(handle);
        }
    }

    pub fn rollback(mut self) {
        if let Some(handle) = self.handle.take() {
            trace!(name = %self.name, "roll back undo transaction");
            self.host.rollback(handle);
        }
    }

    /// Leaves the transaction open so it can be resumed on a later keystroke.
    pub fn detach(mut self) -> LinkedTransaction {
        let handle = self
            .handle
            .take()
            .unwrap_or_else(|| self.host.begin_transaction(&self.name));
        LinkedTransaction {
            handle,
            name: std::mem::take(&mut self.name),
        }
    }
}

impl<H: UndoHost + ?Sized> Deref for UndoTransaction<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: UndoHost + ?Sized> DerefMut for UndoTransaction<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: UndoHost + ?Sized> Drop for UndoTransaction<'_, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            warn!(name = %self.name, "undo transaction dropped without commit, rolling back");
            self.host.rollback(handle);
        }
    }
}

/// A transaction left open between keystrokes.
#[derive(Debug)]
pub struct LinkedTransaction {
    handle: UndoHandle,
    name: String,
}

impl LinkedTransaction {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        next: u64,
        events: Vec<String>,
    }

    impl UndoHost for Log {
        fn begin_transaction(&mut self, name: &str) -> UndoHandle {
            self.next += 1;
            self.events.push(format!("begin {name}"));
            UndoHandle::new(self.next)
        }

        fn commit(&mut self, handle: UndoHandle) {
            self.events.push(format!("commit {}", handle.id()));
        }

        fn rollback(&mut self, handle: UndoHandle) {
            self.events.push(format!("rollback {}", handle.id()));
        }

        fn undo(&mut self, _count: usize) -> bool {
            false
        }

        fn redo(&mut self, _count: usize) -> bool {
            false
        }
    }

    #[test]
    fn test_drop_rolls_back() {
        let mut log = Log::default();
        {
            let _transaction = UndoTransaction::begin(&mut log, "edit");
        }
        assert_eq!(log.events, vec!["begin edit", "rollback 1"]);
    }

    #[test]
    fn test_detach_and_resume() {
        let mut log = Log::default();
        let linked = UndoTransaction::begin(&mut log, "insert").detach();
        assert_eq!(linked.name(), "insert");
        UndoTransaction::resume(&mut log, linked).commit();
        assert_eq!(log.events, vec!["begin insert", "commit 1"]);
    }
}
