//! Clipboard bridge contract.

use std::cell::RefCell;
use std::rc::Rc;

/// Access to the system clipboard behind the `+` and `*` registers.
///
/// Failures are the bridge's business: `read` returns `None` and `write`
/// drops the text.
pub trait ClipboardBridge {
    fn read(&mut self) -> Option<String>;

    fn write(&mut self, text: &str);
}

/// In-memory clipboard. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Rc<RefCell<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl ClipboardBridge for MemoryClipboard {
    fn read(&mut self) -> Option<String> {
        self.contents.borrow().clone()
    }

    fn write(&mut self, text: &str) {
        *self.contents.borrow_mut() = Some(text.to_string());
    }
}

/// A bridge that never holds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl ClipboardBridge for NoClipboard {
    fn read(&mut self) -> Option<String> {
        None
    }

    fn write(&mut self, _text: &str) {}
}
