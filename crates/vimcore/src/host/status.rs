//! Status-line notifications.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info, warn};

/// Fire-and-forget sink for user-visible notifications.
pub trait StatusSink {
    fn report_error(&mut self, text: &str);

    fn report_warning(&mut self, text: &str);

    /// Informational output, e.g. the listing printed by `:reg`.
    fn report_message(&mut self, text: &str);
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn report_error(&mut self, text: &str) {
        error!(target: "vimcore::status", "{text}");
    }

    fn report_warning(&mut self, text: &str) {
        warn!(target: "vimcore::status", "{text}");
    }

    fn report_message(&mut self, text: &str) {
        info!(target: "vimcore::status", "{text}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Error(String),
    Warning(String),
    Message(String),
}

/// Collects notifications in memory. Clones share the same log, so a host
/// can keep one handle and give another to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatus {
    messages: Rc<RefCell<Vec<StatusMessage>>>,
}

impl MemoryStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<StatusMessage> {
        self.messages.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter_map(|m| match m {
                StatusMessage::Error(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl StatusSink for MemoryStatus {
    fn report_error(&mut self, text: &str) {
        self.messages
            .borrow_mut()
            .push(StatusMessage::Error(text.to_string()));
    }

    fn report_warning(&mut self, text: &str) {
        self.messages
            .borrow_mut()
            .push(StatusMessage::Warning(text.to_string()));
    }

    fn report_message(&mut self, text: &str) {
        self.messages
            .borrow_mut()
            .push(StatusMessage::Message(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_status_clones_share_log() {
        let status = MemoryStatus::new();
        let mut handle = status.clone();
        handle.report_error("E486: Pattern not found");
        handle.report_warning("search hit BOTTOM");

        assert_eq!(status.errors(), vec!["E486: Pattern not found"]);
        assert_eq!(status.messages().len(), 2);

        status.clear();
        assert!(handle.messages().is_empty());
    }
}
