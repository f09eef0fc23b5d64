//! An in-memory text surface backed by a rope, with snapshot undo.

use ropey::Rope;
use tracing::trace;

use super::TextSurface;
use crate::error::SurfaceError;
use crate::text::Span;
use crate::undo::{UndoHandle, UndoHost};

#[derive(Debug, Clone)]
struct OpenTransaction {
    id: u64,
    name: String,
    before: Rope,
}

#[derive(Debug, Clone)]
struct UndoEntry {
    name: String,
    before: Rope,
    after: Rope,
}

/// Reference [`TextSurface`] + [`UndoHost`] over a [`ropey::Rope`].
///
/// Undo steps store whole-buffer snapshots; ropes share structure, so this
/// stays cheap for editor-sized buffers.
#[derive(Debug, Clone, Default)]
pub struct RopeSurface {
    rope: Rope,
    read_only: bool,
    open: Vec<OpenTransaction>,
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    next_id: u64,
}

impl RopeSurface {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Number of committed undo steps.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn has_open_transaction(&self) -> bool {
        !self.open.is_empty()
    }

    fn check_span(&self, span: Span) -> Result<(), SurfaceError> {
        let length = self.rope.len_chars();
        if span.end() > length {
            return Err(SurfaceError::OutOfRange {
                position: span.end(),
                length,
            });
        }
        Ok(())
    }

    fn push_undo(&mut self, name: String, before: Rope) {
        if before == self.rope {
            return;
        }
        self.undo_stack.push(UndoEntry {
            name,
            before,
            after: self.rope.clone(),
        });
        self.redo_stack.clear();
    }
}

impl TextSurface for RopeSurface {
    fn length(&self) -> usize {
        self.rope.len_chars()
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn position_of_line(&self, line: usize) -> Result<usize, SurfaceError> {
        let line_count = self.rope.len_lines();
        if line >= line_count {
            return Err(SurfaceError::LineOutOfRange { line, line_count });
        }
        Ok(self.rope.line_to_char(line))
    }

    fn line_of_position(&self, position: usize) -> Result<usize, SurfaceError> {
        let length = self.rope.len_chars();
        if position > length {
            return Err(SurfaceError::OutOfRange { position, length });
        }
        Ok(self.rope.char_to_line(position))
    }

    fn read(&self, span: Span) -> Result<String, SurfaceError> {
        self.check_span(span)?;
        Ok(self.rope.slice(span.start()..span.end()).to_string())
    }

    fn replace(&mut self, span: Span, text: &str) -> Result<(), SurfaceError> {
        if self.read_only {
            return Err(SurfaceError::ReadOnly);
        }
        self.check_span(span)?;

        let before = self.open.is_empty().then(|| self.rope.clone());
        self.rope.remove(span.start()..span.end());
        self.rope.insert(span.start(), text);

        // Edits outside a transaction are their own undo step.
        if let Some(before) = before {
            self.push_undo("edit".to_string(), before);
        }
        Ok(())
    }
}

impl UndoHost for RopeSurface {
    fn begin_transaction(&mut self, name: &str) -> UndoHandle {
        self.next_id += 1;
        self.open.push(OpenTransaction {
            id: self.next_id,
            name: name.to_string(),
            before: self.rope.clone(),
        });
        UndoHandle::new(self.next_id)
    }

    fn commit(&mut self, handle: UndoHandle) {
        let Some(index) = self.open.iter().position(|t| t.id == handle.id()) else {
            return;
        };
        // Committing an outer transaction closes any nested ones with it.
        let mut closed = self.open.split_off(index);
        let outer = closed.remove(0);
        if self.open.is_empty() {
            trace!(name = %outer.name, "undo step recorded");
            self.push_undo(outer.name, outer.before);
        }
    }

    fn rollback(&mut self, handle: UndoHandle) {
        let Some(index) = self.open.iter().position(|t| t.id == handle.id()) else {
            return;
        };
        let mut closed = self.open.split_off(index);
        let outer = closed.remove(0);
        self.rope = outer.before;
    }

    fn undo(&mut self, count: usize) -> bool {
        let mut undone = false;
        for _ in 0..count.max(1) {
            let Some(entry) = self.undo_stack.pop() else {
                break;
            };
            self.rope = entry.before.clone();
            self.redo_stack.push(entry);
            undone = true;
        }
        undone
    }

    fn redo(&mut self, count: usize) -> bool {
        let mut redone = false;
        for _ in 0..count.max(1) {
            let Some(entry) = self.redo_stack.pop() else {
                break;
            };
            self.rope = entry.after.clone();
            self.undo_stack.push(entry);
            redone = true;
        }
        redone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_addressing() {
        let surface = RopeSurface::new("one\ntwo\n");
        assert_eq!(surface.length(), 8);
        assert_eq!(surface.line_count(), 3);
        assert_eq!(surface.position_of_line(1), Ok(4));
        assert_eq!(surface.line_of_position(5), Ok(1));
        assert!(surface.position_of_line(3).is_err());
        assert!(surface.line_of_position(9).is_err());
    }

    #[test]
    fn test_read_and_replace() {
        let mut surface = RopeSurface::new("hello world");
        assert_eq!(surface.read(Span::new(0, 5)).unwrap(), "hello");
        surface.replace(Span::new(0, 5), "howdy").unwrap();
        assert_eq!(surface.text(), "howdy world");
        assert!(surface.read(Span::new(0, 50)).is_err());
    }

    #[test]
    fn test_read_only_rejects_edits() {
        let mut surface = RopeSurface::new("abc");
        surface.set_read_only(true);
        assert_eq!(
            surface.replace(Span::new(0, 1), ""),
            Err(SurfaceError::ReadOnly)
        );
        assert_eq!(surface.text(), "abc");
    }

    #[test]
    fn test_transaction_is_one_undo_step() {
        let mut surface = RopeSurface::new("abc");
        let handle = surface.begin_transaction("edit");
        surface.replace(Span::new(0, 1), "x").unwrap();
        surface.replace(Span::new(2, 3), "z").unwrap();
        surface.commit(handle);
        assert_eq!(surface.text(), "xbz");
        assert_eq!(surface.undo_depth(), 1);

        assert!(surface.undo(1));
        assert_eq!(surface.text(), "abc");
        assert_eq!(surface.redo_depth(), 1);
        assert!(surface.redo(1));
        assert_eq!(surface.text(), "xbz");
        assert_eq!(surface.redo_depth(), 0);
        assert!(!surface.redo(1));
    }

    #[test]
    fn test_rollback_restores_text() {
        let mut surface = RopeSurface::new("abc");
        let handle = surface.begin_transaction("edit");
        surface.replace(Span::new(0, 3), "").unwrap();
        surface.rollback(handle);
        assert_eq!(surface.text(), "abc");
        assert_eq!(surface.undo_depth(), 0);
    }

    #[test]
    fn test_nested_transaction_merges_into_outer() {
        let mut surface = RopeSurface::new("abc");
        let outer = surface.begin_transaction("outer");
        let inner = surface.begin_transaction("inner");
        surface.replace(Span::new(0, 1), "x").unwrap();
        surface.commit(inner);
        surface.replace(Span::new(1, 2), "y").unwrap();
        surface.commit(outer);
        assert_eq!(surface.undo_depth(), 1);
        surface.undo(1);
        assert_eq!(surface.text(), "abc");
    }
}
