//! Contracts for the collaborators the engine drives, plus reference
//! implementations usable by hosts and tests.
//!
//! The engine only ever talks to the host through these traits. A host
//! typically implements [`TextSurface`] and [`UndoHost`](crate::undo::UndoHost)
//! on the same type, since undo history belongs to the buffer.

mod clipboard;
mod search;
mod status;
mod surface;

pub use clipboard::{ClipboardBridge, MemoryClipboard, NoClipboard};
pub use search::{RegexSearchService, SearchDirection, SearchOptions, SearchService};
pub use status::{MemoryStatus, StatusMessage, StatusSink, TracingStatus};
pub use surface::RopeSurface;

use crate::error::SurfaceError;
use crate::text::Span;

/// The host buffer as seen by the engine.
///
/// All positions are 0-based character offsets. Out-of-range input must be
/// reported as an error, never clamped silently.
pub trait TextSurface {
    /// Number of characters in the buffer.
    fn length(&self) -> usize;

    /// Number of lines. A trailing line break starts a final empty line.
    fn line_count(&self) -> usize;

    fn position_of_line(&self, line: usize) -> Result<usize, SurfaceError>;

    fn line_of_position(&self, position: usize) -> Result<usize, SurfaceError>;

    fn read(&self, span: Span) -> Result<String, SurfaceError>;

    fn replace(&mut self, span: Span, text: &str) -> Result<(), SurfaceError>;
}
