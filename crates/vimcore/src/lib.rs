//! vimcore - a modal Vim command and motion engine.
//!
//! A host editor implements [`TextSurface`](host::TextSurface) and
//! [`UndoHost`](undo::UndoHost) for its buffer, wraps it in a [`VimBuffer`]
//! and feeds it [`KeyInput`]s.

pub mod binding;
pub mod buffer;
pub mod clipboard;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod key;
pub mod macros;
pub mod mode;
pub mod motion;
pub mod register;
pub mod session;
pub mod text;
pub mod undo;

pub use buffer::{ProcessResult, VimBuffer};
pub use error::{ExecutionError, MotionError, SurfaceError, VimError};
pub use key::{KeyInput, KeyInputSet};
pub use mode::ModeKind;
