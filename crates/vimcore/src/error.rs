//! Error types for the engine.
//!
//! Every error here is recoverable and scoped to the in-flight command. The
//! buffer state is never mutated once one of these has been produced.

use thiserror::Error;

use crate::key::{KeyInput, KeyInputSet};
use crate::register::RegisterName;

/// Errors raised by a [`TextSurface`](crate::host::TextSurface).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// A position or span lies outside the current buffer.
    #[error("position {position} is out of range (buffer length {length})")]
    OutOfRange { position: usize, length: usize },

    /// A line number lies outside the current buffer.
    #[error("line {line} is out of range (line count {line_count})")]
    LineOutOfRange { line: usize, line_count: usize },

    /// The surface refused to apply an edit.
    #[error("buffer is read-only")]
    ReadOnly,
}

/// Errors raised while computing a motion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MotionError {
    #[error("pattern not found: {0}")]
    PatternNotFound(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("no previous regular expression")]
    NoPreviousSearch,

    #[error("no previous character search")]
    NoPreviousCharSearch,

    #[error("character not found: {0:?}")]
    CharNotFound(char),

    #[error("no matching token under the caret")]
    NoMatchingToken,

    #[error("text object not found")]
    TextObjectNotFound,

    /// The motion would not move and the motion kind requires movement
    /// (for example `h` in column 0).
    #[error("motion cannot move any further")]
    NoMovement,

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Errors raised by the command executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error("register {0} is empty")]
    RegisterEmpty(RegisterName),

    #[error("register {0} is read-only")]
    ReadOnlyRegister(RegisterName),

    #[error("not an editor command: {0}")]
    InvalidExCommand(String),

    #[error("invalid range")]
    InvalidRange,

    #[error("recursive macro depth exceeded ({0})")]
    MacroRecursion(usize),

    #[error("nothing to repeat")]
    NothingToRepeat,

    /// The command cannot apply at the caret (`J` on the last line, `r` past
    /// the end of the line).
    #[error("{0}")]
    Failed(String),
}

/// The top-level error taxonomy reported by [`VimBuffer`](crate::VimBuffer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VimError {
    /// No binding starts with the accumulated key sequence.
    #[error("no command bound to {0}")]
    NoBinding(KeyInputSet),

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A replayed key failed; replay stops at `index`.
    #[error("macro in register {register} stopped at key {index} ({key}): {reason}")]
    MacroPlayback {
        register: RegisterName,
        index: usize,
        key: KeyInput,
        reason: String,
    },

    /// A key was delivered while a previous dispatch was still running.
    #[error("key delivered while a previous key is still being processed")]
    Reentrant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_error_message() {
        let err = SurfaceError::OutOfRange {
            position: 12,
            length: 4,
        };
        assert_eq!(
            err.to_string(),
            "position 12 is out of range (buffer length 4)"
        );
    }

    #[test]
    fn test_execution_error_wraps_motion_error() {
        let err: ExecutionError = MotionError::PatternNotFound("foo".into()).into();
        assert_eq!(err.to_string(), "pattern not found: foo");
    }

    #[test]
    fn test_macro_playback_error_names_key() {
        let err = VimError::MacroPlayback {
            register: RegisterName::Named('q'),
            index: 3,
            key: KeyInput::escape(),
            reason: "no command bound to Z".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("register q"));
        assert!(msg.contains("<Esc>"));
        assert!(msg.contains("key 3"));
    }
}
