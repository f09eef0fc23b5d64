//! Motions: named computations that turn a caret position into a span.

mod capture;
mod engine;
mod text_object;
mod word;

use bitflags::bitflags;

pub use capture::motion_bind_data;
pub(crate) use capture::movement_bindings;
pub use engine::MotionEngine;

use crate::host::SearchDirection;
use crate::text::{Span, WordKind};

/// `f`, `F`, `t` or `T` with its target character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharSearch {
    pub kind: CharSearchKind,
    pub direction: SearchDirection,
    pub target: char,
}

impl CharSearch {
    pub fn reversed(self) -> Self {
        Self {
            direction: self.direction.reverse(),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharSearchKind {
    /// `f` / `F`: land on the character.
    ToChar,
    /// `t` / `T`: stop one short of it.
    TillChar,
}

/// `i{obj}` selects the inner part, `a{obj}` includes delimiters or white space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObject {
    Word { kind: WordKind, around: bool },
    Paragraph { around: bool },
    Block { open: char, close: char, around: bool },
    Quote { quote: char, around: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Motion {
    /// `h`
    CharLeft,
    /// `l`
    CharRight,
    /// `j`
    LineDown,
    /// `k`
    LineUp,
    /// `w` / `W`
    WordForward(WordKind),
    /// `b` / `B`
    WordBackward(WordKind),
    /// `e` / `E`
    EndOfWord(WordKind),
    /// `cw`: like `e`, but stays put when already on the last character of a word.
    ChangeWord(WordKind),
    /// `0`
    BeginningOfLine,
    /// `^`
    FirstNonBlank,
    /// `$`
    EndOfLine,
    /// `gg`
    FirstLine,
    /// `G`
    LastLine,
    /// `+` / `<CR>`
    LineDownToFirstNonBlank,
    /// `-`
    LineUpToFirstNonBlank,
    /// `}`
    ParagraphForward,
    /// `{`
    ParagraphBackward,
    CharSearch(CharSearch),
    /// `;`
    RepeatCharSearch,
    /// `,`
    RepeatCharSearchReverse,
    /// `/pattern` or `?pattern`. An empty pattern reuses the last one.
    Search {
        pattern: String,
        direction: SearchDirection,
    },
    /// `n`
    NextMatch,
    /// `N`
    PreviousMatch,
    /// `%`
    MatchingToken,
    TextObject(TextObject),
    /// The doubled operator forms (`dd`, `yy`, `g~~`): `count` whole lines.
    WholeLine,
}

impl Motion {
    /// Deletes with these motions always go to `"1`, even within a line.
    pub fn always_numbered_register(&self) -> bool {
        matches!(
            self,
            Motion::MatchingToken
                | Motion::ParagraphForward
                | Motion::ParagraphBackward
                | Motion::Search { .. }
                | Motion::NextMatch
                | Motion::PreviousMatch
        )
    }
}

/// Whether a motion moves the caret or feeds an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotionContext {
    /// Plain caret movement, no operator pending.
    #[default]
    BeforeOperator,
    AfterOperator,
}

/// Counts and context for one motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MotionArgument {
    pub context: MotionContext,
    /// Count typed after the operator (`d3w`).
    pub count: Option<usize>,
    /// Count typed before the operator (`3dw`).
    pub operator_count: Option<usize>,
}

impl MotionArgument {
    pub fn new(context: MotionContext, count: Option<usize>, operator_count: Option<usize>) -> Self {
        Self {
            context,
            count,
            operator_count,
        }
    }

    /// Both counts multiplied, or `None` if neither was given.
    pub fn raw_count(&self) -> Option<usize> {
        match (self.count, self.operator_count) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(1).saturating_mul(b.unwrap_or(1))),
        }
    }

    pub fn count(&self) -> usize {
        self.raw_count().unwrap_or(1).max(1)
    }

    pub fn is_after_operator(&self) -> bool {
        self.context == MotionContext::AfterOperator
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MotionData {
    pub motion: Motion,
    pub argument: MotionArgument,
}

impl MotionData {
    pub fn new(motion: Motion, argument: MotionArgument) -> Self {
        Self { motion, argument }
    }

    pub fn with_operator_count(mut self, operator_count: Option<usize>) -> Self {
        self.argument.operator_count = operator_count;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
    CharacterWiseInclusive,
    CharacterWiseExclusive,
    LineWise,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MotionResultFlags: u8 {
        /// The span crosses at least one line break.
        const SPANS_MULTIPLE_LINES = 1;
        /// The motion left the caret where it was.
        const NO_MOVEMENT = 1 << 1;
        /// An exclusive motion was turned inclusive (`:help exclusive`).
        const EXCLUSIVE_PROMOTED = 1 << 2;
        /// An exclusive motion was turned linewise (`:help exclusive-linewise`).
        const EXCLUSIVE_LINEWISE = 1 << 3;
        /// A word motion stopped at the end of the line it moved over.
        const WORD_TRUNCATED = 1 << 4;
    }
}

/// The outcome of a motion.
///
/// `span` is the text an operator acts on; for inclusive motions it already
/// includes the last character. Line-wise spans cover whole lines including
/// their line breaks. `caret` is where the caret goes for a plain movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionResult {
    pub span: Span,
    pub is_forward: bool,
    pub kind: MotionKind,
    pub flags: MotionResultFlags,
    pub caret: usize,
}

impl MotionResult {
    pub fn is_line_wise(&self) -> bool {
        self.kind == MotionKind::LineWise
    }

    pub fn has_movement(&self) -> bool {
        !self.flags.contains(MotionResultFlags::NO_MOVEMENT)
    }
}

/// The column `j` and `k` keep aiming for while they pass shorter lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredColumn {
    /// `usize::MAX` after `$`: the end of every line.
    pub column: usize,
    /// Caret position the column was recorded at. Any other caret forgets it.
    pub at: usize,
}

/// State shared across commands: `;` `,` `n` `N` and the `j`/`k` column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionState {
    pub last_char_search: Option<CharSearch>,
    pub last_search: Option<(String, SearchDirection)>,
    /// Cleared by `:noh`, set again by the next search.
    pub search_highlight: bool,
    pub desired_column: Option<DesiredColumn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_counts_multiply() {
        let arg = MotionArgument::new(MotionContext::AfterOperator, Some(3), Some(2));
        assert_eq!(arg.count(), 6);
        assert_eq!(arg.raw_count(), Some(6));

        let arg = MotionArgument::new(MotionContext::BeforeOperator, None, Some(4));
        assert_eq!(arg.count(), 4);

        let arg = MotionArgument::default();
        assert_eq!(arg.count(), 1);
        assert_eq!(arg.raw_count(), None);
    }

    #[test]
    fn test_numbered_register_motions() {
        assert!(Motion::MatchingToken.always_numbered_register());
        assert!(Motion::NextMatch.always_numbered_register());
        assert!(!Motion::WordForward(WordKind::NormalWord).always_numbered_register());
    }
}
