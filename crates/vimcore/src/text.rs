//! Spans and read-only text snapshots.
//!
//! Motions and commands never hold positions across a host callback. Each
//! dispatch captures a [`TextSnapshot`] from the surface and resolves every
//! position against it before any mutation is issued.

use crate::error::SurfaceError;
use crate::host::TextSurface;

/// A half-open range of character offsets. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Creates a span covering `a..b`, swapping the ends if they are reversed.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn empty_at(position: usize) -> Self {
        Self::new(position, position)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end
    }

    /// Clamps both ends to `length`.
    pub fn clamp(&self, length: usize) -> Self {
        Self::new(self.start.min(length), self.end.min(length))
    }
}

/// Character class used by word motions and text objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Blank,
    Word,
    Punctuation,
}

/// Word flavor: `w` style words or `W` style WORDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordKind {
    NormalWord,
    BigWord,
}

/// An immutable copy of the buffer text with a line index.
#[derive(Debug, Clone)]
pub struct TextSnapshot {
    chars: Vec<char>,
    line_starts: Vec<usize>,
    extra_word_chars: Vec<char>,
}

impl TextSnapshot {
    pub fn capture<S: TextSurface + ?Sized>(surface: &S) -> Result<Self, SurfaceError> {
        let text = surface.read(Span::new(0, surface.length()))?;
        Ok(Self::new(&text))
    }

    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut line_starts = vec![0];
        for (i, c) in chars.iter().enumerate() {
            if *c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            chars,
            line_starts,
            extra_word_chars: vec!['_'],
        }
    }

    /// Sets the characters besides alphanumerics that count as word characters.
    pub fn with_word_chars(mut self, chars: &str) -> Self {
        self.extra_word_chars = chars.chars().collect();
        self
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn char_at(&self, position: usize) -> Option<char> {
        self.chars.get(position).copied()
    }

    pub fn slice(&self, span: Span) -> String {
        let span = span.clamp(self.len());
        self.chars[span.start()..span.end()].iter().collect()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn last_line(&self) -> usize {
        self.line_starts.len() - 1
    }

    /// Line containing `position`; positions past the end map to the last line.
    pub fn line_of(&self, position: usize) -> usize {
        let position = position.min(self.len());
        self.line_starts.partition_point(|&start| start <= position) - 1
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts[line.min(self.last_line())]
    }

    /// Offset of the line break ending `line`, or the buffer end for the last line.
    pub fn line_end(&self, line: usize) -> usize {
        let line = line.min(self.last_line());
        if line == self.last_line() {
            self.len()
        } else {
            self.line_starts[line + 1] - 1
        }
    }

    /// Offset just past the line break ending `line`.
    pub fn line_end_including_break(&self, line: usize) -> usize {
        let line = line.min(self.last_line());
        if line == self.last_line() {
            self.len()
        } else {
            self.line_starts[line + 1]
        }
    }

    pub fn line_len(&self, line: usize) -> usize {
        self.line_end(line) - self.line_start(line)
    }

    pub fn line_text(&self, line: usize) -> String {
        self.slice(Span::new(self.line_start(line), self.line_end(line)))
    }

    pub fn column_of(&self, position: usize) -> usize {
        position.min(self.len()) - self.line_start(self.line_of(position))
    }

    /// Position of `column` on `line`, clamped to the line's content.
    pub fn position(&self, line: usize, column: usize) -> usize {
        let start = self.line_start(line);
        start + column.min(self.line_len(line))
    }

    /// Like [`position`](Self::position) but never lands on the line break of
    /// a non-empty line, matching Normal mode caret rules.
    pub fn caret_position(&self, line: usize, column: usize) -> usize {
        let len = self.line_len(line);
        let start = self.line_start(line);
        if len == 0 {
            start
        } else {
            start + column.min(len - 1)
        }
    }

    /// Clamps a caret position so it sits on a character of its line.
    pub fn clamp_caret(&self, position: usize) -> usize {
        let line = self.line_of(position);
        let column = self.column_of(position);
        self.caret_position(line, column)
    }

    pub fn first_non_blank(&self, line: usize) -> usize {
        let start = self.line_start(line);
        let end = self.line_end(line);
        (start..end)
            .find(|&i| !is_blank(self.chars[i]))
            .unwrap_or(end)
    }

    pub fn is_blank_line(&self, line: usize) -> bool {
        let start = self.line_start(line);
        let end = self.line_end(line);
        self.chars[start..end].iter().all(|c| is_blank(*c))
    }

    pub fn is_empty_line(&self, line: usize) -> bool {
        self.line_len(line) == 0
    }

    pub fn class_of(&self, c: char, kind: WordKind) -> CharClass {
        if is_blank(c) || c == '\n' {
            CharClass::Blank
        } else if kind == WordKind::BigWord
            || c.is_alphanumeric()
            || self.extra_word_chars.contains(&c)
        {
            CharClass::Word
        } else {
            CharClass::Punctuation
        }
    }

    pub fn class_at(&self, position: usize, kind: WordKind) -> CharClass {
        self.char_at(position)
            .map(|c| self.class_of(c, kind))
            .unwrap_or(CharClass::Blank)
    }
}

pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}
