//! Word scanning over a [`TextSnapshot`].
//!
//! A line break behaves like the position past the end of its line: it is
//! blank, and stepping onto it ends the word before it.

use crate::text::{CharClass, TextSnapshot, WordKind};

/// Result of one caret step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Moved within the line.
    Moved,
    /// Moved onto the end of the line.
    OntoLineEnd,
    /// Crossed a line break.
    NextLine,
    /// Already at the end of the buffer.
    AtEnd,
}

pub(crate) struct WordScanner<'a> {
    text: &'a TextSnapshot,
    kind: WordKind,
}

impl<'a> WordScanner<'a> {
    pub fn new(text: &'a TextSnapshot, kind: WordKind) -> Self {
        Self { text, kind }
    }

    fn class(&self, position: usize) -> CharClass {
        self.text.class_at(position, self.kind)
    }

    fn step(&self, position: &mut usize) -> Step {
        let len = self.text.len();
        if *position >= len {
            return Step::AtEnd;
        }
        let crossed = self.text.char_at(*position) == Some('\n');
        *position += 1;
        if crossed {
            Step::NextLine
        } else if *position == len || self.text.char_at(*position) == Some('\n') {
            Step::OntoLineEnd
        } else {
            Step::Moved
        }
    }

    /// Column 0 of an empty line, which counts as a word of its own.
    fn on_empty_line(&self, position: usize) -> bool {
        let at_line_start = position == 0 || self.text.char_at(position - 1) == Some('\n');
        let at_line_end = position >= self.text.len() || self.text.char_at(position) == Some('\n');
        at_line_start && at_line_end
    }

    /// `w`. With `stop_at_line_end`, the last word never crosses a line
    /// break: `dw` on the last word of a line stops at the line end.
    ///
    /// Returns the target and whether the scan ran off the end of the buffer.
    pub fn forward_start(&self, start: usize, count: usize, stop_at_line_end: bool) -> (usize, bool) {
        let last_line = self.text.last_line();
        let mut i = start;

        for remaining in (0..count.max(1)).rev() {
            let eol = stop_at_line_end && remaining == 0;
            let class = self.class(i);
            let on_last_line = self.text.line_of(i) == last_line;

            let fails = |step: Step| step == Step::AtEnd || (step != Step::Moved && on_last_line);
            let stops = |step: Step| eol && step != Step::Moved;

            let step = self.step(&mut i);
            if fails(step) {
                return (i, true);
            }
            if stops(step) {
                return (i, false);
            }

            if class != CharClass::Blank {
                while self.class(i) == class {
                    let step = self.step(&mut i);
                    if fails(step) {
                        return (i, true);
                    }
                    if stops(step) {
                        return (i, false);
                    }
                }
            }

            while self.class(i) == CharClass::Blank {
                if self.on_empty_line(i) {
                    break;
                }
                let step = self.step(&mut i);
                if fails(step) {
                    return (i, true);
                }
                if stops(step) {
                    return (i, false);
                }
            }
        }
        (i, false)
    }

    /// `b`.
    pub fn backward_start(&self, start: usize, count: usize) -> usize {
        let mut i = start.min(self.text.len());
        'count: for _ in 0..count.max(1) {
            if i == 0 {
                break;
            }
            i -= 1;

            while self.class(i) == CharClass::Blank {
                if self.on_empty_line(i) {
                    continue 'count;
                }
                if i == 0 {
                    return 0;
                }
                i -= 1;
            }

            let class = self.class(i);
            while self.class(i) == class {
                if i == 0 {
                    return 0;
                }
                i -= 1;
            }
            i += 1;
        }
        i
    }

    /// `e`. With `stay_on_end`, the first count does not move when the
    /// caret already sits on the last character of a word (`cw`).
    pub fn forward_end(&self, start: usize, count: usize, mut stay_on_end: bool) -> usize {
        let last = self.text.len().saturating_sub(1);
        let mut i = start;

        for _ in 0..count.max(1) {
            let class = self.class(i);
            if self.step(&mut i) == Step::AtEnd {
                return last;
            }

            if self.class(i) == class && class != CharClass::Blank {
                while self.class(i) == class {
                    if self.step(&mut i) == Step::AtEnd {
                        return last;
                    }
                }
            } else if !stay_on_end || class == CharClass::Blank {
                while self.class(i) == CharClass::Blank {
                    if self.step(&mut i) == Step::AtEnd {
                        return last;
                    }
                }
                let class = self.class(i);
                while self.class(i) == class {
                    if self.step(&mut i) == Step::AtEnd {
                        return last;
                    }
                }
            }
            i -= 1;
            stay_on_end = false;
        }
        i
    }

    /// Bounds of the run of same-class characters containing `position`,
    /// limited to its line. Used by `iw`.
    pub fn run_at(&self, position: usize) -> (usize, usize) {
        let line = self.text.line_of(position);
        let line_start = self.text.line_start(line);
        let line_end = self.text.line_end(line);
        if line_start == line_end {
            return (line_start, line_start);
        }
        let position = position.clamp(line_start, line_end - 1);
        let class = self.class(position);

        let mut start = position;
        while start > line_start && self.class(start - 1) == class {
            start -= 1;
        }
        let mut end = position + 1;
        while end < line_end && self.class(end) == class {
            end += 1;
        }
        (start, end)
    }

    pub fn is_blank_at(&self, position: usize) -> bool {
        self.class(position) == CharClass::Blank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(text: &TextSnapshot) -> WordScanner<'_> {
        WordScanner::new(text, WordKind::NormalWord)
    }

    #[test]
    fn test_forward_start() {
        let text = TextSnapshot::new("alpha beta, gamma");
        let words = scanner(&text);
        assert_eq!(words.forward_start(0, 1, false), (6, false));
        assert_eq!(words.forward_start(6, 1, false), (10, false));
        assert_eq!(words.forward_start(0, 3, false), (12, false));
        assert_eq!(words.forward_start(12, 1, false), (17, true));
    }

    #[test]
    fn test_forward_start_big_word() {
        let text = TextSnapshot::new("alpha beta, gamma");
        let words = WordScanner::new(&text, WordKind::BigWord);
        assert_eq!(words.forward_start(6, 1, false), (12, false));
    }

    #[test]
    fn test_forward_start_stops_on_empty_line() {
        let text = TextSnapshot::new("one\n\ntwo");
        let words = scanner(&text);
        assert_eq!(words.forward_start(0, 1, false), (4, false));
        assert_eq!(words.forward_start(4, 1, false), (5, false));
    }

    #[test]
    fn test_forward_start_stops_at_line_end_for_operator() {
        let text = TextSnapshot::new("one two\n  three");
        let words = scanner(&text);
        assert_eq!(words.forward_start(4, 1, true), (7, false));
        assert_eq!(words.forward_start(4, 1, false), (10, false));
    }

    #[test]
    fn test_backward_start() {
        let text = TextSnapshot::new("alpha beta\n\n  gamma");
        let words = scanner(&text);
        assert_eq!(words.backward_start(14, 1), 11);
        assert_eq!(words.backward_start(11, 1), 6);
        assert_eq!(words.backward_start(8, 1), 6);
        assert_eq!(words.backward_start(6, 2), 0);
        assert_eq!(words.backward_start(0, 1), 0);
    }

    #[test]
    fn test_forward_end() {
        let text = TextSnapshot::new("alpha beta");
        let words = scanner(&text);
        assert_eq!(words.forward_end(0, 1, false), 4);
        assert_eq!(words.forward_end(4, 1, false), 9);
        assert_eq!(words.forward_end(4, 1, true), 4);
        assert_eq!(words.forward_end(9, 1, false), 9);
    }

    #[test]
    fn test_run_at() {
        let text = TextSnapshot::new("foo   bar.baz");
        let words = scanner(&text);
        assert_eq!(words.run_at(1), (0, 3));
        assert_eq!(words.run_at(4), (3, 6));
        assert_eq!(words.run_at(9), (9, 10));
    }
}
