//! Motion computation.

use tracing::trace;

use super::text_object;
use super::word::WordScanner;
use super::{
    CharSearch, CharSearchKind, DesiredColumn, Motion, MotionData, MotionKind, MotionResult,
    MotionResultFlags, MotionState, TextObject,
};
use crate::error::MotionError;
use crate::host::{SearchDirection, SearchOptions, SearchService};
use crate::text::{Span, TextSnapshot, WordKind};

/// Computes [`MotionResult`]s against one snapshot of the buffer.
pub struct MotionEngine<'a> {
    text: &'a TextSnapshot,
    search: &'a dyn SearchService,
    options: SearchOptions,
    state: &'a mut MotionState,
}

impl<'a> MotionEngine<'a> {
    pub fn new(
        text: &'a TextSnapshot,
        search: &'a dyn SearchService,
        options: SearchOptions,
        state: &'a mut MotionState,
    ) -> Self {
        Self {
            text,
            search,
            options,
            state,
        }
    }

    /// Applies `data.motion` from `start`.
    ///
    /// `start` is clamped to the snapshot first, so a position computed
    /// before a host edit never indexes past the end.
    pub fn compute(&mut self, start: usize, data: &MotionData) -> Result<MotionResult, MotionError> {
        let start = start.min(self.text.len());
        let count = data.argument.count();
        let after_operator = data.argument.is_after_operator();

        let mut result = match &data.motion {
            Motion::CharLeft => self.char_left(start, count)?,
            Motion::CharRight => self.char_right(start, count, after_operator)?,
            Motion::LineDown => self.line_down(start, count, false)?,
            Motion::LineUp => self.line_up(start, count, false)?,
            Motion::LineDownToFirstNonBlank => self.line_down(start, count, true)?,
            Motion::LineUpToFirstNonBlank => self.line_up(start, count, true)?,
            Motion::WordForward(kind) => self.word_forward(start, *kind, count, after_operator),
            Motion::WordBackward(kind) => {
                let target = WordScanner::new(self.text, *kind).backward_start(start, count);
                self.character(start, target, MotionKind::CharacterWiseExclusive, target)
            }
            Motion::EndOfWord(kind) => self.end_of_word(start, *kind, count, false),
            Motion::ChangeWord(kind) => {
                if WordScanner::new(self.text, *kind).is_blank_at(start) {
                    self.word_forward(start, *kind, count, true)
                } else {
                    self.end_of_word(start, *kind, count, true)
                }
            }
            Motion::BeginningOfLine => {
                let target = self.text.line_start(self.text.line_of(start));
                self.character(start, target, MotionKind::CharacterWiseExclusive, target)
            }
            Motion::FirstNonBlank => {
                let target = self.text.first_non_blank(self.text.line_of(start));
                let caret = self.text.clamp_caret(target);
                self.character(start, target, MotionKind::CharacterWiseExclusive, caret)
            }
            Motion::EndOfLine => self.end_of_line(start, count),
            Motion::FirstLine => {
                let line = data.argument.raw_count().map_or(0, |n| n.saturating_sub(1));
                self.to_line(start, line)
            }
            Motion::LastLine => {
                let line = data
                    .argument
                    .raw_count()
                    .map_or(self.text.last_line(), |n| n.saturating_sub(1));
                self.to_line(start, line)
            }
            Motion::ParagraphForward => self.paragraph_forward(start, count),
            Motion::ParagraphBackward => self.paragraph_backward(start, count),
            Motion::CharSearch(search) => {
                self.state.last_char_search = Some(*search);
                self.char_search(start, *search, count, false)?
            }
            Motion::RepeatCharSearch => {
                let search = self
                    .state
                    .last_char_search
                    .ok_or(MotionError::NoPreviousCharSearch)?;
                self.char_search(start, search, count, true)?
            }
            Motion::RepeatCharSearchReverse => {
                let search = self
                    .state
                    .last_char_search
                    .ok_or(MotionError::NoPreviousCharSearch)?;
                self.char_search(start, search.reversed(), count, true)?
            }
            Motion::Search { pattern, direction } => {
                let pattern = if pattern.is_empty() {
                    self.state
                        .last_search
                        .as_ref()
                        .map(|(last, _)| last.clone())
                        .ok_or(MotionError::NoPreviousSearch)?
                } else {
                    pattern.clone()
                };
                self.state.last_search = Some((pattern.clone(), *direction));
                self.state.search_highlight = true;
                self.search(start, &pattern, *direction, count)?
            }
            Motion::NextMatch | Motion::PreviousMatch => {
                let (pattern, direction) = self
                    .state
                    .last_search
                    .clone()
                    .ok_or(MotionError::NoPreviousSearch)?;
                let direction = if data.motion == Motion::PreviousMatch {
                    direction.reverse()
                } else {
                    direction
                };
                self.state.search_highlight = true;
                self.search(start, &pattern, direction, count)?
            }
            Motion::MatchingToken => match data.argument.raw_count() {
                Some(percent) => self.percent_of_file(start, percent),
                None => self.matching_token(start)?,
            },
            Motion::TextObject(object) => self.text_object(start, *object, count)?,
            Motion::WholeLine => {
                let line = self.text.line_of(start);
                let last = (line + count - 1).min(self.text.last_line());
                let caret = self.text.first_non_blank(line);
                self.lines(line, last, caret, true)
            }
        };

        if after_operator {
            self.adjust_exclusive(&mut result);
        }
        self.finish(start, &mut result);
        self.state.desired_column = match &data.motion {
            _ if after_operator => None,
            Motion::LineDown | Motion::LineUp => Some(DesiredColumn {
                column: self.wanted_column(start),
                at: result.caret,
            }),
            Motion::EndOfLine => Some(DesiredColumn {
                column: usize::MAX,
                at: result.caret,
            }),
            _ => None,
        };
        trace!(motion = ?data.motion, span = ?result.span, kind = ?result.kind, "motion computed");
        Ok(result)
    }

    fn character(&self, start: usize, target: usize, kind: MotionKind, caret: usize) -> MotionResult {
        let (low, high) = if target >= start {
            (start, target)
        } else {
            (target, start)
        };
        let end = if kind == MotionKind::CharacterWiseInclusive {
            (high + 1).min(self.text.len())
        } else {
            high
        };
        MotionResult {
            span: Span::new(low, end),
            is_forward: target >= start,
            kind,
            flags: MotionResultFlags::empty(),
            caret,
        }
    }

    fn lines(&self, from: usize, to: usize, caret: usize, is_forward: bool) -> MotionResult {
        let (first, last) = (from.min(to), from.max(to));
        MotionResult {
            span: Span::new(
                self.text.line_start(first),
                self.text.line_end_including_break(last),
            ),
            is_forward,
            kind: MotionKind::LineWise,
            flags: MotionResultFlags::empty(),
            caret,
        }
    }

    fn char_left(&self, start: usize, count: usize) -> Result<MotionResult, MotionError> {
        let column = self.text.column_of(start);
        if column == 0 {
            return Err(MotionError::NoMovement);
        }
        let target = start - count.min(column);
        Ok(self.character(start, target, MotionKind::CharacterWiseExclusive, target))
    }

    fn char_right(
        &self,
        start: usize,
        count: usize,
        after_operator: bool,
    ) -> Result<MotionResult, MotionError> {
        let line = self.text.line_of(start);
        let line_end = self.text.line_end(line);
        if self.text.line_len(line) == 0 {
            return Err(MotionError::NoMovement);
        }
        // An operator may cover the last character; the caret may not pass it.
        let limit = if after_operator { line_end } else { line_end - 1 };
        if start >= limit {
            return Err(MotionError::NoMovement);
        }
        let target = (start + count).min(limit);
        Ok(self.character(start, target, MotionKind::CharacterWiseExclusive, target))
    }

    fn wanted_column(&self, start: usize) -> usize {
        match self.state.desired_column {
            Some(desired) if desired.at == start => desired.column,
            _ => self.text.column_of(start),
        }
    }

    fn line_down(
        &self,
        start: usize,
        count: usize,
        first_non_blank: bool,
    ) -> Result<MotionResult, MotionError> {
        let line = self.text.line_of(start);
        let last = self.text.last_line();
        if line >= last {
            return Err(MotionError::NoMovement);
        }
        let target = (line + count).min(last);
        let caret = if first_non_blank {
            self.text.clamp_caret(self.text.first_non_blank(target))
        } else {
            self.text.caret_position(target, self.wanted_column(start))
        };
        Ok(self.lines(line, target, caret, true))
    }

    fn line_up(
        &self,
        start: usize,
        count: usize,
        first_non_blank: bool,
    ) -> Result<MotionResult, MotionError> {
        let line = self.text.line_of(start);
        if line == 0 {
            return Err(MotionError::NoMovement);
        }
        let target = line.saturating_sub(count);
        let caret = if first_non_blank {
            self.text.clamp_caret(self.text.first_non_blank(target))
        } else {
            self.text.caret_position(target, self.wanted_column(start))
        };
        Ok(self.lines(line, target, caret, false))
    }

    fn to_line(&self, start: usize, line: usize) -> MotionResult {
        let from = self.text.line_of(start);
        let line = line.min(self.text.last_line());
        let caret = self.text.clamp_caret(self.text.first_non_blank(line));
        self.lines(from, line, caret, line >= from)
    }

    fn word_forward(
        &self,
        start: usize,
        kind: WordKind,
        count: usize,
        after_operator: bool,
    ) -> MotionResult {
        let (target, _) = WordScanner::new(self.text, kind).forward_start(start, count, after_operator);
        let caret = self.text.clamp_caret(target);
        let mut result = self.character(start, target, MotionKind::CharacterWiseExclusive, caret);
        if after_operator {
            self.truncate_word(start, &mut result);
        }
        result
    }

    /// An operator's word motion that ends at or before the first non-blank
    /// of a later line stops at the end of the last line it moved over
    /// instead. Blank-only lines in between are skipped.
    fn truncate_word(&self, start: usize, result: &mut MotionResult) {
        let start_line = self.text.line_of(start);
        let end = result.span.end();
        let end_line = self.text.line_of(end);
        if end_line <= start_line || end > self.text.first_non_blank(end_line) {
            return;
        }

        let mut line = end_line - 1;
        while line > start_line && self.text.is_blank_line(line) {
            line -= 1;
        }
        let new_end = self.text.line_end(line);
        if new_end > result.span.start() {
            result.span = Span::new(result.span.start(), new_end);
            result.flags |= MotionResultFlags::WORD_TRUNCATED;
        }
    }

    fn end_of_word(&self, start: usize, kind: WordKind, count: usize, stay_on_end: bool) -> MotionResult {
        let target = WordScanner::new(self.text, kind).forward_end(start, count, stay_on_end);
        self.character(start, target, MotionKind::CharacterWiseInclusive, target)
    }

    fn end_of_line(&self, start: usize, count: usize) -> MotionResult {
        let line = (self.text.line_of(start) + count - 1).min(self.text.last_line());
        let end = self.text.line_end(line);
        MotionResult {
            span: Span::new(start, end.max(start)),
            is_forward: true,
            kind: MotionKind::CharacterWiseInclusive,
            flags: MotionResultFlags::empty(),
            caret: self.text.caret_position(line, usize::MAX),
        }
    }

    fn paragraph_forward(&self, start: usize, count: usize) -> MotionResult {
        let last = self.text.last_line();
        let mut line = self.text.line_of(start);
        for _ in 0..count {
            while line < last && self.text.is_empty_line(line) {
                line += 1;
            }
            while line < last && !self.text.is_empty_line(line) {
                line += 1;
            }
        }

        if self.text.is_empty_line(line) && line != self.text.line_of(start) {
            let target = self.text.line_start(line);
            self.character(start, target, MotionKind::CharacterWiseExclusive, target)
        } else {
            // No boundary left: run to the end of the buffer, inclusive.
            let end = self.text.len();
            MotionResult {
                span: Span::new(start, end),
                is_forward: true,
                kind: MotionKind::CharacterWiseInclusive,
                flags: MotionResultFlags::empty(),
                caret: self.text.clamp_caret(end),
            }
        }
    }

    fn paragraph_backward(&self, start: usize, count: usize) -> MotionResult {
        let mut line = self.text.line_of(start);
        for _ in 0..count {
            while line > 0 && self.text.is_empty_line(line) {
                line -= 1;
            }
            while line > 0 && !self.text.is_empty_line(line) {
                line -= 1;
            }
        }
        let target = self.text.line_start(line);
        self.character(start, target, MotionKind::CharacterWiseExclusive, target)
    }

    fn char_search(
        &self,
        start: usize,
        search: CharSearch,
        count: usize,
        repeat: bool,
    ) -> Result<MotionResult, MotionError> {
        let line = self.text.line_of(start);
        let line_start = self.text.line_start(line);
        let line_end = self.text.line_end(line);
        let till = search.kind == CharSearchKind::TillChar;
        let not_found = MotionError::CharNotFound(search.target);

        match search.direction {
            SearchDirection::Forward => {
                let mut from = start + 1;
                // `;` after `t` must not get stuck on the adjacent match.
                if repeat && till && self.text.char_at(start + 1) == Some(search.target) {
                    from += 1;
                }
                let found = (from..line_end)
                    .filter(|&i| self.text.char_at(i) == Some(search.target))
                    .nth(count - 1)
                    .ok_or(not_found)?;
                let target = if till { found - 1 } else { found };
                Ok(self.character(start, target, MotionKind::CharacterWiseInclusive, target))
            }
            SearchDirection::Backward => {
                let mut to = start;
                if repeat && till && start > 0 && self.text.char_at(start - 1) == Some(search.target) {
                    to -= 1;
                }
                let found = (line_start..to.max(line_start))
                    .rev()
                    .filter(|&i| self.text.char_at(i) == Some(search.target))
                    .nth(count - 1)
                    .ok_or(not_found)?;
                let target = if till { found + 1 } else { found };
                Ok(self.character(start, target, MotionKind::CharacterWiseExclusive, target))
            }
        }
    }

    fn search(
        &self,
        start: usize,
        pattern: &str,
        direction: SearchDirection,
        count: usize,
    ) -> Result<MotionResult, MotionError> {
        let text = self.text.text();
        let mut position = start;
        for _ in 0..count {
            let found = self
                .search
                .find(&text, pattern, position, direction, self.options)?
                .ok_or_else(|| MotionError::PatternNotFound(pattern.to_string()))?;
            position = found.start();
        }

        let mut result = self.character(
            start,
            position,
            MotionKind::CharacterWiseExclusive,
            self.text.clamp_caret(position),
        );
        // A wrapped search still counts as moving in the search direction.
        result.is_forward = direction.is_forward();
        Ok(result)
    }

    fn matching_token(&self, start: usize) -> Result<MotionResult, MotionError> {
        const PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];

        let line_end = self.text.line_end(self.text.line_of(start));
        let (at, c) = (start..line_end)
            .find_map(|i| {
                let c = self.text.char_at(i)?;
                PAIRS
                    .iter()
                    .any(|&(open, close)| c == open || c == close)
                    .then_some((i, c))
            })
            .ok_or(MotionError::NoMatchingToken)?;

        let mut depth = 0usize;
        let target = if let Some(&(open, close)) = PAIRS.iter().find(|&&(open, _)| open == c) {
            (at + 1..self.text.len()).find(|&i| {
                let ch = self.text.char_at(i);
                if ch == Some(open) {
                    depth += 1;
                } else if ch == Some(close) {
                    if depth == 0 {
                        return true;
                    }
                    depth -= 1;
                }
                false
            })
        } else {
            let &(open, close) = PAIRS
                .iter()
                .find(|&&(_, close)| close == c)
                .ok_or(MotionError::NoMatchingToken)?;
            (0..at).rev().find(|&i| {
                let ch = self.text.char_at(i);
                if ch == Some(close) {
                    depth += 1;
                } else if ch == Some(open) {
                    if depth == 0 {
                        return true;
                    }
                    depth -= 1;
                }
                false
            })
        }
        .ok_or(MotionError::NoMatchingToken)?;

        Ok(self.character(start, target, MotionKind::CharacterWiseInclusive, target))
    }

    /// `{count}%` jumps to that percentage of the buffer.
    fn percent_of_file(&self, start: usize, percent: usize) -> MotionResult {
        let percent = percent.min(100);
        let line = (percent * self.text.line_count()).div_ceil(100).saturating_sub(1);
        self.to_line(start, line)
    }

    fn text_object(
        &self,
        start: usize,
        object: TextObject,
        count: usize,
    ) -> Result<MotionResult, MotionError> {
        let span = match object {
            TextObject::Word { kind, around } => {
                text_object::word(self.text, start, kind, around, count)?
            }
            TextObject::Paragraph { around } => {
                let (first, last) = text_object::paragraph(self.text, start, around, count);
                return Ok(self.lines(first, last, self.text.line_start(last), true));
            }
            TextObject::Block {
                open,
                close,
                around,
            } => text_object::block(self.text, start, open, close, around, count)?,
            TextObject::Quote { quote, around } => {
                text_object::quote(self.text, start, quote, around)?
            }
        };
        Ok(MotionResult {
            span,
            is_forward: true,
            kind: MotionKind::CharacterWiseInclusive,
            flags: MotionResultFlags::empty(),
            caret: span.end().saturating_sub(1).max(span.start()),
        })
    }

    /// `:help exclusive-linewise`.
    fn adjust_exclusive(&self, result: &mut MotionResult) {
        if result.kind != MotionKind::CharacterWiseExclusive
            || result.flags.contains(MotionResultFlags::WORD_TRUNCATED)
        {
            return;
        }
        let start_line = self.text.line_of(result.span.start());
        let end_line = self.text.line_of(result.span.end());
        if end_line <= start_line || result.span.end() != self.text.line_start(end_line) {
            return;
        }

        if result.span.start() <= self.text.first_non_blank(start_line) {
            result.span = Span::new(
                self.text.line_start(start_line),
                self.text.line_end_including_break(end_line - 1),
            );
            result.kind = MotionKind::LineWise;
            result.flags |= MotionResultFlags::EXCLUSIVE_LINEWISE;
        } else {
            result.span = Span::new(result.span.start(), self.text.line_end(end_line - 1));
            result.kind = MotionKind::CharacterWiseInclusive;
            result.flags |= MotionResultFlags::EXCLUSIVE_PROMOTED;
        }
    }

    fn finish(&self, start: usize, result: &mut MotionResult) {
        let span = result.span.clamp(self.text.len());
        result.span = span;
        result.caret = result.caret.min(self.text.len());

        let last_char = span.end().saturating_sub(1).max(span.start());
        if self.text.line_of(span.start()) != self.text.line_of(last_char) {
            result.flags |= MotionResultFlags::SPANS_MULTIPLE_LINES;
        }
        if result.caret == start && (span.is_empty() || result.is_line_wise()) {
            result.flags |= MotionResultFlags::NO_MOVEMENT;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RegexSearchService;
    use crate::motion::{MotionArgument, MotionContext};

    struct Fixture {
        text: TextSnapshot,
        state: MotionState,
    }

    impl Fixture {
        fn new(text: &str) -> Self {
            Self {
                text: TextSnapshot::new(text),
                state: MotionState::default(),
            }
        }

        fn run(
            &mut self,
            start: usize,
            motion: Motion,
            context: MotionContext,
            count: Option<usize>,
        ) -> Result<MotionResult, MotionError> {
            let data = MotionData::new(motion, MotionArgument::new(context, count, None));
            MotionEngine::new(
                &self.text,
                &RegexSearchService,
                SearchOptions::default(),
                &mut self.state,
            )
            .compute(start, &data)
        }

        fn movement(&mut self, start: usize, motion: Motion) -> usize {
            self.run(start, motion, MotionContext::BeforeOperator, None)
                .unwrap()
                .caret
        }

        fn operator_text(&mut self, start: usize, motion: Motion, count: Option<usize>) -> String {
            let result = self
                .run(start, motion, MotionContext::AfterOperator, count)
                .unwrap();
            self.text.slice(result.span)
        }
    }

    const W: Motion = Motion::WordForward(WordKind::NormalWord);

    #[test]
    fn test_word_forward_counts() {
        let mut fx = Fixture::new("alpha beta gamma delta");
        let result = fx
            .run(0, W, MotionContext::AfterOperator, Some(3))
            .unwrap();
        assert_eq!(fx.text.slice(result.span), "alpha beta gamma ");
        assert_eq!(result.kind, MotionKind::CharacterWiseExclusive);
        assert!(result.is_forward);
    }

    #[test]
    fn test_dw_on_last_word_clamps_to_buffer_end() {
        let mut fx = Fixture::new("alpha beta");
        let result = fx.run(6, W, MotionContext::AfterOperator, None).unwrap();
        assert_eq!(result.span, Span::new(6, 10));
        assert!(result.span.start() <= result.span.end());

        // Movement on the last word stays on the last character.
        assert_eq!(fx.movement(6, W), 9);
    }

    #[test]
    fn test_dw_stops_at_line_end() {
        let mut fx = Fixture::new("one two\n  three");
        assert_eq!(fx.operator_text(4, W, None), "two");
        assert_eq!(fx.operator_text(0, W, Some(2)), "one two");
        assert_eq!(fx.movement(4, W), 10);
    }

    #[test]
    fn test_word_truncation_over_blank_line() {
        let mut fx = Fixture::new("one\n\n  two");
        // From the empty line `dw` covers the whole line.
        let result = fx.run(4, W, MotionContext::AfterOperator, None).unwrap();
        assert_eq!(result.kind, MotionKind::LineWise);
        assert_eq!(fx.text.slice(result.span), "\n");
    }

    #[test]
    fn test_no_movement_flag() {
        let mut fx = Fixture::new("alpha beta");
        let result = fx
            .run(0, Motion::BeginningOfLine, MotionContext::BeforeOperator, None)
            .unwrap();
        assert!(!result.has_movement());
        let result = fx.run(0, W, MotionContext::BeforeOperator, None).unwrap();
        assert!(result.has_movement());
    }

    #[test]
    fn test_word_backward_and_end() {
        let mut fx = Fixture::new("foo bar.baz");
        assert_eq!(fx.movement(8, Motion::WordBackward(WordKind::NormalWord)), 7);
        assert_eq!(fx.movement(8, Motion::WordBackward(WordKind::BigWord)), 4);
        assert_eq!(fx.movement(0, Motion::EndOfWord(WordKind::NormalWord)), 2);
        assert_eq!(
            fx.operator_text(4, Motion::EndOfWord(WordKind::NormalWord), None),
            "bar"
        );
    }

    #[test]
    fn test_change_word_acts_like_end_of_word() {
        let mut fx = Fixture::new("foo bar");
        assert_eq!(
            fx.operator_text(0, Motion::ChangeWord(WordKind::NormalWord), None),
            "foo"
        );
        assert_eq!(
            fx.operator_text(2, Motion::ChangeWord(WordKind::NormalWord), None),
            "o"
        );
    }

    #[test]
    fn test_char_left_right() {
        let mut fx = Fixture::new("abc\ndef");
        assert_eq!(
            fx.run(0, Motion::CharLeft, MotionContext::BeforeOperator, None),
            Err(MotionError::NoMovement)
        );
        assert_eq!(fx.movement(1, Motion::CharRight), 2);
        assert_eq!(
            fx.run(2, Motion::CharRight, MotionContext::BeforeOperator, None),
            Err(MotionError::NoMovement)
        );
        assert_eq!(fx.operator_text(2, Motion::CharRight, None), "c");
        assert_eq!(fx.operator_text(1, Motion::CharRight, Some(5)), "bc");
    }

    #[test]
    fn test_line_motions_are_line_wise() {
        let mut fx = Fixture::new("one\ntwo\nthree");
        let result = fx
            .run(1, Motion::LineDown, MotionContext::AfterOperator, None)
            .unwrap();
        assert_eq!(result.kind, MotionKind::LineWise);
        assert_eq!(fx.text.slice(result.span), "one\ntwo\n");
        assert!(result.flags.contains(MotionResultFlags::SPANS_MULTIPLE_LINES));

        assert_eq!(fx.movement(1, Motion::LineDown), 5);
        assert_eq!(fx.movement(9, Motion::LineUp), 5);
        assert_eq!(
            fx.run(9, Motion::LineDown, MotionContext::BeforeOperator, None),
            Err(MotionError::NoMovement)
        );
        let result = fx
            .run(0, Motion::LineDown, MotionContext::BeforeOperator, Some(10))
            .unwrap();
        assert_eq!(result.caret, 8);
    }

    #[test]
    fn test_vertical_motions_keep_desired_column() {
        let mut fx = Fixture::new("abcdef\nab\nabcdef");
        assert_eq!(fx.movement(4, Motion::LineDown), 8);
        assert_eq!(fx.movement(8, Motion::LineDown), 14);
        // A caret that moved elsewhere forgets the column.
        assert_eq!(fx.movement(7, Motion::LineDown), 10);

        let end = fx.movement(0, Motion::EndOfLine);
        assert_eq!(end, 5);
        assert_eq!(fx.movement(end, Motion::LineDown), 8);
        assert_eq!(fx.movement(8, Motion::LineDown), 15);
    }

    #[test]
    fn test_goto_line() {
        let mut fx = Fixture::new("one\n  two\nthree");
        assert_eq!(fx.movement(0, Motion::LastLine), 10);
        let result = fx
            .run(0, Motion::LastLine, MotionContext::BeforeOperator, Some(2))
            .unwrap();
        assert_eq!(result.caret, 6);
        assert_eq!(fx.movement(12, Motion::FirstLine), 0);
    }

    #[test]
    fn test_line_edges() {
        let mut fx = Fixture::new("  abc def");
        assert_eq!(fx.movement(5, Motion::BeginningOfLine), 0);
        assert_eq!(fx.movement(5, Motion::FirstNonBlank), 2);
        assert_eq!(fx.movement(2, Motion::EndOfLine), 8);
        assert_eq!(fx.operator_text(4, Motion::EndOfLine, None), "c def");
    }

    #[test]
    fn test_char_search() {
        let mut fx = Fixture::new("a,b,c,d");
        let to = |target| {
            Motion::CharSearch(CharSearch {
                kind: CharSearchKind::ToChar,
                direction: SearchDirection::Forward,
                target,
            })
        };
        assert_eq!(fx.movement(0, to(',')), 1);
        assert_eq!(fx.operator_text(0, to(','), Some(2)), "a,b,");
        assert_eq!(fx.movement(1, Motion::RepeatCharSearch), 3);
        assert_eq!(fx.movement(3, Motion::RepeatCharSearchReverse), 1);
        assert_eq!(
            fx.run(0, to('z'), MotionContext::BeforeOperator, None),
            Err(MotionError::CharNotFound('z'))
        );

        let till = Motion::CharSearch(CharSearch {
            kind: CharSearchKind::TillChar,
            direction: SearchDirection::Forward,
            target: ',',
        });
        assert_eq!(fx.movement(0, till), 0);
        assert_eq!(fx.movement(0, Motion::RepeatCharSearch), 2);
        assert_eq!(fx.operator_text(4, till_back(), Some(2)), "b,");
    }

    fn till_back() -> Motion {
        Motion::CharSearch(CharSearch {
            kind: CharSearchKind::TillChar,
            direction: SearchDirection::Backward,
            target: ',',
        })
    }

    #[test]
    fn test_repeat_without_char_search() {
        let mut fx = Fixture::new("abc");
        assert_eq!(
            fx.run(0, Motion::RepeatCharSearch, MotionContext::BeforeOperator, None),
            Err(MotionError::NoPreviousCharSearch)
        );
    }

    #[test]
    fn test_search_motion() {
        let mut fx = Fixture::new("foo bar foo bar");
        let search = Motion::Search {
            pattern: "bar".into(),
            direction: SearchDirection::Forward,
        };
        assert_eq!(fx.movement(0, search), 4);
        assert_eq!(fx.movement(4, Motion::NextMatch), 12);
        assert_eq!(fx.movement(12, Motion::NextMatch), 4);
        let result = fx
            .run(12, Motion::PreviousMatch, MotionContext::AfterOperator, None)
            .unwrap();
        assert!(!result.is_forward);
        assert_eq!(fx.text.slice(result.span), "bar foo ");

        let missing = Motion::Search {
            pattern: "zzz".into(),
            direction: SearchDirection::Forward,
        };
        assert_eq!(
            fx.run(0, missing, MotionContext::BeforeOperator, None),
            Err(MotionError::PatternNotFound("zzz".into()))
        );
    }

    #[test]
    fn test_matching_token() {
        let mut fx = Fixture::new("x = f(a[1], b);");
        assert_eq!(fx.movement(0, Motion::MatchingToken), 13);
        assert_eq!(fx.movement(13, Motion::MatchingToken), 5);
        assert_eq!(fx.operator_text(5, Motion::MatchingToken, None), "(a[1], b)");
        let mut fx = Fixture::new("none here");
        assert_eq!(
            fx.run(0, Motion::MatchingToken, MotionContext::BeforeOperator, None),
            Err(MotionError::NoMatchingToken)
        );
    }

    #[test]
    fn test_paragraph_motions() {
        let mut fx = Fixture::new("a\nb\n\nc\nd");
        assert_eq!(fx.movement(0, Motion::ParagraphForward), 4);
        assert_eq!(fx.movement(4, Motion::ParagraphForward), 7);
        assert_eq!(fx.movement(7, Motion::ParagraphBackward), 4);

        let result = fx
            .run(0, Motion::ParagraphForward, MotionContext::AfterOperator, None)
            .unwrap();
        assert_eq!(result.kind, MotionKind::LineWise);
        assert_eq!(fx.text.slice(result.span), "a\nb\n");
    }

    #[test]
    fn test_exclusive_promoted_to_inclusive() {
        let mut fx = Fixture::new("ab cd\nef");
        let search = Motion::Search {
            pattern: "ef".into(),
            direction: SearchDirection::Forward,
        };
        let result = fx
            .run(3, search, MotionContext::AfterOperator, None)
            .unwrap();
        assert!(result.flags.contains(MotionResultFlags::EXCLUSIVE_PROMOTED));
        assert_eq!(fx.text.slice(result.span), "cd");
    }

    #[test]
    fn test_text_objects() {
        let mut fx = Fixture::new("call(foo bar)");
        let inner_word = Motion::TextObject(TextObject::Word {
            kind: WordKind::NormalWord,
            around: false,
        });
        assert_eq!(fx.operator_text(6, inner_word, None), "foo");
        let inner_paren = Motion::TextObject(TextObject::Block {
            open: '(',
            close: ')',
            around: false,
        });
        assert_eq!(fx.operator_text(6, inner_paren, None), "foo bar");
    }

    #[test]
    fn test_whole_line() {
        let mut fx = Fixture::new("one\ntwo\nthree");
        let result = fx
            .run(5, Motion::WholeLine, MotionContext::AfterOperator, Some(5))
            .unwrap();
        assert_eq!(fx.text.slice(result.span), "two\nthree");
    }

    #[test]
    fn test_span_start_never_exceeds_end() {
        let text = "a (b) \"c\" d\n\n e";
        let motions = [
            W,
            Motion::WordBackward(WordKind::BigWord),
            Motion::EndOfWord(WordKind::NormalWord),
            Motion::MatchingToken,
            Motion::ParagraphForward,
            Motion::ParagraphBackward,
            Motion::EndOfLine,
            Motion::FirstLine,
        ];
        for start in 0..=text.chars().count() {
            for motion in motions.iter().cloned() {
                let mut fx = Fixture::new(text);
                if let Ok(result) = fx.run(start, motion, MotionContext::AfterOperator, None) {
                    assert!(result.span.start() <= result.span.end());
                    assert!(result.span.end() <= fx.text.len());
                }
            }
        }
    }
}
