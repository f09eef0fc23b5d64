//! Pattern search.

use regex::{Regex, RegexBuilder};

use crate::error::MotionError;
use crate::text::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl SearchDirection {
    pub fn reverse(self) -> Self {
        match self {
            SearchDirection::Forward => SearchDirection::Backward,
            SearchDirection::Backward => SearchDirection::Forward,
        }
    }

    pub fn is_forward(self) -> bool {
        self == SearchDirection::Forward
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub ignore_case: bool,
    /// With `ignore_case`, a pattern containing an uppercase letter is
    /// matched case-sensitively.
    pub smart_case: bool,
    /// Continue from the other end of the buffer when nothing is found.
    pub wrap: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            ignore_case: false,
            smart_case: false,
            wrap: true,
        }
    }
}

/// Pattern-match service used by search motions.
///
/// A forward search finds the first match starting after `start`; a backward
/// search finds the last match starting before `start`.
pub trait SearchService {
    fn find(
        &self,
        text: &str,
        pattern: &str,
        start: usize,
        direction: SearchDirection,
        options: SearchOptions,
    ) -> Result<Option<Span>, MotionError>;
}

/// [`SearchService`] backed by the `regex` crate.
///
/// A few Vim pattern atoms are translated: `\<` and `\>` become word
/// boundaries, `\c` forces case-insensitive and `\C` case-sensitive matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexSearchService;

impl RegexSearchService {
    fn compile(pattern: &str, options: SearchOptions) -> Result<Regex, MotionError> {
        let mut ignore_case = options.ignore_case;
        if options.ignore_case && options.smart_case && pattern.chars().any(char::is_uppercase) {
            ignore_case = false;
        }

        let mut translated = String::with_capacity(pattern.len());
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                translated.push(c);
                continue;
            }
            match chars.next() {
                Some('<') | Some('>') => translated.push_str("\\b"),
                Some('c') => ignore_case = true,
                Some('C') => ignore_case = false,
                Some(other) => {
                    translated.push('\\');
                    translated.push(other);
                }
                None => translated.push_str("\\\\"),
            }
        }

        RegexBuilder::new(&translated)
            .case_insensitive(ignore_case)
            .multi_line(true)
            .build()
            .map_err(|_| MotionError::InvalidPattern(pattern.to_string()))
    }
}

impl SearchService for RegexSearchService {
    fn find(
        &self,
        text: &str,
        pattern: &str,
        start: usize,
        direction: SearchDirection,
        options: SearchOptions,
    ) -> Result<Option<Span>, MotionError> {
        let re = Self::compile(pattern, options)?;

        // Byte offset -> char offset for every match start/end.
        let matches: Vec<Span> = re
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| {
                let start = text[..m.start()].chars().count();
                let len = m.as_str().chars().count();
                Span::new(start, start + len)
            })
            .collect();

        let found = match direction {
            SearchDirection::Forward => matches
                .iter()
                .find(|m| m.start() > start)
                .or_else(|| options.wrap.then(|| matches.first()).flatten()),
            SearchDirection::Backward => matches
                .iter()
                .rev()
                .find(|m| m.start() < start)
                .or_else(|| options.wrap.then(|| matches.last()).flatten()),
        };

        Ok(found.copied())
    }
}
