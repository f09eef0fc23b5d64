//! Text object selection (`iw`, `a(`, `i"`, `ap`, ...).

use super::word::WordScanner;
use crate::error::MotionError;
use crate::text::{is_blank, Span, TextSnapshot, WordKind};

/// `iw` / `aw` and their WORD forms.
pub(crate) fn word(
    text: &TextSnapshot,
    position: usize,
    kind: WordKind,
    around: bool,
    count: usize,
) -> Result<Span, MotionError> {
    let words = WordScanner::new(text, kind);
    let line = text.line_of(position);
    let line_end = text.line_end(line);
    if text.line_len(line) == 0 {
        return Err(MotionError::TextObjectNotFound);
    }

    let (start, mut end) = words.run_at(position);
    let started_on_blank = words.is_blank_at(start);

    if !around {
        // Each further count adds the next run, blank or not.
        for _ in 1..count.max(1) {
            if end >= line_end {
                break;
            }
            end = words.run_at(end).1;
        }
        return Ok(Span::new(start, end));
    }

    let mut start = start;
    for i in 0..count.max(1) {
        if end >= line_end {
            break;
        }
        if i == 0 && started_on_blank {
            // Leading white space plus the following word.
            end = words.run_at(end).1;
        } else {
            let next = words.run_at(end);
            if words.is_blank_at(next.0) {
                end = next.1;
            } else if i == 0 {
                break;
            } else {
                end = next.1;
            }
        }
    }

    // `aw` without trailing white space takes the white space before the word.
    let has_trailing = end > 0 && words.is_blank_at(end - 1);
    if !started_on_blank && !has_trailing {
        let line_start = text.line_start(line);
        while start > line_start && text.char_at(start - 1).is_some_and(is_blank) {
            start -= 1;
        }
    }
    Ok(Span::new(start, end))
}

/// `ip` / `ap`. Returns the first and last line, inclusive.
pub(crate) fn paragraph(
    text: &TextSnapshot,
    position: usize,
    around: bool,
    count: usize,
) -> (usize, usize) {
    let last = text.last_line();
    let line = text.line_of(position);
    let blank = |l: usize| text.is_blank_line(l);

    let mut first = line;
    while first > 0 && blank(first - 1) == blank(line) {
        first -= 1;
    }

    let run_end = |from: usize| {
        let mut l = from;
        while l < last && blank(l + 1) == blank(from) {
            l += 1;
        }
        l
    };

    let mut end = run_end(line);
    let runs = if around { count.max(1) * 2 } else { count.max(1) };
    for _ in 1..runs {
        if end >= last {
            break;
        }
        end = run_end(end + 1);
    }

    // `ap` at the end of the buffer takes the blank lines before the paragraph.
    if around && runs >= 2 && end == run_end(line) && !blank(line) {
        while first > 0 && blank(first - 1) {
            first -= 1;
        }
    }
    (first, end)
}

/// `i(` / `a(` and the other bracket pairs.
pub(crate) fn block(
    text: &TextSnapshot,
    position: usize,
    open: char,
    close: char,
    around: bool,
    count: usize,
) -> Result<Span, MotionError> {
    let chars = text.chars();
    if chars.is_empty() {
        return Err(MotionError::TextObjectNotFound);
    }
    let position = position.min(chars.len() - 1);

    // Find the opening bracket `count` levels out.
    let mut open_at = None;
    let mut search_from = position;
    for _ in 0..count.max(1) {
        let mut depth = 0usize;
        let mut i = search_from;
        let found = loop {
            let c = chars[i];
            if c == close && i != position {
                depth += 1;
            } else if c == open {
                if depth == 0 {
                    break Some(i);
                }
                depth -= 1;
            }
            if i == 0 {
                break None;
            }
            i -= 1;
        };
        let Some(found) = found else {
            return Err(MotionError::TextObjectNotFound);
        };
        open_at = Some(found);
        if found == 0 {
            break;
        }
        search_from = found - 1;
    }
    let open_at = open_at.ok_or(MotionError::TextObjectNotFound)?;

    let mut depth = 0usize;
    let close_at = (open_at + 1..chars.len())
        .find(|&i| {
            let c = chars[i];
            if c == open {
                depth += 1;
            } else if c == close {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            }
            false
        })
        .ok_or(MotionError::TextObjectNotFound)?;

    if around {
        return Ok(Span::new(open_at, close_at + 1));
    }

    let mut start = open_at + 1;
    let mut end = close_at;
    // A bracket that ends its line and a closing bracket alone on its line
    // leave their line breaks out of the inner block.
    if text.char_at(start) == Some('\n') {
        start += 1;
    }
    let close_line = text.line_of(close_at);
    if close_line > text.line_of(open_at)
        && start <= end
        && text.first_non_blank(close_line) == close_at
        && text.line_start(close_line) > start
    {
        end = text.line_end(close_line - 1);
    }
    Ok(Span::new(start, end.max(start)))
}

/// `i"` / `a"`: quotes are paired from the start of the line.
pub(crate) fn quote(
    text: &TextSnapshot,
    position: usize,
    quote: char,
    around: bool,
) -> Result<Span, MotionError> {
    let line = text.line_of(position);
    let line_start = text.line_start(line);
    let line_end = text.line_end(line);

    let mut quotes = Vec::new();
    let mut i = line_start;
    while i < line_end {
        match text.char_at(i) {
            Some('\\') => i += 1,
            Some(c) if c == quote => quotes.push(i),
            _ => {}
        }
        i += 1;
    }

    let pair = quotes
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .find(|&(_, close)| position <= close)
        .ok_or(MotionError::TextObjectNotFound)?;
    let (open_at, close_at) = pair;

    if !around {
        return Ok(Span::new(open_at + 1, close_at));
    }

    let mut start = open_at;
    let mut end = close_at + 1;
    let trailing_end = (end..line_end)
        .find(|&i| !text.char_at(i).is_some_and(is_blank))
        .unwrap_or(line_end);
    if trailing_end > end {
        end = trailing_end;
    } else {
        while start > line_start && text.char_at(start - 1).is_some_and(is_blank) {
            start -= 1;
        }
    }
    Ok(Span::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(text: &TextSnapshot, span: Result<Span, MotionError>) -> String {
        text.slice(span.unwrap())
    }

    #[test]
    fn test_inner_and_around_word() {
        let text = TextSnapshot::new("foo bar baz");
        assert_eq!(slice(&text, word(&text, 5, WordKind::NormalWord, false, 1)), "bar");
        assert_eq!(slice(&text, word(&text, 5, WordKind::NormalWord, true, 1)), "bar ");
        assert_eq!(slice(&text, word(&text, 9, WordKind::NormalWord, true, 1)), " baz");
        assert_eq!(slice(&text, word(&text, 3, WordKind::NormalWord, true, 1)), " bar");
        assert_eq!(slice(&text, word(&text, 0, WordKind::NormalWord, false, 3)), "foo bar");
    }

    #[test]
    fn test_word_on_empty_line() {
        let text = TextSnapshot::new("a\n\nb");
        assert_eq!(
            word(&text, 2, WordKind::NormalWord, false, 1),
            Err(MotionError::TextObjectNotFound)
        );
    }

    #[test]
    fn test_paragraph() {
        let text = TextSnapshot::new("a\nb\n\nc\nd\n\ne");
        assert_eq!(paragraph(&text, 0, false, 1), (0, 1));
        assert_eq!(paragraph(&text, 0, true, 1), (0, 2));
        assert_eq!(paragraph(&text, 4, false, 1), (2, 2));
        assert_eq!(paragraph(&text, 12, true, 1), (5, 6));
    }

    #[test]
    fn test_block() {
        let text = TextSnapshot::new("f(a, (b), c)");
        assert_eq!(slice(&text, block(&text, 2, '(', ')', false, 1)), "a, (b), c");
        assert_eq!(slice(&text, block(&text, 6, '(', ')', true, 1)), "(b)");
        assert_eq!(slice(&text, block(&text, 6, '(', ')', true, 2)), "(a, (b), c)");
        assert_eq!(slice(&text, block(&text, 1, '(', ')', true, 1)), "(a, (b), c)");
        assert_eq!(slice(&text, block(&text, 11, '(', ')', false, 1)), "a, (b), c");
        assert_eq!(
            block(&text, 0, '(', ')', false, 1),
            Err(MotionError::TextObjectNotFound)
        );
    }

    #[test]
    fn test_block_excludes_bracket_lines() {
        let text = TextSnapshot::new("if {\n    body\n}");
        assert_eq!(slice(&text, block(&text, 8, '{', '}', false, 1)), "    body");
    }

    #[test]
    fn test_quote() {
        let text = TextSnapshot::new(r#"say "hi there" now"#);
        assert_eq!(slice(&text, quote(&text, 6, '"', false)), "hi there");
        assert_eq!(slice(&text, quote(&text, 6, '"', true)), "\"hi there\" ");
        assert_eq!(slice(&text, quote(&text, 0, '"', false)), "hi there");
        assert_eq!(quote(&text, 16, '"', false), Err(MotionError::TextObjectNotFound));
    }
}
