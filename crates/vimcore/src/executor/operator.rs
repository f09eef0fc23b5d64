//! Operators applied to motion results and selections.

use tracing::debug;

use super::{CommandExecutor, Execution};
use crate::command::{CommandData, ModeArgument, Operator};
use crate::error::ExecutionError;
use crate::mode::ModeKind;
use crate::motion::{Motion, MotionData};
use crate::register::{RegisterOperation, RegisterValue};
use crate::text::{is_blank, Span};

/// The text an operator acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    Characters(Span),
    /// Whole lines, inclusive.
    Lines { first: usize, last: usize },
    /// Columns `start_column..end_column` on each line, inclusive of lines.
    Block {
        first: usize,
        last: usize,
        start_column: usize,
        end_column: usize,
    },
}

/// How far `start_column..end_column` reaches into one line of a block.
fn block_cells(line_len: usize, start_column: usize, end_column: usize) -> Option<(usize, usize)> {
    (line_len > start_column).then(|| (start_column, end_column.min(line_len)))
}

pub(crate) fn convert_case(text: &str, operator: Operator) -> String {
    match operator {
        Operator::LowerCase => text.to_lowercase(),
        Operator::UpperCase => text.to_uppercase(),
        _ => text
            .chars()
            .flat_map(|c| {
                let swapped: Vec<char> = if c.is_uppercase() {
                    c.to_lowercase().collect()
                } else {
                    c.to_uppercase().collect()
                };
                swapped
            })
            .collect(),
    }
}

/// Display width of a line's leading white space.
fn indent_width(line: &str, tab_stop: usize) -> usize {
    let tab_stop = tab_stop.max(1);
    line.chars()
        .take_while(|c| is_blank(*c))
        .fold(0, |width, c| match c {
            '\t' => (width / tab_stop + 1) * tab_stop,
            _ => width + 1,
        })
}

fn build_indent(width: usize, tab_stop: usize, expand_tab: bool) -> String {
    if expand_tab || tab_stop == 0 {
        " ".repeat(width)
    } else {
        "\t".repeat(width / tab_stop) + &" ".repeat(width % tab_stop)
    }
}

/// Greedy fill of one paragraph to `width` columns.
fn fill_paragraph(lines: &[String], width: usize) -> Vec<String> {
    let indent: String = lines
        .first()
        .map(|line| line.chars().take_while(|c| is_blank(*c)).collect())
        .unwrap_or_default();
    let mut filled = Vec::new();
    let mut current = String::new();
    for word in lines.iter().flat_map(|line| line.split_whitespace()) {
        if current.is_empty() {
            current = format!("{indent}{word}");
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            filled.push(std::mem::take(&mut current));
            current = format!("{indent}{word}");
        }
    }
    if !current.is_empty() {
        filled.push(current);
    }
    filled
}

impl CommandExecutor<'_> {
    pub(crate) fn run_operator(
        &mut self,
        caret: usize,
        operator: Operator,
        motion: &MotionData,
        data: CommandData,
    ) -> Result<Execution, ExecutionError> {
        self.check_writable(data)?;
        let mut motion = motion.clone().with_operator_count(data.count);
        if operator == Operator::Change {
            if let Motion::WordForward(kind) = motion.motion {
                motion.motion = Motion::ChangeWord(kind);
            }
        }

        let result = self.compute_motion(caret, &motion)?;
        let region = self.region_of(&result);
        debug!(operator = operator.name(), region = ?region, "apply operator");
        self.apply_operator(
            caret,
            operator,
            region,
            data,
            motion.motion.always_numbered_register(),
            1,
        )
    }

    /// Applies `operator` to `region`. `shift_count` is the number of
    /// indent units `<` and `>` move by.
    pub(crate) fn apply_operator(
        &mut self,
        caret: usize,
        operator: Operator,
        region: Region,
        data: CommandData,
        force_numbered: bool,
        shift_count: usize,
    ) -> Result<Execution, ExecutionError> {
        self.check_writable(data)?;
        match operator {
            Operator::Yank => {
                let value = self.region_value(region);
                self.registers
                    .update(data.register_name, RegisterOperation::Yank, value, false);
                let caret = match region {
                    Region::Characters(span) => span.start().min(caret),
                    Region::Lines { first, .. } if first < self.text.line_of(caret) => {
                        self.text.caret_position(first, self.text.column_of(caret))
                    }
                    Region::Lines { .. } => caret,
                    Region::Block {
                        first,
                        start_column,
                        ..
                    } => self.text.caret_position(first, start_column),
                };
                Ok(Execution::stay(self.text.clamp_caret(caret)))
            }
            Operator::Delete => {
                let value = self.region_value(region);
                self.registers.update(
                    data.register_name,
                    RegisterOperation::Delete,
                    value,
                    force_numbered,
                );
                let caret = self.delete_region(region)?;
                Ok(Execution::stay(self.text.clamp_caret(caret)))
            }
            Operator::Change => self.change(region, data, force_numbered),
            Operator::ShiftLeft | Operator::ShiftRight => {
                let (first, last) = self.region_lines(region);
                let units = if operator == Operator::ShiftLeft {
                    -(shift_count as isize)
                } else {
                    shift_count as isize
                };
                self.shift_lines(first, last, units)?;
                Ok(Execution::stay(self.text.clamp_caret(self.text.first_non_blank(first))))
            }
            Operator::ToggleCase | Operator::LowerCase | Operator::UpperCase => {
                let caret = self.change_case(region, operator, caret)?;
                Ok(Execution::stay(self.text.clamp_caret(caret)))
            }
            Operator::Format => {
                let (first, last) = self.region_lines(region);
                let last = self.format_lines(first, last)?;
                Ok(Execution::stay(self.text.clamp_caret(self.text.first_non_blank(last))))
            }
        }
    }

    fn region_lines(&self, region: Region) -> (usize, usize) {
        match region {
            Region::Characters(span) => {
                let first = self.text.line_of(span.start());
                let last = if span.is_empty() {
                    first
                } else {
                    self.text.line_of(span.end() - 1)
                };
                (first, last)
            }
            Region::Lines { first, last } | Region::Block { first, last, .. } => (first, last),
        }
    }

    fn lines_span(&self, first: usize, last: usize) -> Span {
        Span::new(
            self.text.line_start(first),
            self.text.line_end_including_break(last),
        )
    }

    pub(crate) fn region_value(&self, region: Region) -> RegisterValue {
        match region {
            Region::Characters(span) => RegisterValue::character_wise(self.text.slice(span)),
            Region::Lines { first, last } => {
                RegisterValue::line_wise(self.text.slice(self.lines_span(first, last)))
            }
            Region::Block {
                first,
                last,
                start_column,
                end_column,
            } => {
                let rows = (first..=last)
                    .map(|line| {
                        let start = self.text.line_start(line);
                        block_cells(self.text.line_len(line), start_column, end_column)
                            .map(|(from, to)| self.text.slice(Span::new(start + from, start + to)))
                            .unwrap_or_default()
                    })
                    .collect();
                RegisterValue::block(rows).unwrap_or_default()
            }
        }
    }

    /// Removes `region` and returns where the caret goes.
    pub(crate) fn delete_region(&mut self, region: Region) -> Result<usize, ExecutionError> {
        match region {
            Region::Characters(span) => {
                self.replace(span, "")?;
                Ok(span.start())
            }
            Region::Lines { first, last } => {
                let mut span = self.lines_span(first, last);
                // The last line has no break of its own; take the one before it.
                if last >= self.text.last_line() && first > 0 {
                    span = Span::new(self.text.line_end(first - 1), span.end());
                }
                self.replace(span, "")?;
                let line = first.min(self.text.last_line());
                Ok(self.text.first_non_blank(line))
            }
            Region::Block {
                first,
                last,
                start_column,
                end_column,
            } => {
                for line in (first..=last).rev() {
                    let start = self.text.line_start(line);
                    if let Some((from, to)) =
                        block_cells(self.text.line_len(line), start_column, end_column)
                    {
                        self.replace(Span::new(start + from, start + to), "")?;
                    }
                }
                Ok(self.text.position(first, start_column))
            }
        }
    }

    fn change(
        &mut self,
        region: Region,
        data: CommandData,
        force_numbered: bool,
    ) -> Result<Execution, ExecutionError> {
        let value = self.region_value(region);
        self.registers.update(
            data.register_name,
            RegisterOperation::Delete,
            value,
            force_numbered,
        );
        match region {
            Region::Characters(span) => {
                self.replace(span, "")?;
                Ok(Execution::switch(span.start(), ModeKind::Insert))
            }
            Region::Lines { first, last } => {
                // The lines go, but an empty one stays to type into.
                let span = Span::new(self.text.line_start(first), self.text.line_end(last));
                self.replace(span, "")?;
                Ok(Execution::switch(self.text.line_start(first), ModeKind::Insert))
            }
            Region::Block {
                first,
                last,
                start_column,
                ..
            } => {
                let caret = self.delete_region(region)?;
                Ok(Execution::switch_with(
                    caret,
                    ModeKind::Insert,
                    ModeArgument::InsertBlock {
                        column: start_column,
                        first_line: first,
                        last_line: last,
                        pad: false,
                    },
                ))
            }
        }
    }

    /// Moves the indentation of non-empty lines by `units` shift widths.
    fn shift_lines(&mut self, first: usize, last: usize, units: isize) -> Result<(), ExecutionError> {
        let settings = self.settings;
        let unit = settings.shift_width.max(1) as isize;
        let lines: Vec<String> = (first..=last)
            .map(|line| {
                let text = self.text.line_text(line);
                if text.is_empty() {
                    return text;
                }
                let width = indent_width(&text, settings.tab_stop) as isize;
                let new_width = (width + units * unit).max(0) as usize;
                let body = text.trim_start_matches([' ', '\t']);
                build_indent(new_width, settings.tab_stop, settings.expand_tab) + body
            })
            .collect();
        let span = Span::new(self.text.line_start(first), self.text.line_end(last));
        self.replace(span, &lines.join("\n"))
    }

    fn change_case(
        &mut self,
        region: Region,
        operator: Operator,
        caret: usize,
    ) -> Result<usize, ExecutionError> {
        match region {
            Region::Characters(span) => {
                let converted = convert_case(&self.text.slice(span), operator);
                self.replace(span, &converted)?;
                Ok(span.start())
            }
            Region::Lines { first, last } => {
                let span = Span::new(self.text.line_start(first), self.text.line_end(last));
                let converted = convert_case(&self.text.slice(span), operator);
                self.replace(span, &converted)?;
                Ok(caret)
            }
            Region::Block {
                first,
                last,
                start_column,
                end_column,
            } => {
                for line in first..=last {
                    let start = self.text.line_start(line);
                    if let Some((from, to)) =
                        block_cells(self.text.line_len(line), start_column, end_column)
                    {
                        let span = Span::new(start + from, start + to);
                        let converted = convert_case(&self.text.slice(span), operator);
                        self.replace(span, &converted)?;
                    }
                }
                Ok(self.text.position(first, start_column))
            }
        }
    }

    /// Reflows each paragraph in `first..=last` to `text_width`. Returns the
    /// last line of the result.
    fn format_lines(&mut self, first: usize, last: usize) -> Result<usize, ExecutionError> {
        let width = match self.settings.text_width {
            0 => 79,
            width => width,
        };
        let mut output = Vec::new();
        let mut paragraph = Vec::new();
        for line in first..=last {
            let text = self.text.line_text(line);
            if self.text.is_blank_line(line) {
                output.extend(fill_paragraph(&paragraph, width));
                paragraph.clear();
                output.push(text);
            } else {
                paragraph.push(text);
            }
        }
        output.extend(fill_paragraph(&paragraph, width));

        let span = Span::new(self.text.line_start(first), self.text.line_end(last));
        self.replace(span, &output.join("\n"))?;
        Ok(first + output.len().saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_case() {
        assert_eq!(convert_case("Hello World", Operator::ToggleCase), "hELLO wORLD");
        assert_eq!(convert_case("Hello", Operator::UpperCase), "HELLO");
        assert_eq!(convert_case("Hello", Operator::LowerCase), "hello");
    }

    #[test]
    fn test_indent_width_counts_tabs_to_next_stop() {
        assert_eq!(indent_width("    x", 8), 4);
        assert_eq!(indent_width("\tx", 8), 8);
        assert_eq!(indent_width("  \tx", 4), 4);
        assert_eq!(indent_width("x", 8), 0);
    }

    #[test]
    fn test_build_indent() {
        assert_eq!(build_indent(10, 8, false), "\t  ");
        assert_eq!(build_indent(4, 8, true), "    ");
        assert_eq!(build_indent(0, 8, false), "");
    }

    #[test]
    fn test_fill_paragraph() {
        let lines = vec!["  one two".to_string(), "three four five".to_string()];
        assert_eq!(
            fill_paragraph(&lines, 14),
            vec!["  one two".to_string(), "  three four".to_string(), "  five".to_string()]
        );
    }

    #[test]
    fn test_block_cells_skips_short_lines() {
        assert_eq!(block_cells(2, 3, 5), None);
        assert_eq!(block_cells(4, 1, 3), Some((1, 3)));
        assert_eq!(block_cells(4, 1, 9), Some((1, 4)));
    }
}
