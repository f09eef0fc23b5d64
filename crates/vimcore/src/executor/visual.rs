//! Visual and Select mode commands.

use tracing::debug;

use super::operator::Region;
use super::{CommandExecutor, Execution, Selection};
use crate::command::{CommandData, ModeArgument, ModeSwitch, SelectCommand, VisualCommand};
use crate::error::ExecutionError;
use crate::mode::ModeKind;
use crate::motion::{Motion, MotionArgument, MotionContext, MotionData};
use crate::register::{OperationKind, RegisterOperation};
use crate::text::Span;

impl CommandExecutor<'_> {
    /// The text a selection covers in `mode`.
    pub(crate) fn selection_region(&self, mode: ModeKind, selection: Selection) -> Region {
        let start = selection.start().min(self.text.len());
        let end = selection.end().min(self.text.len());
        match mode {
            ModeKind::VisualLine => Region::Lines {
                first: self.text.line_of(start),
                last: self.text.line_of(end),
            },
            ModeKind::VisualBlock => {
                let anchor = self.text.column_of(selection.anchor);
                let caret = self.text.column_of(selection.caret);
                Region::Block {
                    first: self.text.line_of(start),
                    last: self.text.line_of(end),
                    start_column: anchor.min(caret),
                    end_column: anchor.max(caret) + 1,
                }
            }
            _ => Region::Characters(Span::new(start, (end + 1).min(self.text.len()))),
        }
    }

    fn motion_in_selection(
        &mut self,
        caret: usize,
        motion: &Motion,
        data: CommandData,
    ) -> Result<usize, ExecutionError> {
        let motion = MotionData::new(
            motion.clone(),
            MotionArgument::new(MotionContext::BeforeOperator, data.count, None),
        );
        let result = self.compute_motion(caret, &motion)?;
        Ok(self.text.clamp_caret(result.caret))
    }

    pub fn run_visual(
        &mut self,
        mode: ModeKind,
        selection: Selection,
        command: &VisualCommand,
        data: CommandData,
    ) -> Result<Execution, ExecutionError> {
        debug!(command = ?command, mode = ?mode, selection = ?selection, "run visual command");
        let region = self.selection_region(mode, selection);
        let start = selection.start().min(self.text.len());

        match command {
            VisualCommand::Move(Motion::TextObject(object)) => {
                let motion = MotionData::new(
                    Motion::TextObject(*object),
                    MotionArgument::new(MotionContext::BeforeOperator, data.count, None),
                );
                let result = self.compute_motion(selection.caret, &motion)?;
                if result.is_line_wise() {
                    let end = result.span.end().saturating_sub(1).max(result.span.start());
                    let last = self.text.line_of(end);
                    let selection = Selection::new(result.span.start(), self.text.line_start(last));
                    if mode == ModeKind::VisualLine {
                        return Ok(Execution::stay(selection.caret).with_selection(selection));
                    }
                    return Ok(Execution::switch_with(
                        selection.caret,
                        ModeKind::VisualLine,
                        ModeArgument::InitialSelection {
                            anchor: selection.anchor,
                            caret: selection.caret,
                        },
                    ));
                }
                let selection = Selection::new(
                    result.span.start(),
                    result.span.end().saturating_sub(1).max(result.span.start()),
                );
                Ok(Execution::stay(selection.caret).with_selection(selection))
            }
            VisualCommand::Move(motion) => {
                let caret = self.motion_in_selection(selection.caret, motion, data)?;
                Ok(Execution::stay(caret).with_selection(Selection::new(selection.anchor, caret)))
            }
            VisualCommand::Operator(operator) => {
                let mut execution = self.apply_operator(
                    start,
                    *operator,
                    region,
                    data.without_count(),
                    false,
                    data.count_or_default(),
                )?;
                if execution.switch == ModeSwitch::NoSwitch {
                    execution.switch = ModeSwitch::SwitchMode(ModeKind::Normal);
                }
                Ok(execution)
            }
            VisualCommand::JoinLines { insert_space } => {
                let (first, last) = self.selection_lines(region);
                let last = if first == last { last + 1 } else { last };
                if last > self.text.last_line() {
                    return Err(ExecutionError::Failed("cannot join the last line".into()));
                }
                let caret = self.join_lines(first, last, *insert_space)?;
                Ok(Execution::switch(caret, ModeKind::Normal))
            }
            VisualCommand::ReplaceSelection(c) => {
                self.replace_region_chars(region, *c)?;
                let caret = match region {
                    Region::Lines { first, .. } => self.text.line_start(first),
                    Region::Block {
                        first,
                        start_column,
                        ..
                    } => self.text.position(first, start_column),
                    Region::Characters(span) => span.start(),
                };
                Ok(Execution::switch(self.text.clamp_caret(caret), ModeKind::Normal))
            }
            VisualCommand::Put { before } => self.put_over_selection(region, *before, data),
            VisualCommand::SwapAnchor => {
                let swapped = Selection::new(selection.caret, selection.anchor);
                Ok(Execution::stay(swapped.caret).with_selection(swapped))
            }
            VisualCommand::SwitchKind(kind) if *kind == mode => Ok(Execution::switch(
                self.text.clamp_caret(selection.caret),
                ModeKind::Normal,
            )),
            VisualCommand::SwitchKind(kind) => Ok(Execution::switch_with(
                selection.caret,
                *kind,
                ModeArgument::InitialSelection {
                    anchor: selection.anchor,
                    caret: selection.caret,
                },
            )),
            VisualCommand::SwitchToSelect => Ok(Execution::switch_with(
                selection.caret,
                ModeKind::Select,
                ModeArgument::InitialSelection {
                    anchor: selection.anchor,
                    caret: selection.caret,
                },
            )),
            VisualCommand::Exit => Ok(Execution::switch(
                self.text.clamp_caret(selection.caret),
                ModeKind::Normal,
            )),
            VisualCommand::EnterCommandLine => {
                let (first, last) = self.selection_lines(region);
                Ok(Execution::switch_with(
                    self.text.clamp_caret(selection.caret),
                    ModeKind::CommandLine,
                    ModeArgument::CommandLine(format!("{},{}", first + 1, last + 1)),
                ))
            }
            VisualCommand::BlockInsert { append } => self.block_insert(region, *append),
        }
    }

    fn selection_lines(&self, region: Region) -> (usize, usize) {
        match region {
            Region::Characters(span) => (
                self.text.line_of(span.start()),
                self.text.line_of(span.end().saturating_sub(1).max(span.start())),
            ),
            Region::Lines { first, last } | Region::Block { first, last, .. } => (first, last),
        }
    }

    /// `r{c}` on a selection: every character but line breaks becomes `c`.
    fn replace_region_chars(&mut self, region: Region, c: char) -> Result<(), ExecutionError> {
        let spans: Vec<Span> = match region {
            Region::Characters(span) => vec![span],
            Region::Lines { first, last } => vec![Span::new(
                self.text.line_start(first),
                self.text.line_end(last),
            )],
            Region::Block {
                first,
                last,
                start_column,
                end_column,
            } => (first..=last)
                .filter(|&line| self.text.line_len(line) > start_column)
                .map(|line| {
                    let start = self.text.line_start(line);
                    Span::new(start + start_column, start + end_column.min(self.text.line_len(line)))
                })
                .collect(),
        };
        for span in spans.into_iter().rev() {
            let replaced: String = self
                .text
                .slice(span)
                .chars()
                .map(|ch| if ch == '\n' { ch } else { c })
                .collect();
            self.replace(span, &replaced)?;
        }
        Ok(())
    }

    /// `p` and `P` over a selection: the register text replaces it. `p`
    /// stores the replaced text like a delete; `P` leaves registers alone.
    fn put_over_selection(
        &mut self,
        region: Region,
        before: bool,
        data: CommandData,
    ) -> Result<Execution, ExecutionError> {
        let value = self.put_value(data)?;
        let count = data.count_or_default();
        if !before {
            let replaced = self.region_value(region);
            self.registers
                .update(None, RegisterOperation::Delete, replaced, false);
        }

        let lines_at_end = match region {
            Region::Lines { last, .. } => last >= self.text.last_line(),
            _ => false,
        };
        let caret = self.delete_region(region)?;

        let caret = match (region, value.kind()) {
            (Region::Lines { first, .. }, OperationKind::LineWise) => {
                if lines_at_end && first > 0 {
                    let line = self.text.last_line();
                    self.put_value_at(self.text.line_start(line), &value, false, false, count)?
                } else {
                    let line = first.min(self.text.last_line());
                    self.put_value_at(self.text.line_start(line), &value, true, false, count)?
                }
            }
            (Region::Lines { first, .. }, _) => {
                let text = value.text().repeat(count);
                if lines_at_end && first > 0 {
                    let at = self.text.len();
                    self.insert_text(at, &format!("\n{text}"))?;
                    at + 1
                } else {
                    let at = self.text.line_start(first.min(self.text.last_line()));
                    self.insert_text(at, &format!("{text}\n"))?;
                    at
                }
            }
            (_, OperationKind::LineWise) => {
                let text = value.text().repeat(count);
                self.insert_text(caret, &format!("\n{text}"))?;
                caret + 1
            }
            _ => self.put_value_at(caret, &value, true, false, count)?,
        };
        Ok(Execution::switch(self.text.clamp_caret(caret), ModeKind::Normal))
    }

    fn block_insert(&mut self, region: Region, append: bool) -> Result<Execution, ExecutionError> {
        match region {
            Region::Block {
                first,
                last,
                start_column,
                end_column,
            } => {
                let column = if append { end_column } else { start_column };
                let length = self.text.line_len(first);
                if append && length < column {
                    let end = self.text.line_end(first);
                    self.insert_text(end, &" ".repeat(column - length))?;
                }
                Ok(Execution::switch_with(
                    self.text.position(first, column),
                    ModeKind::Insert,
                    ModeArgument::InsertBlock {
                        column,
                        first_line: first,
                        last_line: last,
                        pad: append,
                    },
                ))
            }
            Region::Lines { first, last } => {
                let caret = if append {
                    self.text.line_end(last)
                } else {
                    self.text.first_non_blank(first)
                };
                Ok(Execution::switch(caret, ModeKind::Insert))
            }
            Region::Characters(span) => {
                let caret = if append { span.end() } else { span.start() };
                Ok(Execution::switch(caret, ModeKind::Insert))
            }
        }
    }

    pub fn run_select(
        &mut self,
        selection: Selection,
        command: &SelectCommand,
        data: CommandData,
    ) -> Result<Execution, ExecutionError> {
        debug!(command = ?command, selection = ?selection, "run select command");
        let region = self.selection_region(ModeKind::Select, selection);
        match command {
            // The typed character itself goes through the Insert session.
            SelectCommand::ReplaceSelection(_) | SelectCommand::DeleteSelection => {
                let caret = self.delete_region(region)?;
                Ok(Execution::switch(caret, ModeKind::Insert))
            }
            SelectCommand::Extend(motion) => {
                let caret = self.motion_in_selection(selection.caret, motion, data)?;
                Ok(Execution::stay(caret).with_selection(Selection::new(selection.anchor, caret)))
            }
            SelectCommand::SwitchToVisual => Ok(Execution::switch_with(
                selection.caret,
                ModeKind::VisualCharacter,
                ModeArgument::InitialSelection {
                    anchor: selection.anchor,
                    caret: selection.caret,
                },
            )),
            SelectCommand::Exit => Ok(Execution::switch(
                self.text.clamp_caret(selection.caret),
                ModeKind::Normal,
            )),
        }
    }
}
