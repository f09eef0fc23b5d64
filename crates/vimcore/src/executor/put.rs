//! `p` and friends.

use super::{CommandExecutor, Execution};
use crate::command::CommandData;
use crate::error::ExecutionError;
use crate::register::{OperationKind, RegisterValue, StringData};

impl CommandExecutor<'_> {
    /// Reads the register a put uses, failing when it holds nothing.
    pub(crate) fn put_value(&mut self, data: CommandData) -> Result<RegisterValue, ExecutionError> {
        let name = Self::register_or_unnamed(data);
        let value = self.registers.get_register(name).value;
        if value.is_empty() {
            return Err(ExecutionError::RegisterEmpty(name));
        }
        Ok(value)
    }

    pub(crate) fn put(
        &mut self,
        caret: usize,
        before: bool,
        move_after: bool,
        data: CommandData,
    ) -> Result<Execution, ExecutionError> {
        let value = self.put_value(data)?;
        let caret = self.put_value_at(caret, &value, before, move_after, data.count_or_default())?;
        Ok(Execution::stay(caret))
    }

    /// Inserts `value` `count` times next to `caret` and returns the new caret.
    pub(crate) fn put_value_at(
        &mut self,
        caret: usize,
        value: &RegisterValue,
        before: bool,
        move_after: bool,
        count: usize,
    ) -> Result<usize, ExecutionError> {
        let line = self.text.line_of(caret);
        match (value.data(), value.kind()) {
            (StringData::Block(block), _) => {
                let rows: Vec<String> = block.lines().iter().map(|row| row.repeat(count)).collect();
                let column = if before || self.text.is_empty_line(line) {
                    self.text.column_of(caret)
                } else {
                    self.text.column_of(caret) + 1
                };
                self.put_block(line, column, &rows)?;
                Ok(self.text.position(line, column))
            }
            (_, OperationKind::LineWise) => {
                let text = value.text().repeat(count);
                let added_lines = text.matches('\n').count();
                let first = if before {
                    self.insert_text(self.text.line_start(line), &text)?;
                    line
                } else if line == self.text.last_line() {
                    let body = text.strip_suffix('\n').unwrap_or(&text);
                    self.insert_text(self.text.len(), &format!("\n{body}"))?;
                    line + 1
                } else {
                    self.insert_text(self.text.line_end_including_break(line), &text)?;
                    line + 1
                };
                if move_after {
                    Ok(self.text.line_start(first + added_lines))
                } else {
                    Ok(self.text.first_non_blank(first))
                }
            }
            _ => {
                let text = value.text().repeat(count);
                let position = if before || self.text.is_empty_line(line) {
                    caret
                } else {
                    (caret + 1).min(self.text.line_end(line))
                };
                self.insert_text(position, &text)?;
                let length = text.chars().count();
                if move_after {
                    Ok(position + length)
                } else if text.contains('\n') {
                    Ok(position)
                } else {
                    Ok(position + length.saturating_sub(1))
                }
            }
        }
    }

    /// Inserts one row per line from `line` down at `column`, padding short
    /// lines and adding lines past the end of the buffer.
    fn put_block(&mut self, line: usize, column: usize, rows: &[String]) -> Result<(), ExecutionError> {
        for (offset, row) in rows.iter().enumerate() {
            let target = line + offset;
            if target > self.text.last_line() {
                let text = format!("\n{}{row}", " ".repeat(column));
                self.insert_text(self.text.len(), &text)?;
                continue;
            }
            let length = self.text.line_len(target);
            let end = self.text.line_end(target);
            if length < column {
                let text = format!("{}{row}", " ".repeat(column - length));
                self.insert_text(end, &text)?;
            } else {
                self.insert_text(self.text.line_start(target) + column, row)?;
            }
        }
        Ok(())
    }
}
