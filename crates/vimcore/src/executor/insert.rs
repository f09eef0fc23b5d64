//! Insert and Replace mode editing.

use super::{CommandExecutor, Execution};
use crate::command::{InsertCommand, ModeArgument};
use crate::error::ExecutionError;
use crate::mode::ModeKind;
use crate::motion::{Motion, MotionArgument, MotionContext, MotionData};
use crate::register::RegisterName;
use crate::text::{is_blank, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertKind {
    #[default]
    Insert,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockInsert {
    column: usize,
    first_line: usize,
    last_line: usize,
    pad: bool,
}

/// State of one Insert or Replace session, from entering the mode to `<Esc>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertSession {
    kind: InsertKind,
    count: usize,
    new_line: bool,
    block: Option<BlockInsert>,
    /// Text typed so far, net of backspaces.
    inserted: String,
    /// One entry per character typed in Replace mode: the character it
    /// overwrote, or `None` where it was appended.
    overwritten: Vec<Option<char>>,
}

impl InsertSession {
    pub fn new(kind: InsertKind, argument: Option<&ModeArgument>) -> Self {
        let mut session = Self {
            kind,
            count: 1,
            ..Self::default()
        };
        match argument {
            Some(ModeArgument::InsertWithCount { count, new_line }) => {
                session.count = (*count).max(1);
                session.new_line = *new_line;
            }
            Some(ModeArgument::InsertBlock {
                column,
                first_line,
                last_line,
                pad,
            }) => {
                session.block = Some(BlockInsert {
                    column: *column,
                    first_line: *first_line,
                    last_line: *last_line,
                    pad: *pad,
                });
            }
            _ => {}
        }
        session
    }

    pub fn kind(&self) -> InsertKind {
        self.kind
    }

    pub fn mode(&self) -> ModeKind {
        match self.kind {
            InsertKind::Insert => ModeKind::Insert,
            InsertKind::Replace => ModeKind::Replace,
        }
    }

    /// Text typed so far.
    pub fn inserted(&self) -> &str {
        &self.inserted
    }

    /// Caret movement starts over: what was typed before is no longer
    /// repeated or copied to a block.
    fn restart(&mut self) {
        self.inserted.clear();
        self.overwritten.clear();
        self.count = 1;
        self.block = None;
    }

    fn drop_last(&mut self, chars: usize) {
        for _ in 0..chars {
            self.inserted.pop();
        }
    }
}

impl CommandExecutor<'_> {
    pub fn run_insert(
        &mut self,
        caret: usize,
        command: &InsertCommand,
        session: &mut InsertSession,
    ) -> Result<Execution, ExecutionError> {
        let caret = caret.min(self.text.len());
        let line = self.text.line_of(caret);
        let caret = match command {
            InsertCommand::InsertChar(c) => self.type_char(caret, *c, session)?,
            InsertCommand::InsertNewLine => {
                self.insert_text(caret, "\n")?;
                session.inserted.push('\n');
                if session.kind == InsertKind::Replace {
                    session.overwritten.push(None);
                }
                caret + 1
            }
            InsertCommand::Backspace => self.backspace(caret, session)?,
            InsertCommand::DeleteRight => {
                if caret < self.text.len() {
                    self.replace(Span::new(caret, caret + 1), "")?;
                }
                caret
            }
            InsertCommand::InsertTab => {
                let text = if self.settings.expand_tab {
                    let stop = self.settings.tab_stop.max(1);
                    " ".repeat(stop - self.text.column_of(caret) % stop)
                } else {
                    "\t".to_string()
                };
                self.insert_text(caret, &text)?;
                session.inserted.push_str(&text);
                caret + text.chars().count()
            }
            InsertCommand::DeleteWordBeforeCaret => {
                let start = self.word_start_before(caret);
                self.delete_before(Span::new(start, caret), session)?
            }
            InsertCommand::DeleteLineBeforeCaret => {
                let first_non_blank = self.text.first_non_blank(line);
                let start = if caret > first_non_blank {
                    first_non_blank
                } else if caret > self.text.line_start(line) {
                    self.text.line_start(line)
                } else {
                    caret.saturating_sub(1)
                };
                self.delete_before(Span::new(start, caret), session)?
            }
            InsertCommand::PasteRegister(name) => {
                let text = self.registers.get_register(*name).value.text();
                self.insert_text(caret, &text)?;
                session.inserted.push_str(&text);
                caret + text.chars().count()
            }
            InsertCommand::MoveCaret(motion) => {
                session.restart();
                self.insert_caret_motion(caret, motion)?
            }
            InsertCommand::Exit => return self.finish_insert(caret, session),
        };
        Ok(Execution::stay(caret))
    }

    fn type_char(&mut self, caret: usize, c: char, session: &mut InsertSession) -> Result<usize, ExecutionError> {
        if c == '\n' {
            return self.run_insert(caret, &InsertCommand::InsertNewLine, session).map(|e| e.caret);
        }
        let mut buffer = [0u8; 4];
        let text = c.encode_utf8(&mut buffer);
        let line_end = self.text.line_end(self.text.line_of(caret));
        if session.kind == InsertKind::Replace && caret < line_end {
            session.overwritten.push(self.text.char_at(caret));
            self.replace(Span::new(caret, caret + 1), text)?;
        } else {
            if session.kind == InsertKind::Replace {
                session.overwritten.push(None);
            }
            self.insert_text(caret, text)?;
        }
        session.inserted.push(c);
        Ok(caret + 1)
    }

    fn backspace(&mut self, caret: usize, session: &mut InsertSession) -> Result<usize, ExecutionError> {
        if caret == 0 {
            return Ok(caret);
        }
        let span = Span::new(caret - 1, caret);
        match session.kind {
            InsertKind::Insert => self.replace(span, "")?,
            InsertKind::Replace => match session.overwritten.pop() {
                Some(Some(original)) => self.replace(span, &original.to_string())?,
                Some(None) => self.replace(span, "")?,
                // Nothing typed here: only move left.
                None => return Ok(caret - 1),
            },
        }
        session.drop_last(1);
        Ok(caret - 1)
    }

    fn delete_before(&mut self, span: Span, session: &mut InsertSession) -> Result<usize, ExecutionError> {
        self.replace(span, "")?;
        session.drop_last(span.len());
        let kept = session.overwritten.len().saturating_sub(span.len());
        session.overwritten.truncate(kept);
        Ok(span.start())
    }

    /// Start of the word `<C-w>` removes: blanks, then one run of the same
    /// character class, never past the line start unless already there.
    fn word_start_before(&self, caret: usize) -> usize {
        let line_start = self.text.line_start(self.text.line_of(caret));
        if caret == line_start {
            return caret.saturating_sub(1);
        }
        let mut position = caret;
        while position > line_start && self.text.char_at(position - 1).is_some_and(is_blank) {
            position -= 1;
        }
        if position > line_start {
            let class = self.text.class_at(position - 1, crate::text::WordKind::NormalWord);
            while position > line_start
                && self.text.class_at(position - 1, crate::text::WordKind::NormalWord) == class
            {
                position -= 1;
            }
        }
        position
    }

    /// Arrow keys in Insert mode may put the caret just past the last
    /// character of a line.
    fn insert_caret_motion(&mut self, caret: usize, motion: &Motion) -> Result<usize, ExecutionError> {
        let line = self.text.line_of(caret);
        let column = self.text.column_of(caret);
        let position = match motion {
            Motion::CharLeft if column > 0 => caret - 1,
            Motion::CharRight if caret < self.text.line_end(line) => caret + 1,
            Motion::CharLeft | Motion::CharRight => caret,
            Motion::LineUp if line > 0 => self.text.position(line - 1, column),
            Motion::LineDown if line < self.text.last_line() => self.text.position(line + 1, column),
            Motion::LineUp | Motion::LineDown => caret,
            Motion::BeginningOfLine => self.text.line_start(line),
            Motion::EndOfLine => self.text.line_end(line),
            other => {
                let data = MotionData::new(
                    other.clone(),
                    MotionArgument::new(MotionContext::BeforeOperator, None, None),
                );
                self.compute_motion(caret, &data)?.caret
            }
        };
        Ok(position)
    }

    /// `<Esc>`: repeats the typed text for a count, copies it down a block,
    /// records it in `".` and steps the caret back onto the text.
    pub fn finish_insert(
        &mut self,
        caret: usize,
        session: &mut InsertSession,
    ) -> Result<Execution, ExecutionError> {
        let text = session.inserted.clone();
        let mut caret = caret.min(self.text.len());

        if session.count > 1 && !text.is_empty() {
            let repeat = if session.new_line {
                format!("\n{text}")
            } else {
                text.clone()
            };
            for _ in 1..session.count {
                match session.kind {
                    InsertKind::Insert => {
                        self.insert_text(caret, &repeat)?;
                        caret += repeat.chars().count();
                    }
                    InsertKind::Replace => {
                        for c in repeat.chars() {
                            caret = self.type_char(caret, c, session)?;
                        }
                    }
                }
            }
        }

        self.registers
            .set_read_only_register(RegisterName::LastInserted, &text);

        if let Some(block) = session.block {
            if !text.is_empty() && !text.contains('\n') {
                self.replicate_block(block, &text)?;
                let caret = self.text.position(block.first_line, block.column);
                return Ok(Execution::switch(self.text.clamp_caret(caret), ModeKind::Normal));
            }
        }

        let caret = if self.text.column_of(caret) > 0 {
            caret - 1
        } else {
            caret
        };
        Ok(Execution::switch(self.text.clamp_caret(caret), ModeKind::Normal))
    }

    fn replicate_block(&mut self, block: BlockInsert, text: &str) -> Result<(), ExecutionError> {
        let last = block.last_line.min(self.text.last_line());
        for line in (block.first_line + 1..=last).rev() {
            let length = self.text.line_len(line);
            if length < block.column {
                if !block.pad {
                    continue;
                }
                let padded = format!("{}{text}", " ".repeat(block.column - length));
                self.insert_text(self.text.line_end(line), &padded)?;
            } else {
                self.insert_text(self.text.line_start(line) + block.column, text)?;
            }
        }
        Ok(())
    }
}
