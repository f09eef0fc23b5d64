//! The small set of ex commands reachable from `:`.

use tracing::debug;

use super::operator::Region;
use super::{CommandExecutor, Execution};
use crate::error::ExecutionError;
use crate::register::{OperationKind, Register, RegisterName, RegisterOperation, RegisterValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineBase {
    /// 1-based; `0` is only meaningful for `:0put`.
    Number(usize),
    Current,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Address {
    base: LineBase,
    offset: isize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRange {
    Single(Address),
    Pair(Address, Address),
    Entire,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExCommand {
    /// A bare range: `:12`, `:$`.
    GoToLine,
    Delete {
        register: Option<RegisterName>,
        count: Option<usize>,
    },
    Yank {
        register: Option<RegisterName>,
        count: Option<usize>,
    },
    Put {
        register: Option<RegisterName>,
        above: bool,
    },
    Registers,
    NoHighlight,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedCommandLine {
    range: Option<LineRange>,
    command: ExCommand,
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    fn skip_blanks(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn number(&mut self) -> Option<usize> {
        let digits = self.rest.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let (number, rest) = self.rest.split_at(digits);
        self.rest = rest;
        number.parse().ok()
    }

    fn address(&mut self) -> Option<Address> {
        let base = match self.peek() {
            Some('.') => {
                self.bump();
                Some(LineBase::Current)
            }
            Some('$') => {
                self.bump();
                Some(LineBase::Last)
            }
            Some(c) if c.is_ascii_digit() => self.number().map(LineBase::Number),
            _ => None,
        };

        let mut offset = 0isize;
        let mut has_offset = false;
        while let Some(sign @ ('+' | '-')) = self.peek() {
            self.bump();
            let amount = self.number().unwrap_or(1) as isize;
            offset += if sign == '+' { amount } else { -amount };
            has_offset = true;
        }

        match (base, has_offset) {
            (Some(base), _) => Some(Address { base, offset }),
            (None, true) => Some(Address {
                base: LineBase::Current,
                offset,
            }),
            (None, false) => None,
        }
    }
}

/// Whether `name` is an abbreviation of `full` at least `min` characters long.
fn abbreviates(name: &str, full: &str, min: usize) -> bool {
    name.len() >= min && full.starts_with(name)
}

/// Parses `[x] [count]`.
fn register_and_count(args: &str) -> Result<(Option<RegisterName>, Option<usize>), ExecutionError> {
    let mut cursor = Cursor { rest: args.trim() };
    let register = match cursor.peek() {
        Some(c) if !c.is_ascii_digit() => {
            cursor.bump();
            Some(RegisterName::from_char(c).ok_or_else(|| {
                ExecutionError::InvalidExCommand(format!("invalid register: {c}"))
            })?)
        }
        _ => None,
    };
    cursor.skip_blanks();
    let count = cursor.number();
    cursor.skip_blanks();
    if !cursor.rest.is_empty() {
        return Err(ExecutionError::InvalidExCommand(format!(
            "trailing characters: {}",
            cursor.rest
        )));
    }
    Ok((register, count))
}

fn parse_command_line(line: &str) -> Result<ParsedCommandLine, ExecutionError> {
    let mut cursor = Cursor {
        rest: line.trim_start_matches([':', ' ', '\t']),
    };

    let range = if cursor.peek() == Some('%') {
        cursor.bump();
        Some(LineRange::Entire)
    } else {
        match cursor.address() {
            Some(first) if cursor.peek() == Some(',') => {
                cursor.bump();
                let second = cursor
                    .address()
                    .ok_or(ExecutionError::InvalidRange)?;
                Some(LineRange::Pair(first, second))
            }
            Some(first) => Some(LineRange::Single(first)),
            None => None,
        }
    };

    cursor.skip_blanks();
    let name_len = cursor
        .rest
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .count();
    let (name, rest) = cursor.rest.split_at(name_len);
    let (bang, args) = match rest.strip_prefix('!') {
        Some(args) => (true, args),
        None => (false, rest),
    };

    let command = if name.is_empty() {
        if !args.trim().is_empty() {
            return Err(ExecutionError::InvalidExCommand(line.to_string()));
        }
        if range.is_some() {
            ExCommand::GoToLine
        } else {
            ExCommand::Nothing
        }
    } else if abbreviates(name, "delete", 1) {
        let (register, count) = register_and_count(args)?;
        ExCommand::Delete { register, count }
    } else if abbreviates(name, "yank", 1) {
        let (register, count) = register_and_count(args)?;
        ExCommand::Yank { register, count }
    } else if abbreviates(name, "put", 2) {
        let (register, _) = register_and_count(args)?;
        ExCommand::Put {
            register,
            above: bang,
        }
    } else if abbreviates(name, "registers", 3) || abbreviates(name, "display", 2) {
        ExCommand::Registers
    } else if abbreviates(name, "nohlsearch", 3) {
        ExCommand::NoHighlight
    } else {
        return Err(ExecutionError::InvalidExCommand(name.to_string()));
    };

    Ok(ParsedCommandLine { range, command })
}

/// Renders register contents the way `:reg` lists them.
pub(crate) fn register_listing(registers: &[Register]) -> String {
    let mut listing = String::from("Type Name Content");
    for register in registers {
        let kind = match register.value.kind() {
            OperationKind::CharacterWise => 'c',
            OperationKind::LineWise => 'l',
            OperationKind::BlockWise => 'b',
        };
        let content: String = register
            .value
            .text()
            .chars()
            .flat_map(|c| match c {
                '\n' => vec!['^', 'J'],
                '\t' => vec!['^', 'I'],
                c => vec![c],
            })
            .collect();
        listing.push_str(&format!("\n  {kind}  \"{}   {content}", register.name));
    }
    listing
}

impl CommandExecutor<'_> {
    fn resolve_address(&self, caret: usize, address: Address) -> Result<usize, ExecutionError> {
        let base = match address.base {
            LineBase::Number(n) => n.saturating_sub(1) as isize,
            LineBase::Current => self.text.line_of(caret) as isize,
            LineBase::Last => self.text.last_line() as isize,
        };
        let resolved = base + address.offset;
        if resolved < 0 || resolved as usize > self.text.last_line() {
            return Err(ExecutionError::InvalidRange);
        }
        Ok(resolved as usize)
    }

    fn resolve_range(
        &self,
        caret: usize,
        range: Option<LineRange>,
    ) -> Result<(usize, usize), ExecutionError> {
        match range {
            None => {
                let current = self.text.line_of(caret);
                Ok((current, current))
            }
            Some(LineRange::Entire) => Ok((0, self.text.last_line())),
            Some(LineRange::Single(address)) => {
                let resolved = self.resolve_address(caret, address)?;
                Ok((resolved, resolved))
            }
            Some(LineRange::Pair(first, second)) => {
                let first = self.resolve_address(caret, first)?;
                let second = self.resolve_address(caret, second)?;
                if first > second {
                    return Err(ExecutionError::InvalidRange);
                }
                Ok((first, second))
            }
        }
    }

    /// Runs one command line. The mode switch back out of the command line
    /// is left to the caller.
    pub fn run_ex(&mut self, caret: usize, line: &str) -> Result<Execution, ExecutionError> {
        let parsed = parse_command_line(line)?;
        debug!(command = ?parsed.command, range = ?parsed.range, "run ex command");
        let caret = caret.min(self.text.len());
        let (first, last) = self.resolve_range(caret, parsed.range)?;

        // `count` counts lines from the end of the range.
        let counted = |count: Option<usize>| match count {
            Some(count) => (last, (last + count.max(1) - 1).min(self.text.last_line())),
            None => (first, last),
        };

        match parsed.command {
            ExCommand::Nothing => Ok(Execution::stay(caret)),
            ExCommand::GoToLine => Ok(Execution::stay(
                self.text.clamp_caret(self.text.first_non_blank(last)),
            )),
            ExCommand::Delete { register, count } => {
                let (first, last) = counted(count);
                if let Some(name) = register.filter(RegisterName::is_read_only) {
                    return Err(ExecutionError::ReadOnlyRegister(name));
                }
                let region = Region::Lines { first, last };
                let value = self.region_value(region);
                self.registers
                    .update(register, RegisterOperation::Delete, value, false);
                let caret = self.delete_region(region)?;
                Ok(Execution::stay(self.text.clamp_caret(caret)))
            }
            ExCommand::Yank { register, count } => {
                let (first, last) = counted(count);
                if let Some(name) = register.filter(RegisterName::is_read_only) {
                    return Err(ExecutionError::ReadOnlyRegister(name));
                }
                let value = self.region_value(Region::Lines { first, last });
                self.registers
                    .update(register, RegisterOperation::Yank, value, false);
                Ok(Execution::stay(caret))
            }
            ExCommand::Put { register, above } => {
                let name = register.unwrap_or(RegisterName::Unnamed);
                let value = self.registers.get_register(name).value;
                if value.is_empty() {
                    return Err(ExecutionError::RegisterEmpty(name));
                }
                let value = RegisterValue::line_wise(value.text());
                // `:0put` goes above the first line.
                let zero = matches!(
                    parsed.range,
                    Some(LineRange::Single(Address {
                        base: LineBase::Number(0),
                        offset: 0
                    }))
                );
                let position = self.text.line_start(last);
                let caret = self.put_value_at(position, &value, above || zero, false, 1)?;
                Ok(Execution::stay(self.text.clamp_caret(caret)))
            }
            ExCommand::Registers => {
                let listing = register_listing(&self.registers.registers());
                self.status.report_message(&listing);
                Ok(Execution::stay(caret))
            }
            ExCommand::NoHighlight => {
                self.motion_state.search_highlight = false;
                Ok(Execution::stay(caret))
            }
        }
    }
}
