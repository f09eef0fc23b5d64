//! Command execution.
//!
//! The [`CommandExecutor`] turns one resolved command into edits against the
//! text surface and register writes. Every position is computed against a
//! [`TextSnapshot`] taken before the first mutation, and the snapshot is
//! refreshed after each edit, so validation never sees a half-applied change.

mod ex;
mod insert;
mod operator;
mod put;
mod visual;

pub use insert::{InsertKind, InsertSession};

use tracing::debug;

use crate::command::{CommandData, CommandResult, ModeArgument, ModeSwitch, NormalCommand, Operator};
use crate::config::EditorConfig;
use crate::error::{ExecutionError, MotionError};
use crate::host::{SearchService, StatusSink, TextSurface};
use crate::mode::ModeKind;
use crate::motion::{Motion, MotionArgument, MotionContext, MotionData, MotionEngine, MotionResult, MotionState};
use crate::register::{RegisterMap, RegisterName};
use crate::text::{Span, TextSnapshot};

use operator::Region;

/// Everything a command may touch.
pub struct ExecutionContext<'a> {
    pub surface: &'a mut dyn TextSurface,
    pub registers: &'a mut RegisterMap,
    pub motion_state: &'a mut MotionState,
    pub search: &'a dyn SearchService,
    pub status: &'a mut dyn StatusSink,
    pub settings: &'a EditorConfig,
}

/// The two ends of a Visual or Select selection. Both are caret positions;
/// the selection covers the characters between them inclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selection {
    pub anchor: usize,
    pub caret: usize,
}

impl Selection {
    pub fn new(anchor: usize, caret: usize) -> Self {
        Self { anchor, caret }
    }

    pub fn at(position: usize) -> Self {
        Self::new(position, position)
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.caret)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.caret)
    }
}

/// What a command left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub switch: ModeSwitch,
    pub caret: usize,
    /// New selection, for commands that keep a Visual mode active.
    pub selection: Option<Selection>,
}

impl Execution {
    pub fn stay(caret: usize) -> Self {
        Self {
            switch: ModeSwitch::NoSwitch,
            caret,
            selection: None,
        }
    }

    pub fn switch(caret: usize, mode: ModeKind) -> Self {
        Self {
            switch: ModeSwitch::SwitchMode(mode),
            caret,
            selection: None,
        }
    }

    pub fn switch_with(caret: usize, mode: ModeKind, argument: ModeArgument) -> Self {
        Self {
            switch: ModeSwitch::SwitchModeWithArgument(mode, argument),
            caret,
            selection: None,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }
}

pub struct CommandExecutor<'a> {
    surface: &'a mut dyn TextSurface,
    registers: &'a mut RegisterMap,
    motion_state: &'a mut MotionState,
    search: &'a dyn SearchService,
    status: &'a mut dyn StatusSink,
    settings: &'a EditorConfig,
    text: TextSnapshot,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(context: ExecutionContext<'a>) -> Result<Self, ExecutionError> {
        let text = TextSnapshot::capture(&*context.surface)?
            .with_word_chars(&context.settings.iskeyword);
        Ok(Self {
            surface: context.surface,
            registers: context.registers,
            motion_state: context.motion_state,
            search: context.search,
            status: context.status,
            settings: context.settings,
            text,
        })
    }

    /// The snapshot as of the last edit.
    pub fn text(&self) -> &TextSnapshot {
        &self.text
    }

    fn refresh(&mut self) -> Result<(), ExecutionError> {
        self.text = TextSnapshot::capture(&*self.surface)?.with_word_chars(&self.settings.iskeyword);
        Ok(())
    }

    pub(crate) fn replace(&mut self, span: Span, text: &str) -> Result<(), ExecutionError> {
        if span.is_empty() && text.is_empty() {
            return Ok(());
        }
        self.surface.replace(span, text)?;
        self.refresh()
    }

    pub(crate) fn insert_text(&mut self, position: usize, text: &str) -> Result<(), ExecutionError> {
        self.replace(Span::empty_at(position), text)
    }

    pub(crate) fn compute_motion(
        &mut self,
        start: usize,
        data: &MotionData,
    ) -> Result<MotionResult, MotionError> {
        MotionEngine::new(
            &self.text,
            self.search,
            self.settings.search_options(),
            self.motion_state,
        )
        .compute(start, data)
    }

    /// Rejects explicit writes to `.`, `:`, `%` and `/` before anything changes.
    fn check_writable(&self, data: CommandData) -> Result<(), ExecutionError> {
        match data.register_name {
            Some(name) if name.is_read_only() => Err(ExecutionError::ReadOnlyRegister(name)),
            _ => Ok(()),
        }
    }

    fn operator_motion(motion: Motion, count: Option<usize>) -> MotionData {
        MotionData::new(
            motion,
            MotionArgument::new(MotionContext::AfterOperator, count, None),
        )
    }

    /// Runs a Normal mode command. `caret` must be a valid caret position.
    pub fn run_normal(
        &mut self,
        caret: usize,
        command: &NormalCommand,
        data: CommandData,
    ) -> Result<Execution, ExecutionError> {
        debug!(command = ?command, count = ?data.count, register = ?data.register_name, "run normal command");
        let caret = caret.min(self.text.len());
        let count = data.count_or_default();
        let line = self.text.line_of(caret);

        match command {
            NormalCommand::MoveCaret(motion) => {
                let motion = MotionData::new(
                    motion.clone(),
                    MotionArgument::new(MotionContext::BeforeOperator, data.count, None),
                );
                let result = self.compute_motion(caret, &motion)?;
                Ok(Execution::stay(self.text.clamp_caret(result.caret)))
            }
            NormalCommand::Operator(operator, motion) => {
                self.run_operator(caret, *operator, motion, data)
            }
            NormalCommand::DeleteCharAtCaret => {
                if self.text.is_empty_line(line) {
                    return Ok(Execution::stay(caret));
                }
                let motion = Self::operator_motion(Motion::CharRight, Some(count));
                self.run_operator(caret, Operator::Delete, &motion, data.without_count())
            }
            NormalCommand::DeleteCharBeforeCaret => {
                let motion = Self::operator_motion(Motion::CharLeft, Some(count));
                self.run_operator(caret, Operator::Delete, &motion, data.without_count())
            }
            NormalCommand::DeleteToEndOfLine => {
                let motion = Self::operator_motion(Motion::EndOfLine, Some(count));
                self.run_operator(caret, Operator::Delete, &motion, data.without_count())
            }
            NormalCommand::ChangeToEndOfLine => {
                let motion = Self::operator_motion(Motion::EndOfLine, Some(count));
                self.run_operator(caret, Operator::Change, &motion, data.without_count())
            }
            NormalCommand::SubstituteChar => {
                if self.text.is_empty_line(line) {
                    return Ok(Execution::switch(caret, ModeKind::Insert));
                }
                let motion = Self::operator_motion(Motion::CharRight, Some(count));
                self.run_operator(caret, Operator::Change, &motion, data.without_count())
            }
            NormalCommand::SubstituteLine => {
                let motion = Self::operator_motion(Motion::WholeLine, Some(count));
                self.run_operator(caret, Operator::Change, &motion, data.without_count())
            }
            NormalCommand::YankLine => {
                let motion = Self::operator_motion(Motion::WholeLine, Some(count));
                self.run_operator(caret, Operator::Yank, &motion, data.without_count())
            }
            NormalCommand::JoinLines { insert_space } => {
                let last = line + count.max(2) - 1;
                if last > self.text.last_line() {
                    return Err(ExecutionError::Failed("cannot join the last line".into()));
                }
                let caret = self.join_lines(line, last, *insert_space)?;
                Ok(Execution::stay(caret))
            }
            NormalCommand::ReplaceChar(c) => self.replace_chars(caret, *c, count),
            NormalCommand::ToggleCaseAtCaret => {
                let end = self.text.line_end(line);
                if caret >= end {
                    return Ok(Execution::stay(caret));
                }
                let span = Span::new(caret, (caret + count).min(end));
                let toggled = operator::convert_case(&self.text.slice(span), Operator::ToggleCase);
                self.replace(span, &toggled)?;
                Ok(Execution::stay(self.text.clamp_caret(span.end())))
            }
            NormalCommand::Put { before, move_after } => {
                self.put(caret, *before, *move_after, data)
            }
            NormalCommand::InsertBeforeCaret => Ok(self.enter_insert(caret, data, false)),
            NormalCommand::InsertAfterCaret => {
                let position = if self.text.is_empty_line(line) {
                    caret
                } else {
                    (caret + 1).min(self.text.line_end(line))
                };
                Ok(self.enter_insert(position, data, false))
            }
            NormalCommand::InsertAtFirstNonBlank => {
                let position = self.text.first_non_blank(line);
                Ok(self.enter_insert(position, data, false))
            }
            NormalCommand::InsertAtEndOfLine => {
                let position = self.text.line_end(line);
                Ok(self.enter_insert(position, data, false))
            }
            NormalCommand::OpenLineBelow => {
                let end = self.text.line_end(line);
                self.insert_text(end, "\n")?;
                Ok(self.enter_insert(end + 1, data, true))
            }
            NormalCommand::OpenLineAbove => {
                let start = self.text.line_start(line);
                self.insert_text(start, "\n")?;
                Ok(self.enter_insert(start, data, true))
            }
            NormalCommand::ReplaceMode => {
                let execution = self.enter_insert(caret, data, false);
                let switch = match execution.switch {
                    ModeSwitch::SwitchModeWithArgument(_, argument) => {
                        ModeSwitch::SwitchModeWithArgument(ModeKind::Replace, argument)
                    }
                    _ => ModeSwitch::SwitchMode(ModeKind::Replace),
                };
                Ok(Execution { switch, ..execution })
            }
            NormalCommand::StartVisual(kind) => Ok(Execution::switch_with(
                caret,
                *kind,
                ModeArgument::InitialSelection {
                    anchor: caret,
                    caret,
                },
            )),
            NormalCommand::StartSelect => Ok(Execution::switch_with(
                caret,
                ModeKind::Select,
                ModeArgument::InitialSelection {
                    anchor: caret,
                    caret,
                },
            )),
            NormalCommand::EnterCommandLine => {
                let prefill = match data.count {
                    Some(n) if n > 1 => format!(".,.+{}", n - 1),
                    Some(_) => ".".to_string(),
                    None => String::new(),
                };
                Ok(Execution::switch_with(
                    caret,
                    ModeKind::CommandLine,
                    ModeArgument::CommandLine(prefill),
                ))
            }
            NormalCommand::Ping(ping) => match (ping.0)(data) {
                CommandResult::Completed(switch) => Ok(Execution {
                    switch,
                    caret,
                    selection: None,
                }),
                CommandResult::Error(message) => {
                    Err(ExecutionError::Failed(message))
                }
            },
            // Undo, redo, repeat and macros need the buffer's own state.
            NormalCommand::Undo
            | NormalCommand::Redo
            | NormalCommand::RepeatLastChange
            | NormalCommand::RecordMacro(_)
            | NormalCommand::RunMacro(_) => Ok(Execution::stay(caret)),
        }
    }

    fn enter_insert(&self, caret: usize, data: CommandData, new_line: bool) -> Execution {
        match data.count {
            Some(count) if count > 1 => Execution::switch_with(
                caret,
                ModeKind::Insert,
                ModeArgument::InsertWithCount { count, new_line },
            ),
            _ => Execution::switch(caret, ModeKind::Insert),
        }
    }

    /// `r{c}`: replaces `count` characters; a line break replaces them all
    /// with a single break.
    fn replace_chars(&mut self, caret: usize, c: char, count: usize) -> Result<Execution, ExecutionError> {
        let line = self.text.line_of(caret);
        let end = self.text.line_end(line);
        if caret + count > end {
            return Err(ExecutionError::Failed("not enough characters to replace".into()));
        }
        let span = Span::new(caret, caret + count);
        if c == '\n' {
            self.replace(span, "\n")?;
            return Ok(Execution::stay(self.text.line_start(line + 1)));
        }
        let replacement: String = std::iter::repeat_n(c, count).collect();
        self.replace(span, &replacement)?;
        Ok(Execution::stay(caret + count - 1))
    }

    /// Joins `first..=last` into one line. Returns the caret position: the
    /// last join point.
    pub(crate) fn join_lines(
        &mut self,
        first: usize,
        last: usize,
        insert_space: bool,
    ) -> Result<usize, ExecutionError> {
        let last = last.min(self.text.last_line());
        let mut joined: Vec<char> = self.text.line_text(first).chars().collect();
        let mut caret = self.text.line_start(first);

        for line in first + 1..=last {
            let text = self.text.line_text(line);
            let next: &str = if insert_space {
                text.trim_start_matches([' ', '\t'])
            } else {
                &text
            };
            let join_at = joined.len();
            let ends_blank = joined.last().is_some_and(|c| *c == ' ' || *c == '\t');
            if insert_space && !next.is_empty() && !ends_blank && !next.starts_with(')') && join_at > 0 {
                joined.push(' ');
            }
            caret = self.text.line_start(first) + join_at;
            joined.extend(next.chars());
        }

        let span = Span::new(self.text.line_start(first), self.text.line_end(last));
        let joined: String = joined.into_iter().collect();
        self.replace(span, &joined)?;
        Ok(self.text.clamp_caret(caret))
    }

    /// Region covered by a motion result.
    fn region_of(&self, result: &MotionResult) -> Region {
        if result.is_line_wise() {
            let first = self.text.line_of(result.span.start());
            let last = if result.span.is_empty() {
                first
            } else {
                self.text.line_of(result.span.end() - 1)
            };
            Region::Lines { first, last }
        } else {
            Region::Characters(result.span)
        }
    }

    fn register_or_unnamed(data: CommandData) -> RegisterName {
        data.register_name.unwrap_or(RegisterName::Unnamed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{InsertCommand, VisualCommand};
    use crate::host::{MemoryStatus, RegexSearchService, RopeSurface, StatusMessage};
    use crate::motion::TextObject;
    use crate::register::{OperationKind, RegisterValue};
    use crate::text::WordKind;

    struct Fixture {
        surface: RopeSurface,
        registers: RegisterMap,
        motion_state: MotionState,
        status: MemoryStatus,
        settings: EditorConfig,
    }

    impl Fixture {
        fn new(text: &str) -> Self {
            Self {
                surface: RopeSurface::new(text),
                registers: RegisterMap::default(),
                motion_state: MotionState::default(),
                status: MemoryStatus::new(),
                settings: EditorConfig::default(),
            }
        }

        fn run<T>(
            &mut self,
            f: impl FnOnce(&mut CommandExecutor<'_>) -> Result<T, ExecutionError>,
        ) -> Result<T, ExecutionError> {
            let search = RegexSearchService;
            let mut executor = CommandExecutor::new(ExecutionContext {
                surface: &mut self.surface,
                registers: &mut self.registers,
                motion_state: &mut self.motion_state,
                search: &search,
                status: &mut self.status,
                settings: &self.settings,
            })?;
            f(&mut executor)
        }

        fn normal(&mut self, caret: usize, command: NormalCommand, data: CommandData) -> Execution {
            self.run(|e| e.run_normal(caret, &command, data)).unwrap()
        }

        fn operator(&mut self, caret: usize, operator: Operator, motion: Motion, count: Option<usize>) -> Execution {
            let motion = MotionData::new(
                motion,
                MotionArgument::new(MotionContext::AfterOperator, None, None),
            );
            self.normal(
                caret,
                NormalCommand::Operator(operator, motion),
                CommandData::new(count, None),
            )
        }

        fn visual(&mut self, mode: ModeKind, selection: Selection, command: VisualCommand) -> Execution {
            self.run(|e| e.run_visual(mode, selection, &command, CommandData::default()))
                .unwrap()
        }

        fn text(&self) -> String {
            self.surface.text()
        }

        fn register(&mut self, c: char) -> RegisterValue {
            let name = RegisterName::from_char(c).unwrap();
            self.registers.get_register(name).value
        }
    }

    #[test]
    fn test_delete_word_goes_to_small_delete() {
        let mut fx = Fixture::new("alpha beta");
        let execution = fx.operator(0, Operator::Delete, Motion::WordForward(WordKind::NormalWord), None);
        assert_eq!(fx.text(), "beta");
        assert_eq!(execution.caret, 0);
        assert_eq!(fx.register('-').text(), "alpha ");
        assert_eq!(fx.register('"').text(), "alpha ");
        assert!(fx.register('1').is_empty());
    }

    #[test]
    fn test_count_applies_to_operator_motion() {
        let mut fx = Fixture::new("alpha beta gamma delta");
        fx.operator(0, Operator::Delete, Motion::WordForward(WordKind::NormalWord), Some(3));
        assert_eq!(fx.text(), "delta");
        assert_eq!(fx.register('"').text(), "alpha beta gamma ");
    }

    #[test]
    fn test_delete_last_line_takes_preceding_break() {
        let mut fx = Fixture::new("a\nb\nc");
        let execution = fx.operator(4, Operator::Delete, Motion::WholeLine, None);
        assert_eq!(fx.text(), "a\nb");
        assert_eq!(execution.caret, 2);
        let value = fx.register('1');
        assert_eq!(value.text(), "c\n");
        assert_eq!(value.kind(), OperationKind::LineWise);
    }

    #[test]
    fn test_change_line_keeps_empty_line() {
        let mut fx = Fixture::new("  foo\nbar");
        let execution = fx.operator(2, Operator::Change, Motion::WholeLine, None);
        assert_eq!(fx.text(), "\nbar");
        assert_eq!(execution.switch, ModeSwitch::SwitchMode(ModeKind::Insert));
        assert_eq!(execution.caret, 0);
    }

    #[test]
    fn test_change_word_stops_at_word_end() {
        let mut fx = Fixture::new("foo bar");
        let execution = fx.operator(0, Operator::Change, Motion::WordForward(WordKind::NormalWord), None);
        assert_eq!(fx.text(), " bar");
        assert_eq!(execution.switch, ModeSwitch::SwitchMode(ModeKind::Insert));
    }

    #[test]
    fn test_delete_char_commands() {
        let mut fx = Fixture::new("abcdef\n\nx");
        fx.normal(1, NormalCommand::DeleteCharAtCaret, CommandData::new(Some(2), None));
        assert_eq!(fx.text(), "adef\n\nx");
        fx.normal(3, NormalCommand::DeleteCharBeforeCaret, CommandData::default());
        assert_eq!(fx.text(), "adf\n\nx");

        // `x` on an empty line does nothing.
        let execution = fx.normal(4, NormalCommand::DeleteCharAtCaret, CommandData::default());
        assert_eq!(fx.text(), "adf\n\nx");
        assert_eq!(execution.caret, 4);
    }

    #[test]
    fn test_join_lines() {
        let mut fx = Fixture::new("a\n  b\nc");
        let execution = fx.normal(0, NormalCommand::JoinLines { insert_space: true }, CommandData::default());
        assert_eq!(fx.text(), "a b\nc");
        assert_eq!(execution.caret, 1);

        let mut fx = Fixture::new("a\n  b");
        fx.normal(0, NormalCommand::JoinLines { insert_space: false }, CommandData::default());
        assert_eq!(fx.text(), "a  b");

        let mut fx = Fixture::new("last");
        let result = fx.run(|e| e.run_normal(0, &NormalCommand::JoinLines { insert_space: true }, CommandData::default()));
        assert!(matches!(result, Err(ExecutionError::Failed(_))));
    }

    #[test]
    fn test_replace_char() {
        let mut fx = Fixture::new("abc");
        let execution = fx.normal(0, NormalCommand::ReplaceChar('x'), CommandData::new(Some(2), None));
        assert_eq!(fx.text(), "xxc");
        assert_eq!(execution.caret, 1);

        let result = fx.run(|e| e.run_normal(0, &NormalCommand::ReplaceChar('y'), CommandData::new(Some(4), None)));
        assert!(result.is_err());
        assert_eq!(fx.text(), "xxc");
    }

    #[test]
    fn test_put_line_wise_and_character_wise() {
        let mut fx = Fixture::new("one\ntwo");
        fx.registers.set_register(RegisterName::Unnamed, RegisterValue::line_wise("new"));
        let execution = fx.normal(0, NormalCommand::Put { before: false, move_after: false }, CommandData::default());
        assert_eq!(fx.text(), "one\nnew\ntwo");
        assert_eq!(execution.caret, 4);

        let mut fx = Fixture::new("one\ntwo");
        fx.registers.set_register(RegisterName::Unnamed, RegisterValue::line_wise("new"));
        fx.normal(0, NormalCommand::Put { before: true, move_after: false }, CommandData::default());
        assert_eq!(fx.text(), "new\none\ntwo");

        let mut fx = Fixture::new("abc");
        fx.registers.set_register(RegisterName::Unnamed, RegisterValue::character_wise("XY"));
        let execution = fx.normal(0, NormalCommand::Put { before: false, move_after: false }, CommandData::default());
        assert_eq!(fx.text(), "aXYbc");
        assert_eq!(execution.caret, 2);
    }

    #[test]
    fn test_put_empty_register_fails() {
        let mut fx = Fixture::new("abc");
        let result = fx.run(|e| {
            e.run_normal(0, &NormalCommand::Put { before: false, move_after: false }, CommandData::default())
        });
        assert!(matches!(result, Err(ExecutionError::RegisterEmpty(RegisterName::Unnamed))));
    }

    #[test]
    fn test_shift_lines() {
        let mut fx = Fixture::new("foo\nbar");
        fx.settings.shift_width = 4;
        fx.settings.expand_tab = true;
        let execution = fx.operator(0, Operator::ShiftRight, Motion::WholeLine, None);
        assert_eq!(fx.text(), "    foo\nbar");
        assert_eq!(execution.caret, 4);
        fx.operator(4, Operator::ShiftLeft, Motion::WholeLine, None);
        assert_eq!(fx.text(), "foo\nbar");
    }

    #[test]
    fn test_case_operator_on_text_object() {
        let mut fx = Fixture::new("foo bar");
        let object = TextObject::Word {
            kind: WordKind::NormalWord,
            around: false,
        };
        let execution = fx.operator(5, Operator::UpperCase, Motion::TextObject(object), None);
        assert_eq!(fx.text(), "foo BAR");
        assert_eq!(execution.caret, 4);
    }

    #[test]
    fn test_format_reflows_to_text_width() {
        let mut fx = Fixture::new("one two three four");
        fx.settings.text_width = 10;
        fx.operator(0, Operator::Format, Motion::WholeLine, None);
        assert_eq!(fx.text(), "one two\nthree four");
    }

    #[test]
    fn test_yank_into_read_only_register_fails() {
        let mut fx = Fixture::new("abc");
        let motion = MotionData::new(Motion::WholeLine, MotionArgument::default());
        let result = fx.run(|e| {
            e.run_normal(
                0,
                &NormalCommand::Operator(Operator::Yank, motion),
                CommandData::new(None, Some(RegisterName::LastInserted)),
            )
        });
        assert!(matches!(result, Err(ExecutionError::ReadOnlyRegister(_))));
    }

    #[test]
    fn test_insert_entries_carry_count() {
        let mut fx = Fixture::new("abc");
        let execution = fx.normal(1, NormalCommand::InsertAfterCaret, CommandData::new(Some(3), None));
        assert_eq!(execution.caret, 2);
        assert_eq!(
            execution.switch,
            ModeSwitch::SwitchModeWithArgument(
                ModeKind::Insert,
                ModeArgument::InsertWithCount {
                    count: 3,
                    new_line: false
                }
            )
        );

        let execution = fx.normal(0, NormalCommand::OpenLineBelow, CommandData::default());
        assert_eq!(fx.text(), "abc\n");
        assert_eq!(execution.caret, 4);
    }

    #[test]
    fn test_visual_delete_and_yank() {
        let mut fx = Fixture::new("hello world");
        let execution = fx.visual(
            ModeKind::VisualCharacter,
            Selection::new(0, 4),
            VisualCommand::Operator(Operator::Delete),
        );
        assert_eq!(fx.text(), " world");
        assert_eq!(execution.switch, ModeSwitch::SwitchMode(ModeKind::Normal));
        assert_eq!(fx.register('-').text(), "hello");

        let mut fx = Fixture::new("a\nb\nc");
        fx.visual(
            ModeKind::VisualLine,
            Selection::new(0, 2),
            VisualCommand::Operator(Operator::Yank),
        );
        let value = fx.register('0');
        assert_eq!(value.text(), "a\nb\n");
        assert_eq!(value.kind(), OperationKind::LineWise);
    }

    #[test]
    fn test_visual_block_delete() {
        let mut fx = Fixture::new("abcd\nefgh\nij");
        fx.visual(
            ModeKind::VisualBlock,
            Selection::new(1, 7),
            VisualCommand::Operator(Operator::Delete),
        );
        assert_eq!(fx.text(), "ad\neh\nij");
        let value = fx.register('"');
        assert_eq!(value.kind(), OperationKind::BlockWise);
        assert_eq!(value.text(), "bc\nfg");
    }

    #[test]
    fn test_visual_text_object_replaces_selection() {
        let mut fx = Fixture::new("foo bar baz");
        let object = TextObject::Word {
            kind: WordKind::NormalWord,
            around: false,
        };
        let execution = fx.visual(
            ModeKind::VisualCharacter,
            Selection::at(5),
            VisualCommand::Move(Motion::TextObject(object)),
        );
        assert_eq!(execution.selection, Some(Selection::new(4, 6)));
    }

    #[test]
    fn test_block_insert_replicates_on_exit() {
        let mut fx = Fixture::new("abc\ndef\nghi");
        let execution = fx.visual(
            ModeKind::VisualBlock,
            Selection::new(0, 8),
            VisualCommand::BlockInsert { append: false },
        );
        let ModeSwitch::SwitchModeWithArgument(ModeKind::Insert, argument) = execution.switch else {
            panic!("expected block insert, got {:?}", execution.switch);
        };
        let mut session = InsertSession::new(InsertKind::Insert, Some(&argument));
        let caret = fx
            .run(|e| e.run_insert(0, &InsertCommand::InsertChar('X'), &mut session))
            .unwrap()
            .caret;
        let execution = fx
            .run(|e| e.run_insert(caret, &InsertCommand::Exit, &mut session))
            .unwrap();
        assert_eq!(fx.text(), "Xabc\nXdef\nXghi");
        assert_eq!(execution.caret, 0);
    }

    #[test]
    fn test_insert_count_repeats_on_exit() {
        let mut fx = Fixture::new("x");
        let argument = ModeArgument::InsertWithCount {
            count: 3,
            new_line: false,
        };
        let mut session = InsertSession::new(InsertKind::Insert, Some(&argument));
        let mut caret = 0;
        for c in ['a', 'b'] {
            caret = fx
                .run(|e| e.run_insert(caret, &InsertCommand::InsertChar(c), &mut session))
                .unwrap()
                .caret;
        }
        let execution = fx
            .run(|e| e.run_insert(caret, &InsertCommand::Exit, &mut session))
            .unwrap();
        assert_eq!(fx.text(), "abababx");
        assert_eq!(execution.caret, 5);
        assert_eq!(fx.register('.').text(), "ab");
    }

    #[test]
    fn test_replace_mode_backspace_restores() {
        let mut fx = Fixture::new("abc");
        let mut session = InsertSession::new(InsertKind::Replace, None);
        let mut caret = 0;
        for command in [InsertCommand::InsertChar('X'), InsertCommand::InsertChar('Y')] {
            caret = fx.run(|e| e.run_insert(caret, &command, &mut session)).unwrap().caret;
        }
        assert_eq!(fx.text(), "XYc");
        for _ in 0..2 {
            caret = fx
                .run(|e| e.run_insert(caret, &InsertCommand::Backspace, &mut session))
                .unwrap()
                .caret;
        }
        assert_eq!(fx.text(), "abc");
        assert_eq!(caret, 0);
    }

    #[test]
    fn test_ex_commands() {
        let mut fx = Fixture::new("a\nb\nc\nd");
        let execution = fx.run(|e| e.run_ex(0, "2,3d")).unwrap();
        assert_eq!(fx.text(), "a\nd");
        assert_eq!(execution.caret, 2);
        assert_eq!(fx.register('1').text(), "b\nc\n");

        fx.run(|e| e.run_ex(0, "%y a")).unwrap();
        assert_eq!(fx.register('a').text(), "a\nd\n");

        fx.run(|e| e.run_ex(0, "reg")).unwrap();
        assert!(matches!(
            fx.status.messages().last(),
            Some(StatusMessage::Message(listing)) if listing.starts_with("Type Name Content")
        ));

        assert!(matches!(
            fx.run(|e| e.run_ex(0, "frobnicate")),
            Err(ExecutionError::InvalidExCommand(_))
        ));
        assert!(matches!(fx.run(|e| e.run_ex(0, "9")), Err(ExecutionError::InvalidRange)));
    }
}
