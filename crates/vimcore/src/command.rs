//! Resolved commands.
//!
//! Each mode resolves keys into its own command type. The executor runs
//! them and answers with a [`CommandResult`] whose [`ModeSwitch`] is the
//! only way a mode transition happens.

use std::fmt;
use std::rc::Rc;

use crate::binding::CommandFlags;
use crate::key::KeyInputSet;
use crate::mode::ModeKind;
use crate::motion::{Motion, MotionData};
use crate::register::RegisterName;

/// The count and register typed in front of a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CommandData {
    pub count: Option<usize>,
    pub register_name: Option<RegisterName>,
}

impl CommandData {
    pub fn new(count: Option<usize>, register_name: Option<RegisterName>) -> Self {
        Self {
            count,
            register_name,
        }
    }

    /// The count, or 1 when none was typed.
    pub fn count_or_default(&self) -> usize {
        self.count.unwrap_or(1).max(1)
    }

    /// The same data with the count handed on elsewhere (`3x` becomes `d3l`).
    pub fn without_count(self) -> Self {
        Self { count: None, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `d`
    Delete,
    /// `y`
    Yank,
    /// `c`
    Change,
    /// `<`
    ShiftLeft,
    /// `>`
    ShiftRight,
    /// `g~`
    ToggleCase,
    /// `gu`
    LowerCase,
    /// `gU`
    UpperCase,
    /// `gq`
    Format,
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Delete => "delete",
            Operator::Yank => "yank",
            Operator::Change => "change",
            Operator::ShiftLeft => "shift left",
            Operator::ShiftRight => "shift right",
            Operator::ToggleCase => "toggle case",
            Operator::LowerCase => "lowercase",
            Operator::UpperCase => "uppercase",
            Operator::Format => "format",
        }
    }
}

/// Test hook: a command that runs an arbitrary closure.
#[derive(Clone)]
pub struct PingData(pub Rc<dyn Fn(CommandData) -> CommandResult>);

impl PingData {
    pub fn new(func: impl Fn(CommandData) -> CommandResult + 'static) -> Self {
        Self(Rc::new(func))
    }
}

impl fmt::Debug for PingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PingData(..)")
    }
}

impl PartialEq for PingData {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Commands resolved in Normal mode.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalCommand {
    MoveCaret(Motion),
    Operator(Operator, MotionData),
    /// `x`
    DeleteCharAtCaret,
    /// `X`
    DeleteCharBeforeCaret,
    /// `D`
    DeleteToEndOfLine,
    /// `C`
    ChangeToEndOfLine,
    /// `s`
    SubstituteChar,
    /// `S`
    SubstituteLine,
    /// `Y`
    YankLine,
    /// `J` / `gJ`
    JoinLines { insert_space: bool },
    /// `r{c}`
    ReplaceChar(char),
    /// `~`
    ToggleCaseAtCaret,
    /// `p` `P` `gp` `gP`
    Put { before: bool, move_after: bool },
    /// `i`
    InsertBeforeCaret,
    /// `a`
    InsertAfterCaret,
    /// `I`
    InsertAtFirstNonBlank,
    /// `A`
    InsertAtEndOfLine,
    /// `o`
    OpenLineBelow,
    /// `O`
    OpenLineAbove,
    /// `R`
    ReplaceMode,
    /// `v` `V` `<C-v>`
    StartVisual(ModeKind),
    /// `gh`
    StartSelect,
    /// `u`
    Undo,
    /// `<C-r>`
    Redo,
    /// `.`
    RepeatLastChange,
    /// `q{reg}`. A bare `q` while recording stops the recording.
    RecordMacro(RegisterName),
    /// `@{reg}`, or `@@` (`None`) for the last macro run.
    RunMacro(Option<RegisterName>),
    /// `:`
    EnterCommandLine,
    Ping(PingData),
}

/// Commands resolved in the Visual modes.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualCommand {
    /// Moves the caret end of the selection, or replaces the selection
    /// with a text object.
    Move(Motion),
    Operator(Operator),
    /// `J` / `gJ`
    JoinLines { insert_space: bool },
    /// `r{c}`
    ReplaceSelection(char),
    /// `p` / `P`
    Put { before: bool },
    /// `o`
    SwapAnchor,
    /// `v` `V` `<C-v>`: switch kind, or leave when it is the current one.
    SwitchKind(ModeKind),
    /// `<C-g>`
    SwitchToSelect,
    /// `<Esc>`
    Exit,
    /// `:`
    EnterCommandLine,
    /// `I` / `A` in a block selection.
    BlockInsert { append: bool },
}

/// Commands resolved in Insert and Replace mode. Printable keys arrive as
/// `InsertChar` without going through the binding table.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertCommand {
    InsertChar(char),
    /// `<CR>`
    InsertNewLine,
    /// `<BS>`
    Backspace,
    /// `<Del>`
    DeleteRight,
    /// `<Tab>`
    InsertTab,
    /// `<C-w>`
    DeleteWordBeforeCaret,
    /// `<C-u>`
    DeleteLineBeforeCaret,
    /// `<C-r>{reg}`
    PasteRegister(RegisterName),
    /// Arrow keys.
    MoveCaret(Motion),
    /// `<Esc>`
    Exit,
}

/// Commands resolved in Select mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectCommand {
    /// A printable key replaces the selection and starts Insert mode.
    ReplaceSelection(char),
    /// `<BS>` / `<Del>`
    DeleteSelection,
    /// Arrow keys extend the selection.
    Extend(Motion),
    /// `<C-g>`
    SwitchToVisual,
    /// `<Esc>`
    Exit,
}

/// Commands resolved on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandLineCommand {
    /// `<CR>`
    Execute,
    /// `<BS>`; leaves the command line when it is empty.
    Backspace,
    /// `<Esc>`
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Normal(NormalCommand),
    Visual(VisualCommand),
    Insert(InsertCommand),
    Select(SelectCommand),
}

/// Data carried into a mode when switching to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeArgument {
    /// `3ia<Esc>`: the insert is repeated `count` times in total. With
    /// `new_line` each repetition goes on a line of its own (`3o`).
    InsertWithCount { count: usize, new_line: bool },
    /// Block `I`/`A`/`c`: text typed on the first line is copied to the
    /// others at `column` on `<Esc>`. With `pad`, short lines are extended
    /// with spaces; otherwise they are skipped.
    InsertBlock {
        column: usize,
        first_line: usize,
        last_line: usize,
        pad: bool,
    },
    /// Starts a Visual or Select mode with this selection.
    InitialSelection { anchor: usize, caret: usize },
    /// Starts the command line with this text.
    CommandLine(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSwitch {
    NoSwitch,
    SwitchMode(ModeKind),
    SwitchModeWithArgument(ModeKind, ModeArgument),
    /// Back to the mode that was active before the current one.
    SwitchPreviousMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Completed(ModeSwitch),
    Error(String),
}

impl CommandResult {
    pub fn no_switch() -> Self {
        CommandResult::Completed(ModeSwitch::NoSwitch)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CommandResult::Error(_))
    }
}

/// Record of one executed command, kept for `.` and for hosts that audit
/// what ran.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRunData {
    pub name: KeyInputSet,
    pub flags: CommandFlags,
    pub command: Command,
    pub data: CommandData,
    pub result: CommandResult,
}

impl CommandRunData {
    /// The same command with a different count, as `3.` runs it.
    pub fn with_count(&self, count: Option<usize>) -> Self {
        let mut run = self.clone();
        if count.is_some() {
            run.data.count = count;
            if let Command::Normal(NormalCommand::Operator(_, motion)) = &mut run.command {
                motion.argument.count = None;
            }
        }
        run
    }
}
