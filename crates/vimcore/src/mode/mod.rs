//! Editing modes and their key bindings.

mod command_line;
mod insert;
mod normal;
mod select;
mod visual;

pub use command_line::command_line_bindings;
pub use insert::insert_bindings;
pub use normal::normal_bindings;
pub use select::select_bindings;
pub use visual::visual_bindings;

use crate::register::OperationKind;

/// The current editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModeKind {
    /// Navigation and commands.
    #[default]
    Normal,
    /// Text input.
    Insert,
    /// Text input that overwrites.
    Replace,
    VisualCharacter,
    VisualLine,
    VisualBlock,
    /// Typing replaces the selection.
    Select,
    /// Collecting an ex command after `:`.
    CommandLine,
    /// The host is not ready; keys are ignored.
    Disabled,
    /// The host has taken over input; keys are ignored.
    External,
}

impl ModeKind {
    pub fn is_normal(&self) -> bool {
        matches!(self, ModeKind::Normal)
    }

    /// Insert or Replace.
    pub fn is_insert(&self) -> bool {
        matches!(self, ModeKind::Insert | ModeKind::Replace)
    }

    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            ModeKind::VisualCharacter | ModeKind::VisualLine | ModeKind::VisualBlock
        )
    }

    /// Modes in which a selection is shown.
    pub fn has_selection(&self) -> bool {
        self.is_visual() || matches!(self, ModeKind::Select)
    }

    /// Disabled and External process no keys.
    pub fn processes_keys(&self) -> bool {
        !matches!(self, ModeKind::Disabled | ModeKind::External)
    }

    /// Shape of the text a Visual mode selects.
    pub fn selection_kind(&self) -> Option<OperationKind> {
        match self {
            ModeKind::VisualCharacter | ModeKind::Select => Some(OperationKind::CharacterWise),
            ModeKind::VisualLine => Some(OperationKind::LineWise),
            ModeKind::VisualBlock => Some(OperationKind::BlockWise),
            _ => None,
        }
    }

    /// Returns the mode name for display.
    pub fn label(&self) -> &'static str {
        match self {
            ModeKind::Normal => "NORMAL",
            ModeKind::Insert => "INSERT",
            ModeKind::Replace => "REPLACE",
            ModeKind::VisualCharacter => "VISUAL",
            ModeKind::VisualLine => "VISUAL LINE",
            ModeKind::VisualBlock => "VISUAL BLOCK",
            ModeKind::Select => "SELECT",
            ModeKind::CommandLine => "COMMAND",
            ModeKind::Disabled => "DISABLED",
            ModeKind::External => "EXTERNAL",
        }
    }
}
