//! Visual mode bindings, shared by the character, line and block forms.

use super::ModeKind;
use crate::binding::{BindData, BindDataStorage, BindResult, CommandBinding, CommandBindingRegistry, CommandFlags};
use crate::command::{Operator, VisualCommand};
use crate::motion::movement_bindings;

pub fn visual_bindings() -> CommandBindingRegistry<VisualCommand> {
    use VisualCommand::{
        BlockInsert, EnterCommandLine, Exit, JoinLines, Move, Put, ReplaceSelection, SwapAnchor,
        SwitchKind, SwitchToSelect,
    };

    let none = CommandFlags::empty();
    let mut bindings = movement_bindings(true, Move);

    let simple = [
        ("d", VisualCommand::Operator(Operator::Delete)),
        ("x", VisualCommand::Operator(Operator::Delete)),
        ("<Del>", VisualCommand::Operator(Operator::Delete)),
        ("y", VisualCommand::Operator(Operator::Yank)),
        ("c", VisualCommand::Operator(Operator::Change)),
        ("s", VisualCommand::Operator(Operator::Change)),
        ("<lt>", VisualCommand::Operator(Operator::ShiftLeft)),
        (">", VisualCommand::Operator(Operator::ShiftRight)),
        ("~", VisualCommand::Operator(Operator::ToggleCase)),
        ("u", VisualCommand::Operator(Operator::LowerCase)),
        ("U", VisualCommand::Operator(Operator::UpperCase)),
        ("gq", VisualCommand::Operator(Operator::Format)),
        ("J", JoinLines { insert_space: true }),
        ("gJ", JoinLines { insert_space: false }),
        ("p", Put { before: false }),
        ("P", Put { before: true }),
        ("o", SwapAnchor),
        ("v", SwitchKind(ModeKind::VisualCharacter)),
        ("V", SwitchKind(ModeKind::VisualLine)),
        ("<C-v>", SwitchKind(ModeKind::VisualBlock)),
        ("<C-g>", SwitchToSelect),
        ("<Esc>", Exit),
        (":", EnterCommandLine),
        ("I", BlockInsert { append: false }),
        ("A", BlockInsert { append: true }),
    ];
    bindings.extend(
        simple
            .into_iter()
            .map(|(name, command)| CommandBinding::normal(name, none, command)),
    );
    bindings.push(CommandBinding::complex(
        "r",
        none,
        BindDataStorage::Simple(BindData::read_char(|c| BindResult::Complete(ReplaceSelection(c)))),
    ));

    CommandBindingRegistry::new(bindings)
}
