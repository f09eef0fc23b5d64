//! Normal mode bindings.

use super::ModeKind;
use crate::binding::{
    BindData, BindDataStorage, BindResult, CommandBinding, CommandBindingRegistry, CommandFlags,
};
use crate::command::{NormalCommand, Operator};
use crate::motion::movement_bindings;
use crate::register::RegisterName;

/// Operators with the keys that make their linewise form.
pub(crate) const OPERATORS: [(&str, Operator, &[&str]); 9] = [
    ("d", Operator::Delete, &["d"]),
    ("y", Operator::Yank, &["y"]),
    ("c", Operator::Change, &["c"]),
    ("<lt>", Operator::ShiftLeft, &["<lt>"]),
    (">", Operator::ShiftRight, &[">"]),
    ("g~", Operator::ToggleCase, &["~", "g~"]),
    ("gu", Operator::LowerCase, &["u", "gu"]),
    ("gU", Operator::UpperCase, &["U", "gU"]),
    ("gq", Operator::Format, &["q", "gq"]),
];

fn register_argument(
    convert: fn(RegisterName) -> NormalCommand,
) -> BindDataStorage<NormalCommand> {
    BindDataStorage::Simple(BindData::read_char(move |c| {
        match RegisterName::from_char(c) {
            Some(name) => BindResult::Complete(convert(name)),
            None => BindResult::Error,
        }
    }))
}

fn operator_flags(operator: Operator) -> CommandFlags {
    match operator {
        Operator::Yank => CommandFlags::empty(),
        Operator::Change => CommandFlags::REPEATABLE | CommandFlags::LINKED_WITH_INSERT,
        _ => CommandFlags::REPEATABLE,
    }
}

pub fn normal_bindings() -> CommandBindingRegistry<NormalCommand> {
    use NormalCommand::*;

    let change = CommandFlags::REPEATABLE;
    let insert = CommandFlags::REPEATABLE | CommandFlags::LINKED_WITH_INSERT;
    let special = CommandFlags::SPECIAL;
    let none = CommandFlags::empty();

    let mut bindings = movement_bindings(false, MoveCaret);

    for (name, operator, line_keys) in OPERATORS {
        let flags = operator_flags(operator);
        bindings.push(CommandBinding::motion(name, flags, line_keys, move |motion| {
            NormalCommand::Operator(operator, motion)
        }));
    }

    let simple = [
        ("x", change, DeleteCharAtCaret),
        ("<Del>", change, DeleteCharAtCaret),
        ("X", change, DeleteCharBeforeCaret),
        ("D", change, DeleteToEndOfLine),
        ("C", insert, ChangeToEndOfLine),
        ("s", insert, SubstituteChar),
        ("S", insert, SubstituteLine),
        ("Y", none, YankLine),
        ("J", change, JoinLines { insert_space: true }),
        ("gJ", change, JoinLines { insert_space: false }),
        ("~", change, ToggleCaseAtCaret),
        ("p", change, Put { before: false, move_after: false }),
        ("P", change, Put { before: true, move_after: false }),
        ("gp", change, Put { before: false, move_after: true }),
        ("gP", change, Put { before: true, move_after: true }),
        ("i", insert, InsertBeforeCaret),
        ("<Insert>", insert, InsertBeforeCaret),
        ("a", insert, InsertAfterCaret),
        ("I", insert, InsertAtFirstNonBlank),
        ("A", insert, InsertAtEndOfLine),
        ("o", insert, OpenLineBelow),
        ("O", insert, OpenLineAbove),
        ("R", insert, ReplaceMode),
        ("v", none, StartVisual(ModeKind::VisualCharacter)),
        ("V", none, StartVisual(ModeKind::VisualLine)),
        ("<C-v>", none, StartVisual(ModeKind::VisualBlock)),
        ("gh", none, StartSelect),
        ("u", special, Undo),
        ("<C-r>", special, Redo),
        (".", special, RepeatLastChange),
        (":", none, EnterCommandLine),
    ];
    bindings.extend(
        simple
            .into_iter()
            .map(|(name, flags, command)| CommandBinding::normal(name, flags, command)),
    );

    bindings.push(CommandBinding::complex(
        "r",
        change,
        BindDataStorage::Simple(BindData::read_char(|c| {
            BindResult::Complete(ReplaceChar(c))
        })),
    ));
    bindings.push(CommandBinding::complex("q", special, register_argument(RecordMacro)));
    bindings.push(CommandBinding::complex(
        "@",
        special,
        BindDataStorage::Simple(BindData::read_char(|c| match c {
            '@' => BindResult::Complete(RunMacro(None)),
            _ => match RegisterName::from_char(c) {
                Some(name) => BindResult::Complete(RunMacro(Some(name))),
                None => BindResult::Error,
            },
        })),
    ));

    CommandBindingRegistry::new(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{CommandRunner, RunResult};
    use crate::key::parse_keys;
    use crate::motion::Motion;
    use crate::text::WordKind;

    fn resolve(keys: &str) -> Option<(NormalCommand, crate::command::CommandData)> {
        let mut runner = CommandRunner::new(normal_bindings(), true, true);
        let mut last = None;
        for key in parse_keys(keys) {
            last = Some(runner.run(key));
        }
        match last {
            Some(RunResult::Complete(resolved)) => Some((resolved.command, resolved.data)),
            _ => None,
        }
    }

    #[test]
    fn test_operator_bindings() {
        let (command, data) = resolve("3dw").unwrap();
        assert_eq!(data.count, Some(3));
        match command {
            NormalCommand::Operator(Operator::Delete, motion) => {
                assert_eq!(motion.motion, Motion::WordForward(WordKind::NormalWord));
            }
            other => panic!("unexpected {other:?}"),
        }

        for keys in ["dd", "yy", "cc", "<lt><lt>", ">>", "g~~", "g~g~", "guu", "gUU", "gqq", "gqgq"] {
            match resolve(keys) {
                Some((NormalCommand::Operator(_, motion), _)) => {
                    assert_eq!(motion.motion, Motion::WholeLine, "{keys}");
                }
                other => panic!("{keys}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_prefix_commands() {
        assert_eq!(resolve("gg").unwrap().0, NormalCommand::MoveCaret(Motion::FirstLine));
        assert_eq!(
            resolve("gJ").unwrap().0,
            NormalCommand::JoinLines { insert_space: false }
        );
        assert_eq!(resolve("gh").unwrap().0, NormalCommand::StartSelect);
        assert_eq!(
            resolve("gP").unwrap().0,
            NormalCommand::Put { before: true, move_after: true }
        );
    }

    #[test]
    fn test_argument_commands() {
        assert_eq!(resolve("rx").unwrap().0, NormalCommand::ReplaceChar('x'));
        assert_eq!(
            resolve("qa").unwrap().0,
            NormalCommand::RecordMacro(RegisterName::Named('a'))
        );
        assert_eq!(resolve("@@").unwrap().0, NormalCommand::RunMacro(None));
        let (command, data) = resolve("2@q").unwrap();
        assert_eq!(command, NormalCommand::RunMacro(Some(RegisterName::Named('q'))));
        assert_eq!(data.count, Some(2));
        assert!(resolve("q!").is_none());
    }

    #[test]
    fn test_register_prefix() {
        let (command, data) = resolve("\"Ap").unwrap();
        assert_eq!(command, NormalCommand::Put { before: false, move_after: false });
        assert_eq!(data.register_name, Some(RegisterName::Append('a')));
    }

    #[test]
    fn test_operator_binding_flags() {
        let registry = normal_bindings();
        let flags = |keys: &str| {
            registry
                .get(&crate::key::KeyInputSet::new(parse_keys(keys)))
                .unwrap()
                .flags
        };
        assert_eq!(flags("y"), CommandFlags::empty());
        assert_eq!(flags("d"), CommandFlags::REPEATABLE);
        assert_eq!(
            flags("c"),
            CommandFlags::REPEATABLE | CommandFlags::LINKED_WITH_INSERT
        );
        assert_eq!(flags("gU"), CommandFlags::REPEATABLE);
    }
}
