//! Insert and Replace mode bindings.
//!
//! Printable keys are not bound: the buffer inserts them directly.

use crate::binding::{BindData, BindDataStorage, BindResult, CommandBinding, CommandBindingRegistry, CommandFlags};
use crate::command::InsertCommand;
use crate::motion::Motion;
use crate::register::RegisterName;

pub fn insert_bindings() -> CommandBindingRegistry<InsertCommand> {
    use InsertCommand::*;

    let none = CommandFlags::empty();
    let simple = [
        ("<Esc>", Exit),
        ("<C-c>", Exit),
        ("<CR>", InsertNewLine),
        ("<BS>", Backspace),
        ("<C-h>", Backspace),
        ("<Del>", DeleteRight),
        ("<Tab>", InsertTab),
        ("<C-w>", DeleteWordBeforeCaret),
        ("<C-u>", DeleteLineBeforeCaret),
        ("<Left>", MoveCaret(Motion::CharLeft)),
        ("<Right>", MoveCaret(Motion::CharRight)),
        ("<Up>", MoveCaret(Motion::LineUp)),
        ("<Down>", MoveCaret(Motion::LineDown)),
        ("<Home>", MoveCaret(Motion::BeginningOfLine)),
        ("<End>", MoveCaret(Motion::EndOfLine)),
    ];

    let mut bindings: Vec<_> = simple
        .into_iter()
        .map(|(name, command)| CommandBinding::normal(name, none, command))
        .collect();
    bindings.push(CommandBinding::complex(
        "<C-r>",
        none,
        BindDataStorage::Simple(BindData::read_char(|c| match RegisterName::from_char(c) {
            Some(name) => BindResult::Complete(PasteRegister(name)),
            None => BindResult::Error,
        })),
    ));

    CommandBindingRegistry::new(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{CommandRunner, RunResult};
    use crate::key::{parse_keys, KeyInput};

    #[test]
    fn test_insert_bindings() {
        let mut runner = CommandRunner::new(insert_bindings(), false, false);
        let keys = parse_keys("<C-r>a");
        assert!(matches!(runner.run(keys[0]), RunResult::NeedMoreInput));
        match runner.run(keys[1]) {
            RunResult::Complete(resolved) => {
                assert_eq!(resolved.command, InsertCommand::PasteRegister(RegisterName::Named('a')));
            }
            other => panic!("unexpected {other:?}"),
        }

        // Digits are text in Insert mode, not counts.
        assert!(!runner.registry().starts_with_key(&KeyInput::from_char('3')));
        assert!(matches!(
            runner.run(KeyInput::escape()),
            RunResult::Complete(resolved) if resolved.command == InsertCommand::Exit
        ));
    }
}
