//! Command-line bindings. Typed characters are appended by the buffer.

use crate::binding::{CommandBinding, CommandBindingRegistry, CommandFlags};
use crate::command::CommandLineCommand;

pub fn command_line_bindings() -> CommandBindingRegistry<CommandLineCommand> {
    let none = CommandFlags::empty();
    CommandBindingRegistry::new(vec![
        CommandBinding::normal("<CR>", none, CommandLineCommand::Execute),
        CommandBinding::normal("<BS>", none, CommandLineCommand::Backspace),
        CommandBinding::normal("<Esc>", none, CommandLineCommand::Cancel),
        CommandBinding::normal("<C-c>", none, CommandLineCommand::Cancel),
    ])
}
