//! Select mode bindings. Printable keys replace the selection; the buffer
//! handles them directly.

use crate::binding::{CommandBinding, CommandBindingRegistry, CommandFlags};
use crate::command::SelectCommand;
use crate::motion::Motion;

pub fn select_bindings() -> CommandBindingRegistry<SelectCommand> {
    use SelectCommand::*;

    let bindings = [
        ("<Esc>", Exit),
        ("<BS>", DeleteSelection),
        ("<Del>", DeleteSelection),
        ("<C-g>", SwitchToVisual),
        ("<Left>", Extend(Motion::CharLeft)),
        ("<Right>", Extend(Motion::CharRight)),
        ("<Up>", Extend(Motion::LineUp)),
        ("<Down>", Extend(Motion::LineDown)),
        ("<Home>", Extend(Motion::BeginningOfLine)),
        ("<End>", Extend(Motion::EndOfLine)),
    ];
    CommandBindingRegistry::new(
        bindings
            .into_iter()
            .map(|(name, command)| CommandBinding::normal(name, CommandFlags::empty(), command))
            .collect(),
    )
}
