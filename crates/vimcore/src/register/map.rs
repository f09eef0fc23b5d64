//! Register storage and the yank/delete update rules.

use std::fmt;

use tracing::{debug, warn};

use super::{OperationKind, RegisterName, RegisterValue};
use crate::host::{ClipboardBridge, MemoryClipboard};

const SLOT_COUNT: usize = 44;
const FIRST_NUMBERED: usize = 1;
const FIRST_NAMED: usize = 11;

fn slot(name: RegisterName) -> Option<usize> {
    match name.storage() {
        RegisterName::Unnamed => Some(0),
        RegisterName::Numbered(n) if n < 10 => Some(FIRST_NUMBERED + n as usize),
        RegisterName::Named(c) if c.is_ascii_lowercase() => {
            Some(FIRST_NAMED + (c as u8 - b'a') as usize)
        }
        RegisterName::SmallDelete => Some(37),
        RegisterName::Clipboard => Some(38),
        RegisterName::Selection => Some(39),
        RegisterName::LastInserted => Some(40),
        RegisterName::LastCommandLine => Some(41),
        RegisterName::FileName => Some(42),
        RegisterName::LastSearch => Some(43),
        _ => None,
    }
}

/// A register and its current contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub name: RegisterName,
    pub value: RegisterValue,
}

/// What produced the text being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOperation {
    Yank,
    Delete,
}

/// All registers of one session.
pub struct RegisterMap {
    slots: [Option<RegisterValue>; SLOT_COUNT],
    clipboard: Box<dyn ClipboardBridge>,
    clipboard_unnamed: bool,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self::new(Box::new(MemoryClipboard::new()))
    }
}

impl fmt::Debug for RegisterMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<_> = RegisterName::all()
            .filter_map(|name| {
                let value = slot(name).and_then(|i| self.slots[i].as_ref())?;
                Some((name.char(), value.text()))
            })
            .collect();
        f.debug_struct("RegisterMap")
            .field("registers", &set)
            .field("clipboard_unnamed", &self.clipboard_unnamed)
            .finish()
    }
}

impl RegisterMap {
    pub fn new(clipboard: Box<dyn ClipboardBridge>) -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            clipboard,
            clipboard_unnamed: false,
        }
    }

    /// When set, the unnamed register is backed by the clipboard
    /// (`clipboard=unnamed`).
    pub fn set_clipboard_unnamed(&mut self, enabled: bool) {
        self.clipboard_unnamed = enabled;
    }

    /// Current contents of `name`. Unset registers read as empty text.
    pub fn get_register(&mut self, name: RegisterName) -> Register {
        let stored = slot(name)
            .and_then(|i| self.slots[i].clone())
            .unwrap_or_default();

        let from_clipboard =
            name.is_clipboard() || (name == RegisterName::Unnamed && self.clipboard_unnamed);
        let value = if from_clipboard {
            match self.clipboard.read() {
                // Keep the stored kind when the clipboard still holds our text.
                Some(text) if text != stored.text() => {
                    if text.ends_with('\n') {
                        RegisterValue::line_wise(text)
                    } else {
                        RegisterValue::character_wise(text)
                    }
                }
                _ => stored,
            }
        } else {
            stored
        };

        Register { name, value }
    }

    /// Writes `value` as a user-level register write (`"ayy`, `:let @a`).
    ///
    /// Uppercase names append to the lowercase register. Any write also
    /// updates the unnamed register. Read-only registers are left alone.
    pub fn set_register(&mut self, name: RegisterName, value: RegisterValue) {
        if name == RegisterName::BlackHole {
            return;
        }
        if name.is_read_only() {
            warn!(register = %name, "ignoring write to read-only register");
            return;
        }

        let value = if name.is_append() {
            let existing = self.get_register(name.storage()).value;
            existing.append(&value)
        } else {
            value
        };

        self.store(name.storage(), value.clone());
        if name.storage() != RegisterName::Unnamed {
            self.store(RegisterName::Unnamed, value);
        }
    }

    /// Stores the result of a yank or delete.
    ///
    /// With no explicit register, yanks go to `"0`, one-line deletes go to
    /// `"-` and anything larger shifts `"1`..`"9`. `force_numbered` marks
    /// deletes whose motion always lands in `"1`.
    pub fn update(
        &mut self,
        target: Option<RegisterName>,
        operation: RegisterOperation,
        value: RegisterValue,
        force_numbered: bool,
    ) {
        let multi_line = value.spans_lines();
        match target {
            Some(RegisterName::BlackHole) => {}
            Some(name) => {
                self.set_register(name, value.clone());
                if operation == RegisterOperation::Delete && (multi_line || force_numbered) {
                    self.shift_numbered(value);
                }
            }
            None => match operation {
                RegisterOperation::Yank => {
                    self.store(RegisterName::Numbered(0), value.clone());
                    self.store(RegisterName::Unnamed, value);
                }
                RegisterOperation::Delete => {
                    if multi_line || force_numbered {
                        self.shift_numbered(value.clone());
                    }
                    if !multi_line {
                        self.store(RegisterName::SmallDelete, value.clone());
                    }
                    self.store(RegisterName::Unnamed, value);
                }
            },
        }
    }

    /// Sets a register the user cannot write (`.`, `:`, `/`, `%`).
    pub fn set_read_only_register(&mut self, name: RegisterName, text: &str) {
        if name.is_read_only() {
            self.store(name, RegisterValue::character_wise(text));
        }
    }

    /// Every register holding text, in `:reg` order.
    pub fn registers(&mut self) -> Vec<Register> {
        RegisterName::all()
            .map(|name| self.get_register(name))
            .filter(|register| !register.value.is_empty())
            .collect()
    }

    /// Named and numbered registers that hold text; what a session persists.
    pub fn persistent_registers(&self) -> Vec<Register> {
        (0..10)
            .map(RegisterName::Numbered)
            .chain(('a'..='z').map(RegisterName::Named))
            .filter_map(|name| {
                let value = slot(name).and_then(|i| self.slots[i].clone())?;
                (!value.is_empty()).then_some(Register { name, value })
            })
            .collect()
    }

    /// Puts a register back without running the write rules.
    pub fn restore(&mut self, register: Register) {
        if let Some(i) = slot(register.name) {
            self.slots[i] = Some(register.value);
        }
    }

    pub fn clear(&mut self) {
        self.slots = std::array::from_fn(|_| None);
    }

    fn shift_numbered(&mut self, value: RegisterValue) {
        let numbered = &mut self.slots[FIRST_NUMBERED + 1..=FIRST_NUMBERED + 9];
        numbered.rotate_right(1);
        numbered[0] = Some(value);
        debug!("shifted numbered registers");
    }

    fn store(&mut self, name: RegisterName, value: RegisterValue) {
        let Some(i) = slot(name) else {
            return;
        };
        debug!(register = %name, kind = ?value.kind(), "register write");

        let to_clipboard =
            name.is_clipboard() || (name == RegisterName::Unnamed && self.clipboard_unnamed);
        if to_clipboard {
            let mut text = value.text();
            if value.kind() == OperationKind::BlockWise {
                text.push('\n');
            }
            self.clipboard.write(&text);
        }
        self.slots[i] = Some(value);
    }
}
