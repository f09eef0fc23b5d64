//! Per-mode command bindings.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use super::BindDataStorage;
use crate::key::{KeyInput, KeyInputSet};
use crate::motion::MotionData;

bitflags! {
    /// Properties of a binding that the buffer acts on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandFlags: u16 {
        /// A change that `.` can repeat.
        const REPEATABLE = 1;
        /// Only moves the caret or selection.
        const MOVEMENT = 1 << 1;
        /// Handled by the buffer itself: undo, redo, `.`, macros.
        const SPECIAL = 1 << 2;
        /// Enters Insert or Replace; the text typed there belongs to the change.
        const LINKED_WITH_INSERT = 1 << 3;
    }
}

/// How a binding turns into a command once its name has been typed.
pub enum BindingKind<T> {
    /// The name alone identifies the command.
    Normal(T),
    /// An operator: the name is followed by a motion. Any of `line_keys`
    /// typed in place of a motion selects whole lines (`dd`, `g~~`, `gUU`).
    Motion {
        convert: Rc<dyn Fn(MotionData) -> T>,
        line_keys: Vec<KeyInputSet>,
    },
    /// Further input is parsed by a continuation (`r{c}`, `q{reg}`).
    Complex(BindDataStorage<T>),
}

impl<T: Clone> Clone for BindingKind<T> {
    fn clone(&self) -> Self {
        match self {
            BindingKind::Normal(command) => BindingKind::Normal(command.clone()),
            BindingKind::Motion { convert, line_keys } => BindingKind::Motion {
                convert: Rc::clone(convert),
                line_keys: line_keys.clone(),
            },
            BindingKind::Complex(storage) => BindingKind::Complex(storage.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BindingKind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Normal(command) => f.debug_tuple("Normal").field(command).finish(),
            BindingKind::Motion { line_keys, .. } => f
                .debug_struct("Motion")
                .field("line_keys", line_keys)
                .finish_non_exhaustive(),
            BindingKind::Complex(storage) => f.debug_tuple("Complex").field(storage).finish(),
        }
    }
}

#[derive(Debug)]
pub struct CommandBinding<T> {
    pub name: KeyInputSet,
    pub flags: CommandFlags,
    pub kind: BindingKind<T>,
}

impl<T: Clone> Clone for CommandBinding<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            flags: self.flags,
            kind: self.kind.clone(),
        }
    }
}

impl<T> CommandBinding<T> {
    /// A binding named by `name` in key notation.
    pub fn normal(name: &str, flags: CommandFlags, command: T) -> Self {
        Self {
            name: KeyInputSet::from_notation(name),
            flags,
            kind: BindingKind::Normal(command),
        }
    }

    pub fn motion(
        name: &str,
        flags: CommandFlags,
        line_keys: &[&str],
        convert: impl Fn(MotionData) -> T + 'static,
    ) -> Self {
        Self {
            name: KeyInputSet::from_notation(name),
            flags,
            kind: BindingKind::Motion {
                convert: Rc::new(convert),
                line_keys: line_keys
                    .iter()
                    .map(|keys| KeyInputSet::from_notation(keys))
                    .collect(),
            },
        }
    }

    pub fn complex(name: &str, flags: CommandFlags, storage: BindDataStorage<T>) -> Self {
        Self::complex_keys(KeyInputSet::from_notation(name), flags, storage)
    }

    pub fn complex_keys(name: KeyInputSet, flags: CommandFlags, storage: BindDataStorage<T>) -> Self {
        Self {
            name,
            flags,
            kind: BindingKind::Complex(storage),
        }
    }
}

/// Result of looking up a partially typed name.
#[derive(Debug)]
pub enum Lookup<T> {
    /// A binding has exactly this name. `has_longer` is set when other
    /// bindings extend it.
    Exact {
        binding: CommandBinding<T>,
        has_longer: bool,
    },
    /// Some binding names start with these keys.
    Prefix,
    NoMatch,
}

/// The bindings of one mode. Built once when the mode is created.
#[derive(Debug)]
pub struct CommandBindingRegistry<T> {
    bindings: Vec<CommandBinding<T>>,
}

impl<T> Default for CommandBindingRegistry<T> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<T: Clone> CommandBindingRegistry<T> {
    pub fn new(bindings: Vec<CommandBinding<T>>) -> Self {
        let mut registry = Self::default();
        for binding in bindings {
            registry.add(binding);
        }
        registry
    }

    /// Adds a binding, replacing any binding with the same name.
    pub fn add(&mut self, binding: CommandBinding<T>) {
        match self.bindings.iter_mut().find(|b| b.name == binding.name) {
            Some(existing) => *existing = binding,
            None => self.bindings.push(binding),
        }
    }

    pub fn get(&self, name: &KeyInputSet) -> Option<&CommandBinding<T>> {
        self.bindings.iter().find(|b| &b.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandBinding<T>> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether any binding name begins with `key`.
    pub fn starts_with_key(&self, key: &KeyInput) -> bool {
        self.bindings.iter().any(|b| b.name.first() == Some(key))
    }

    pub fn lookup(&self, keys: &KeyInputSet) -> Lookup<T> {
        let mut exact = None;
        let mut has_longer = false;
        for binding in self.bindings.iter().filter(|b| b.name.starts_with(keys)) {
            if binding.name.len() == keys.len() {
                exact = Some(binding);
            } else {
                has_longer = true;
            }
        }
        match exact {
            Some(binding) => Lookup::Exact {
                binding: binding.clone(),
                has_longer,
            },
            None if has_longer => Lookup::Prefix,
            None => Lookup::NoMatch,
        }
    }
}
