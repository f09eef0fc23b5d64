//! Key binding resolution.
//!
//! Multi-key input is parsed by continuations: a [`BindData`] consumes one
//! key and either finishes, asks for another key with a new `BindData`, or
//! gives up. Nothing blocks and any pending state is a plain value that can
//! be dropped to cancel.

mod registry;
mod runner;

use std::fmt;
use std::rc::Rc;

pub use registry::{BindingKind, CommandBinding, CommandBindingRegistry, CommandFlags, Lookup};
pub use runner::{CommandRunner, ResolvedCommand, RunResult};

use crate::key::{KeyInput, VimKey};

/// Which remap table, if any, applies to keys read by a continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRemapMode {
    Normal,
    Visual,
    Select,
    OperatorPending,
    Insert,
    CommandLine,
    /// Literal character arguments (`f{c}`, `r{c}`, `"{r}`); never remapped.
    Language,
}

/// Outcome of feeding one key to a [`BindData`].
pub enum BindResult<T> {
    Complete(T),
    NeedMoreInput(BindData<T>),
    Cancelled,
    Error,
}

impl<T: 'static> BindResult<T> {
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> BindResult<U> {
        self.map_shared(Rc::new(f))
    }

    fn map_shared<U: 'static>(self, f: Rc<dyn Fn(T) -> U>) -> BindResult<U> {
        match self {
            BindResult::Complete(value) => BindResult::Complete(f(value)),
            BindResult::NeedMoreInput(next) => BindResult::NeedMoreInput(next.map_shared(f)),
            BindResult::Cancelled => BindResult::Cancelled,
            BindResult::Error => BindResult::Error,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BindResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindResult::Complete(value) => f.debug_tuple("Complete").field(value).finish(),
            BindResult::NeedMoreInput(next) => f.debug_tuple("NeedMoreInput").field(next).finish(),
            BindResult::Cancelled => write!(f, "Cancelled"),
            BindResult::Error => write!(f, "Error"),
        }
    }
}

/// A continuation waiting for the next key.
pub struct BindData<T> {
    remap_mode: Option<KeyRemapMode>,
    func: Rc<dyn Fn(KeyInput) -> BindResult<T>>,
}

impl<T> Clone for BindData<T> {
    fn clone(&self) -> Self {
        Self {
            remap_mode: self.remap_mode,
            func: Rc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for BindData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindData")
            .field("remap_mode", &self.remap_mode)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> BindData<T> {
    pub fn new(
        remap_mode: Option<KeyRemapMode>,
        func: impl Fn(KeyInput) -> BindResult<T> + 'static,
    ) -> Self {
        Self {
            remap_mode,
            func: Rc::new(func),
        }
    }

    /// Reads one printable character. `<Esc>` cancels, any other key is an error.
    pub fn read_char(func: impl Fn(char) -> BindResult<T> + 'static) -> Self {
        Self::new(Some(KeyRemapMode::Language), move |key| {
            if key.is_escape() {
                return BindResult::Cancelled;
            }
            match key.key() {
                VimKey::Enter => func('\n'),
                VimKey::Tab => func('\t'),
                _ => match key.printable_char() {
                    Some(c) => func(c),
                    None => BindResult::Error,
                },
            }
        })
    }

    pub fn remap_mode(&self) -> Option<KeyRemapMode> {
        self.remap_mode
    }

    pub fn run(&self, key: KeyInput) -> BindResult<T> {
        (self.func)(key)
    }

    /// Converts the eventual value, however many keys it takes to produce.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> BindData<U> {
        self.map_shared(Rc::new(f))
    }

    fn map_shared<U: 'static>(self, f: Rc<dyn Fn(T) -> U>) -> BindData<U> {
        let func = self.func;
        BindData {
            remap_mode: self.remap_mode,
            func: Rc::new(move |key| func(key).map_shared(Rc::clone(&f))),
        }
    }
}

/// How a binding produces its continuation.
///
/// `Simple` hands out clones of one stored `BindData`; `Complex` builds a
/// fresh one each time the binding starts, for continuations that capture
/// per-run state.
pub enum BindDataStorage<T> {
    Simple(BindData<T>),
    Complex(Rc<dyn Fn() -> BindData<T>>),
}

impl<T> Clone for BindDataStorage<T> {
    fn clone(&self) -> Self {
        match self {
            BindDataStorage::Simple(data) => BindDataStorage::Simple(data.clone()),
            BindDataStorage::Complex(factory) => BindDataStorage::Complex(Rc::clone(factory)),
        }
    }
}

impl<T> fmt::Debug for BindDataStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindDataStorage::Simple(data) => f.debug_tuple("Simple").field(data).finish(),
            BindDataStorage::Complex(_) => f.write_str("Complex(..)"),
        }
    }
}

impl<T: 'static> BindDataStorage<T> {
    pub fn complex(factory: impl Fn() -> BindData<T> + 'static) -> Self {
        BindDataStorage::Complex(Rc::new(factory))
    }

    /// The continuation in its initial state.
    pub fn create_bind_data(&self) -> BindData<T> {
        match self {
            BindDataStorage::Simple(data) => data.clone(),
            BindDataStorage::Complex(factory) => factory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_chars() -> BindData<String> {
        BindData::read_char(|first| {
            BindResult::NeedMoreInput(BindData::read_char(move |second| {
                BindResult::Complete(format!("{first}{second}"))
            }))
        })
    }

    #[test]
    fn test_continuation_chain() {
        let data = two_chars();
        let BindResult::NeedMoreInput(next) = data.run(KeyInput::from_char('a')) else {
            panic!("expected more input");
        };
        match next.run(KeyInput::from_char('b')) {
            BindResult::Complete(s) => assert_eq!(s, "ab"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_escape_cancels() {
        let data = two_chars();
        assert!(matches!(data.run(KeyInput::escape()), BindResult::Cancelled));
        assert!(matches!(
            data.run(KeyInput::control('x')),
            BindResult::Error
        ));
    }

    #[test]
    fn test_map_applies_through_chain() {
        let data = two_chars().map(|s| s.len());
        let BindResult::NeedMoreInput(next) = data.run(KeyInput::from_char('x')) else {
            panic!("expected more input");
        };
        assert!(matches!(next.run(KeyInput::from_char('y')), BindResult::Complete(2)));
    }

    #[test]
    fn test_storage_creates_fresh_data() {
        let storage = BindDataStorage::complex(two_chars);
        let first = storage.create_bind_data();
        let _ = first.run(KeyInput::from_char('a'));
        // A new run starts over from the first key.
        let second = storage.create_bind_data();
        assert!(matches!(
            second.run(KeyInput::from_char('z')),
            BindResult::NeedMoreInput(_)
        ));
    }
}
