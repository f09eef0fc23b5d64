//! Logical key inputs.

use std::fmt;

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use super::notation;

bitflags! {
    /// Modifier keys held while a key was pressed.
    ///
    /// Shift is folded into the character for printable keys (`A` rather than
    /// `Shift+a`) and only appears on special keys such as `<S-Left>`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 0b001;
        const CONTROL = 0b010;
        const ALT = 0b100;
    }
}

/// The key code part of a [`KeyInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VimKey {
    /// A key identified by its literal character.
    RawCharacter,
    Escape,
    Enter,
    Back,
    Delete,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Function(u8),
}

/// One logical keystroke.
///
/// Equality and hashing are structural over all three fields, so a
/// `KeyInput` can be used directly as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyInput {
    key: VimKey,
    modifiers: KeyModifiers,
    literal: Option<char>,
}

impl KeyInput {
    pub const fn new(key: VimKey, modifiers: KeyModifiers, literal: Option<char>) -> Self {
        Self {
            key,
            modifiers,
            literal,
        }
    }

    /// Builds the key input a character would produce when typed.
    ///
    /// Control characters that have a dedicated key (escape, return, tab,
    /// backspace) map onto that key.
    pub fn from_char(c: char) -> Self {
        match c {
            '\u{1b}' => Self::escape(),
            '\r' | '\n' => Self::enter(),
            '\t' => Self::tab(),
            '\u{8}' => Self::back(),
            _ => Self::new(VimKey::RawCharacter, KeyModifiers::empty(), Some(c)),
        }
    }

    /// `<C-c>` style input. The letter is normalized to lowercase.
    pub fn control(c: char) -> Self {
        Self::new(
            VimKey::RawCharacter,
            KeyModifiers::CONTROL,
            Some(c.to_ascii_lowercase()),
        )
    }

    pub fn alt(c: char) -> Self {
        Self::new(VimKey::RawCharacter, KeyModifiers::ALT, Some(c))
    }

    pub const fn escape() -> Self {
        Self::new(VimKey::Escape, KeyModifiers::empty(), Some('\u{1b}'))
    }

    pub const fn enter() -> Self {
        Self::new(VimKey::Enter, KeyModifiers::empty(), Some('\r'))
    }

    pub const fn tab() -> Self {
        Self::new(VimKey::Tab, KeyModifiers::empty(), Some('\t'))
    }

    pub const fn back() -> Self {
        Self::new(VimKey::Back, KeyModifiers::empty(), Some('\u{8}'))
    }

    /// A special key with no literal character.
    pub const fn special(key: VimKey) -> Self {
        Self::new(key, KeyModifiers::empty(), None)
    }

    pub fn with_modifiers(self, modifiers: KeyModifiers) -> Self {
        Self {
            modifiers: self.modifiers | modifiers,
            ..self
        }
    }

    pub fn key(&self) -> VimKey {
        self.key
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    pub fn literal(&self) -> Option<char> {
        self.literal
    }

    /// The character this key types, if it is an unmodified printable key.
    pub fn printable_char(&self) -> Option<char> {
        if self.key != VimKey::RawCharacter
            || self
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        self.literal.filter(|c| !c.is_control())
    }

    /// The decimal value of an unmodified digit key.
    pub fn digit(&self) -> Option<u32> {
        self.printable_char().and_then(|c| c.to_digit(10))
    }

    pub fn is_escape(&self) -> bool {
        self.key == VimKey::Escape
    }

    /// Translates a terminal key event. Release events yield `None`.
    pub fn from_key_event(event: KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        let mods = event.modifiers;
        let mut modifiers = KeyModifiers::empty();
        if mods.contains(crossterm::event::KeyModifiers::CONTROL) {
            modifiers |= KeyModifiers::CONTROL;
        }
        if mods.contains(crossterm::event::KeyModifiers::ALT) {
            modifiers |= KeyModifiers::ALT;
        }
        let shift = mods.contains(crossterm::event::KeyModifiers::SHIFT);

        let input = match event.code {
            KeyCode::Char(c) => {
                if modifiers.contains(KeyModifiers::CONTROL) {
                    Self::control(c).with_modifiers(modifiers - KeyModifiers::CONTROL)
                } else {
                    Self::from_char(c).with_modifiers(modifiers)
                }
            }
            KeyCode::Esc => Self::escape().with_modifiers(modifiers),
            KeyCode::Enter => Self::enter().with_modifiers(modifiers),
            KeyCode::Tab => Self::tab().with_modifiers(modifiers),
            KeyCode::BackTab => Self::tab().with_modifiers(modifiers | KeyModifiers::SHIFT),
            KeyCode::Backspace => Self::back().with_modifiers(modifiers),
            special => {
                let key = match special {
                    KeyCode::Delete => VimKey::Delete,
                    KeyCode::Left => VimKey::Left,
                    KeyCode::Right => VimKey::Right,
                    KeyCode::Up => VimKey::Up,
                    KeyCode::Down => VimKey::Down,
                    KeyCode::Home => VimKey::Home,
                    KeyCode::End => VimKey::End,
                    KeyCode::PageUp => VimKey::PageUp,
                    KeyCode::PageDown => VimKey::PageDown,
                    KeyCode::Insert => VimKey::Insert,
                    KeyCode::F(n) => VimKey::Function(n),
                    _ => return None,
                };
                let modifiers = if shift {
                    modifiers | KeyModifiers::SHIFT
                } else {
                    modifiers
                };
                Self::special(key).with_modifiers(modifiers)
            }
        };
        Some(input)
    }
}

impl From<char> for KeyInput {
    fn from(c: char) -> Self {
        Self::from_char(c)
    }
}

impl fmt::Display for KeyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&notation::key_to_notation(self))
    }
}
