//! Registers: named slots holding yanked and deleted text.

mod map;
mod value;

use std::fmt;

pub use map::{Register, RegisterMap, RegisterOperation};
pub use value::{BlockData, OperationKind, RegisterValue, StringData};

/// Identifies a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterName {
    /// `"`
    Unnamed,
    /// `0` to `9`
    Numbered(u8),
    /// `a` to `z`
    Named(char),
    /// `A` to `Z`: writes append to the lowercase register. Holds the lowercase letter.
    Append(char),
    /// `-`
    SmallDelete,
    /// `+`
    Clipboard,
    /// `*`
    Selection,
    /// `_`
    BlackHole,
    /// `.`
    LastInserted,
    /// `:`
    LastCommandLine,
    /// `%`
    FileName,
    /// `/`
    LastSearch,
}

impl RegisterName {
    pub fn from_char(c: char) -> Option<Self> {
        let name = match c {
            '"' => RegisterName::Unnamed,
            '0'..='9' => RegisterName::Numbered(c as u8 - b'0'),
            'a'..='z' => RegisterName::Named(c),
            'A'..='Z' => RegisterName::Append(c.to_ascii_lowercase()),
            '-' => RegisterName::SmallDelete,
            '+' => RegisterName::Clipboard,
            '*' => RegisterName::Selection,
            '_' => RegisterName::BlackHole,
            '.' => RegisterName::LastInserted,
            ':' => RegisterName::LastCommandLine,
            '%' => RegisterName::FileName,
            '/' => RegisterName::LastSearch,
            _ => return None,
        };
        Some(name)
    }

    pub fn char(&self) -> char {
        match self {
            RegisterName::Unnamed => '"',
            RegisterName::Numbered(n) => (b'0' + n) as char,
            RegisterName::Named(c) => *c,
            RegisterName::Append(c) => c.to_ascii_uppercase(),
            RegisterName::SmallDelete => '-',
            RegisterName::Clipboard => '+',
            RegisterName::Selection => '*',
            RegisterName::BlackHole => '_',
            RegisterName::LastInserted => '.',
            RegisterName::LastCommandLine => ':',
            RegisterName::FileName => '%',
            RegisterName::LastSearch => '/',
        }
    }

    /// Registers the user cannot write directly.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            RegisterName::LastInserted
                | RegisterName::LastCommandLine
                | RegisterName::FileName
                | RegisterName::LastSearch
        )
    }

    pub fn is_append(&self) -> bool {
        matches!(self, RegisterName::Append(_))
    }

    pub fn is_clipboard(&self) -> bool {
        matches!(self, RegisterName::Clipboard | RegisterName::Selection)
    }

    /// The register that actually stores the text; `A` stores into `a`.
    pub fn storage(&self) -> RegisterName {
        match self {
            RegisterName::Append(c) => RegisterName::Named(*c),
            other => *other,
        }
    }

    /// Every readable register in `:reg` listing order.
    pub fn all() -> impl Iterator<Item = RegisterName> {
        let specials = [RegisterName::Unnamed];
        let numbered = (0..10).map(RegisterName::Numbered);
        let named = ('a'..='z').map(RegisterName::Named);
        let rest = [
            RegisterName::SmallDelete,
            RegisterName::Selection,
            RegisterName::Clipboard,
            RegisterName::LastInserted,
            RegisterName::LastCommandLine,
            RegisterName::FileName,
            RegisterName::LastSearch,
        ];
        specials.into_iter().chain(numbered).chain(named).chain(rest)
    }
}

impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_name_from_char() {
        assert_eq!(RegisterName::from_char('a'), Some(RegisterName::Named('a')));
        assert_eq!(RegisterName::from_char('A'), Some(RegisterName::Append('a')));
        assert_eq!(RegisterName::from_char('7'), Some(RegisterName::Numbered(7)));
        assert_eq!(RegisterName::from_char('"'), Some(RegisterName::Unnamed));
        assert_eq!(RegisterName::from_char('_'), Some(RegisterName::BlackHole));
        assert_eq!(RegisterName::from_char('!'), None);
    }

    #[test]
    fn test_register_name_display_round_trips() {
        for name in RegisterName::all() {
            assert_eq!(RegisterName::from_char(name.char()), Some(name));
        }
        assert_eq!(RegisterName::Append('q').to_string(), "Q");
        assert_eq!(RegisterName::Append('q').storage(), RegisterName::Named('q'));
    }

    #[test]
    fn test_read_only_registers() {
        assert!(RegisterName::LastInserted.is_read_only());
        assert!(RegisterName::FileName.is_read_only());
        assert!(!RegisterName::Named('a').is_read_only());
        assert!(!RegisterName::Clipboard.is_read_only());
    }
}
