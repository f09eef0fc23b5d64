//! Ordered key sequences used as command names.

use std::fmt;
use std::str::FromStr;

use super::input::KeyInput;
use super::notation;

/// An ordered sequence of [`KeyInput`] values, e.g. the name `dw`.
///
/// Bindings are always named by a non-empty set; the empty set only shows up
/// as the starting point while keys are accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyInputSet(Vec<KeyInput>);

impl KeyInputSet {
    pub fn new(keys: Vec<KeyInput>) -> Self {
        Self(keys)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn one(key: KeyInput) -> Self {
        Self(vec![key])
    }

    /// Builds a set from plain characters, without interpreting notation.
    pub fn from_chars(s: &str) -> Self {
        Self(s.chars().map(KeyInput::from_char).collect())
    }

    /// Builds a set from Vim key notation (`"<C-v>"`, `"g~"`).
    pub fn from_notation(s: &str) -> Self {
        Self(notation::parse_keys(s))
    }

    pub fn keys(&self) -> &[KeyInput] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&KeyInput> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&KeyInput> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyInput> {
        self.0.iter()
    }

    /// Returns true if `prefix` is a (not necessarily strict) prefix of this set.
    pub fn starts_with(&self, prefix: &KeyInputSet) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Returns a new set with `key` appended.
    pub fn add(&self, key: KeyInput) -> Self {
        let mut keys = self.0.clone();
        keys.push(key);
        Self(keys)
    }

    pub fn push(&mut self, key: KeyInput) {
        self.0.push(key);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<KeyInput> for KeyInputSet {
    fn from(key: KeyInput) -> Self {
        Self::one(key)
    }
}

impl From<Vec<KeyInput>> for KeyInputSet {
    fn from(keys: Vec<KeyInput>) -> Self {
        Self(keys)
    }
}

impl FromStr for KeyInputSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_notation(s))
    }
}

impl<'a> IntoIterator for &'a KeyInputSet {
    type Item = &'a KeyInput;
    type IntoIter = std::slice::Iter<'a, KeyInput>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for KeyInputSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&notation::keys_to_notation(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with() {
        let dw = KeyInputSet::from_chars("dw");
        assert!(dw.starts_with(&KeyInputSet::from_chars("d")));
        assert!(dw.starts_with(&dw));
        assert!(dw.starts_with(&KeyInputSet::empty()));
        assert!(!dw.starts_with(&KeyInputSet::from_chars("dd")));
        assert!(!KeyInputSet::from_chars("d").starts_with(&dw));
    }

    #[test]
    fn test_equality_is_sequence_equality() {
        assert_eq!(KeyInputSet::from_chars("gg"), "gg".parse().unwrap());
        assert_ne!(KeyInputSet::from_chars("ab"), KeyInputSet::from_chars("ba"));
    }

    #[test]
    fn test_add_and_display() {
        let set = KeyInputSet::from_chars("g").add(KeyInput::control('v'));
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "g<C-v>");
    }
}
