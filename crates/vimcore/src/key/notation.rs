//! Vim key notation (`<Esc>`, `<C-r>`, `<lt>`).
//!
//! Parsing never fails: an angle-bracket group that is not a known key name
//! is taken literally, character by character, the way Vim reads mappings.

use super::input::{KeyInput, KeyModifiers, VimKey};

/// Parses a single key written in notation form, e.g. `"x"`, `"<Esc>"` or
/// `"<C-w>"`. Returns `None` unless the string describes exactly one key.
pub fn parse_key(s: &str) -> Option<KeyInput> {
    let keys = parse_keys(s);
    match keys.as_slice() {
        [key] => Some(*key),
        _ => None,
    }
}

/// Parses a key sequence written in notation form.
pub fn parse_keys(s: &str) -> Vec<KeyInput> {
    let chars: Vec<char> = s.chars().collect();
    let mut keys = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '<' {
            if let Some(close) = chars[i + 1..].iter().position(|&c| c == '>') {
                let inner: String = chars[i + 1..i + 1 + close].iter().collect();
                if let Some(key) = parse_bracketed(&inner) {
                    keys.push(key);
                    i += close + 2;
                    continue;
                }
            }
        }
        keys.push(KeyInput::from_char(chars[i]));
        i += 1;
    }

    keys
}

/// Parses the contents of a `<...>` group.
fn parse_bracketed(inner: &str) -> Option<KeyInput> {
    let mut modifiers = KeyModifiers::empty();
    let mut rest = inner;

    // Modifier prefixes: "C-", "S-", "A-", "M-". A lone "-" after them is the key.
    while rest.len() > 2 && rest.as_bytes()[1] == b'-' {
        match rest.as_bytes()[0].to_ascii_lowercase() {
            b'c' => modifiers |= KeyModifiers::CONTROL,
            b's' => modifiers |= KeyModifiers::SHIFT,
            b'a' | b'm' => modifiers |= KeyModifiers::ALT,
            _ => return None,
        }
        rest = &rest[2..];
    }

    let lower = rest.to_ascii_lowercase();
    let base = match lower.as_str() {
        "esc" | "escape" => KeyInput::escape(),
        "cr" | "enter" | "return" | "nl" => KeyInput::enter(),
        "bs" | "backspace" => KeyInput::back(),
        "tab" => KeyInput::tab(),
        "del" | "delete" => KeyInput::special(VimKey::Delete),
        "space" => KeyInput::from_char(' '),
        "lt" => KeyInput::from_char('<'),
        "gt" => KeyInput::from_char('>'),
        "bar" => KeyInput::from_char('|'),
        "bslash" => KeyInput::from_char('\\'),
        "left" => KeyInput::special(VimKey::Left),
        "right" => KeyInput::special(VimKey::Right),
        "up" => KeyInput::special(VimKey::Up),
        "down" => KeyInput::special(VimKey::Down),
        "home" => KeyInput::special(VimKey::Home),
        "end" => KeyInput::special(VimKey::End),
        "pageup" | "pgup" => KeyInput::special(VimKey::PageUp),
        "pagedown" | "pgdn" => KeyInput::special(VimKey::PageDown),
        "insert" | "ins" => KeyInput::special(VimKey::Insert),
        f if f.len() >= 2 && f.starts_with('f') => {
            let n: u8 = f[1..].parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            KeyInput::special(VimKey::Function(n))
        }
        _ => {
            let mut chars = rest.chars();
            let c = chars.next()?;
            if chars.next().is_some() || modifiers.is_empty() {
                return None;
            }
            return Some(char_with_modifiers(c, modifiers));
        }
    };

    if modifiers.is_empty() {
        Some(base)
    } else if base.key() == VimKey::RawCharacter {
        let c = base.literal()?;
        Some(char_with_modifiers(c, modifiers))
    } else {
        Some(base.with_modifiers(modifiers))
    }
}

fn char_with_modifiers(c: char, modifiers: KeyModifiers) -> KeyInput {
    // Shift folds into the character for printable keys.
    let c = if modifiers.contains(KeyModifiers::SHIFT) {
        c.to_ascii_uppercase()
    } else {
        c
    };
    let rest = modifiers - KeyModifiers::SHIFT;
    if rest.contains(KeyModifiers::CONTROL) {
        KeyInput::control(c).with_modifiers(rest - KeyModifiers::CONTROL)
    } else if rest.is_empty() {
        KeyInput::from_char(c)
    } else {
        KeyInput::from_char(c).with_modifiers(rest)
    }
}

/// Renders a key in notation form. `parse_key(&key_to_notation(k)) == Some(k)`
/// for every key the parser can produce.
pub fn key_to_notation(key: &KeyInput) -> String {
    let mods = key.modifiers();
    let mut prefix = String::new();
    if mods.contains(KeyModifiers::CONTROL) {
        prefix.push_str("C-");
    }
    if mods.contains(KeyModifiers::SHIFT) {
        prefix.push_str("S-");
    }
    if mods.contains(KeyModifiers::ALT) {
        prefix.push_str("A-");
    }

    let name = match key.key() {
        VimKey::RawCharacter => {
            let c = key.literal().unwrap_or('?');
            if prefix.is_empty() {
                return match c {
                    '<' => "<lt>".to_string(),
                    c => c.to_string(),
                };
            }
            match c {
                '<' => "lt".to_string(),
                ' ' => "Space".to_string(),
                c => c.to_string(),
            }
        }
        VimKey::Escape => "Esc".to_string(),
        VimKey::Enter => "CR".to_string(),
        VimKey::Back => "BS".to_string(),
        VimKey::Delete => "Del".to_string(),
        VimKey::Tab => "Tab".to_string(),
        VimKey::Left => "Left".to_string(),
        VimKey::Right => "Right".to_string(),
        VimKey::Up => "Up".to_string(),
        VimKey::Down => "Down".to_string(),
        VimKey::Home => "Home".to_string(),
        VimKey::End => "End".to_string(),
        VimKey::PageUp => "PageUp".to_string(),
        VimKey::PageDown => "PageDown".to_string(),
        VimKey::Insert => "Insert".to_string(),
        VimKey::Function(n) => format!("F{n}"),
    };

    format!("<{prefix}{name}>")
}

/// Renders a key sequence in notation form.
pub fn keys_to_notation<'a>(keys: impl IntoIterator<Item = &'a KeyInput>) -> String {
    keys.into_iter().map(key_to_notation).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_keys() {
        let keys = parse_keys("d2w");
        assert_eq!(
            keys,
            vec![
                KeyInput::from_char('d'),
                KeyInput::from_char('2'),
                KeyInput::from_char('w'),
            ]
        );
    }

    #[test]
    fn test_parse_special_keys() {
        assert_eq!(parse_key("<Esc>"), Some(KeyInput::escape()));
        assert_eq!(parse_key("<esc>"), Some(KeyInput::escape()));
        assert_eq!(parse_key("<CR>"), Some(KeyInput::enter()));
        assert_eq!(parse_key("<BS>"), Some(KeyInput::back()));
        assert_eq!(parse_key("<Space>"), Some(KeyInput::from_char(' ')));
        assert_eq!(parse_key("<lt>"), Some(KeyInput::from_char('<')));
        assert_eq!(
            parse_key("<F5>"),
            Some(KeyInput::special(VimKey::Function(5)))
        );
    }

    #[test]
    fn test_parse_modifiers() {
        assert_eq!(parse_key("<C-r>"), Some(KeyInput::control('r')));
        assert_eq!(parse_key("<c-R>"), Some(KeyInput::control('r')));
        assert_eq!(parse_key("<S-a>"), Some(KeyInput::from_char('A')));
        assert_eq!(parse_key("<A-x>"), Some(KeyInput::alt('x')));
        assert_eq!(
            parse_key("<S-Left>"),
            Some(KeyInput::special(VimKey::Left).with_modifiers(KeyModifiers::SHIFT))
        );
    }

    #[test]
    fn test_unknown_group_is_literal() {
        let keys = parse_keys("<foo>");
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[0], KeyInput::from_char('<'));
        assert_eq!(keys[4], KeyInput::from_char('>'));

        // An unterminated bracket is a literal '<'.
        assert_eq!(parse_keys("a<b"), parse_keys("a<lt>b"));
    }

    #[test]
    fn test_parse_key_requires_single_key() {
        assert_eq!(parse_key("ab"), None);
        assert_eq!(parse_key(""), None);
    }

    #[test]
    fn test_notation_round_trips() {
        let source = "ifoo<lt>bar<CR><Esc>2\"ayw<C-r><S-Left><Tab><BS><F12>";
        let keys = parse_keys(source);
        let rendered = keys_to_notation(&keys);
        assert_eq!(parse_keys(&rendered), keys);
        assert_eq!(rendered, source);
    }
}
