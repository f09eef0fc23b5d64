//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::binding::KeyRemapMode;
use crate::host::SearchOptions;
use crate::key::{parse_key, parse_keys, KeyInput};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    /// Editing behavior
    pub editor: EditorConfig,
    /// Clipboard bridging
    pub clipboard: ClipboardConfig,
    /// Key remaps
    pub keymap: KeymapConfig,
}

/// Editor-related settings, named after the Vim options they mirror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Columns per indent level for `<` and `>`
    pub shift_width: usize,
    /// Display width of a tab character
    pub tab_stop: usize,
    /// Insert spaces for `<Tab>` and when shifting
    pub expand_tab: bool,
    /// Line width used by `gq`
    pub text_width: usize,
    /// Case-insensitive search
    pub ignore_case: bool,
    /// With `ignore_case`, an uppercase letter makes the search case-sensitive
    pub smart_case: bool,
    /// Searches wrap around the end of the buffer
    pub wrap_scan: bool,
    /// Extra characters that count as word characters
    pub iskeyword: String,
    /// Maximum nesting of macros running macros
    pub max_macro_depth: usize,
    /// Save named and numbered registers between sessions
    pub persist_registers: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            shift_width: 8,
            tab_stop: 8,
            expand_tab: false,
            text_width: 79,
            ignore_case: false,
            smart_case: false,
            wrap_scan: true,
            iskeyword: "_".to_string(),
            max_macro_depth: 100,
            persist_registers: false,
        }
    }
}

impl EditorConfig {
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            ignore_case: self.ignore_case,
            smart_case: self.smart_case,
            wrap: self.wrap_scan,
        }
    }

    /// The text inserted for one level of indent.
    pub fn indent_unit(&self) -> String {
        if self.expand_tab || self.tab_stop == 0 {
            " ".repeat(self.shift_width)
        } else if self.shift_width % self.tab_stop == 0 {
            "\t".repeat(self.shift_width / self.tab_stop)
        } else {
            " ".repeat(self.shift_width)
        }
    }
}

/// Which clipboard backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardBackend {
    /// wl-copy on Wayland when available, arboard otherwise
    #[default]
    Auto,
    Arboard,
    WlCopy,
    Disabled,
}

/// Clipboard settings for the `+` and `*` registers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClipboardConfig {
    pub backend: ClipboardBackend,
    /// Command used instead of `wl-copy`
    pub wl_copy_cmd: Option<String>,
    /// Command used instead of `wl-paste`
    pub wl_paste_cmd: Option<String>,
    /// Unnamed register reads and writes also use the clipboard
    pub unnamed: bool,
}

/// Keymap customization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeymapConfig {
    /// Remaps for normal mode
    pub normal: Vec<KeyRemap>,
    /// Remaps for visual mode
    pub visual: Vec<KeyRemap>,
    /// Remaps for insert mode
    pub insert: Vec<KeyRemap>,
}

impl KeymapConfig {
    /// Parsed remaps for one mode. Entries whose `key` is not exactly one
    /// key are skipped with a warning.
    pub fn remaps(&self, mode: KeyRemapMode) -> Vec<(KeyInput, Vec<KeyInput>)> {
        let entries = match mode {
            KeyRemapMode::Normal => &self.normal,
            KeyRemapMode::Visual => &self.visual,
            KeyRemapMode::Insert => &self.insert,
            _ => return Vec::new(),
        };
        entries
            .iter()
            .filter_map(|remap| match remap.parse() {
                Some(parsed) => Some(parsed),
                None => {
                    warn!(key = %remap.key, ?mode, "ignoring remap: key must be a single key");
                    None
                }
            })
            .collect()
    }
}

/// A non-recursive remap: typing `key` acts as typing `to`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRemap {
    /// One key in notation form (e.g. "Y", "<C-s>")
    pub key: String,
    /// Key sequence in notation form
    pub to: String,
    /// Optional description for help display
    pub description: Option<String>,
}

impl KeyRemap {
    pub fn parse(&self) -> Option<(KeyInput, Vec<KeyInput>)> {
        let key = parse_key(&self.key)?;
        Some((key, parse_keys(&self.to)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[editor]
shift_width = 4
expand_tab = true
text_width = 60
ignore_case = true
iskeyword = "_-"

[clipboard]
backend = "wl_copy"
wl_copy_cmd = "/usr/local/bin/wl-copy"
unnamed = true

[[keymap.normal]]
key = "Y"
to = "y$"
description = "Yank to end of line"

[[keymap.insert]]
key = "<C-s>"
to = "<Esc>"
"#;

        let config: Config = toml::from_str(toml).unwrap();

        // Editor
        assert_eq!(config.editor.shift_width, 4);
        assert!(config.editor.expand_tab);
        assert_eq!(config.editor.text_width, 60);
        assert!(config.editor.search_options().ignore_case);
        assert_eq!(config.editor.iskeyword, "_-");
        assert_eq!(config.editor.max_macro_depth, 100);

        // Clipboard
        assert_eq!(config.clipboard.backend, ClipboardBackend::WlCopy);
        assert_eq!(
            config.clipboard.wl_copy_cmd.as_deref(),
            Some("/usr/local/bin/wl-copy")
        );
        assert!(config.clipboard.unnamed);

        // Keymap
        assert_eq!(config.keymap.normal.len(), 1);
        assert_eq!(config.keymap.normal[0].to, "y$");
        let remaps = config.keymap.remaps(KeyRemapMode::Insert);
        assert_eq!(remaps, vec![(KeyInput::control('s'), vec![KeyInput::escape()])]);
        assert!(config.keymap.remaps(KeyRemapMode::OperatorPending).is_empty());
    }

    #[test]
    fn test_invalid_remap_is_skipped() {
        let keymap = KeymapConfig {
            normal: vec![KeyRemap {
                key: "gx".to_string(),
                to: "x".to_string(),
                description: None,
            }],
            ..KeymapConfig::default()
        };
        assert!(keymap.remaps(KeyRemapMode::Normal).is_empty());
    }

    #[test]
    fn test_indent_unit() {
        let mut editor = EditorConfig::default();
        assert_eq!(editor.indent_unit(), "\t");
        editor.shift_width = 4;
        assert_eq!(editor.indent_unit(), "    ");
        editor.shift_width = 8;
        editor.expand_tab = true;
        assert_eq!(editor.indent_unit(), "        ");
    }

    #[test]
    fn test_serialize_config() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[editor]"));
        assert!(toml_str.contains("[clipboard]"));
        assert!(toml_str.contains("backend = \"auto\""));
    }
}
