//! Configuration module for vimcore.
//!
//! Handles loading configuration from:
//! - Default values
//! - Config file (~/.config/vimcore/config.toml)
//! - The `VIMCORE_CONFIG_DIR` environment variable

mod schema;

pub use schema::{
    ClipboardBackend, ClipboardConfig, Config, EditorConfig, KeyRemap, KeymapConfig,
};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Returns the config directory path.
///
/// Checks `VIMCORE_CONFIG_DIR` environment variable first, then falls back
/// to the system default (~/.config/vimcore on Linux).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("VIMCORE_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join("vimcore"))
}

/// Returns the default config file path (~/.config/vimcore/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Returns the saved registers path (~/.config/vimcore/registers.json)
pub fn registers_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("registers.json"))
}

/// Load configuration from the default path or return defaults
pub fn load_config() -> Result<Config> {
    if let Some(path) = config_path() {
        if path.exists() {
            return load_config_from(&path);
        }
    }
    Ok(Config::default())
}

/// Load configuration from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor.shift_width, 8);
        assert!(config.editor.wrap_scan);
        assert_eq!(config.clipboard.backend, ClipboardBackend::Auto);
    }

    #[test]
    #[serial]
    fn test_config_paths() {
        let config_dir = config_dir();
        let config_path = config_path();
        let registers_path = registers_path();

        // Just verify they're consistent
        if let (Some(dir), Some(cfg), Some(regs)) = (config_dir, config_path, registers_path) {
            assert!(cfg.starts_with(&dir));
            assert!(regs.starts_with(&dir));
            assert!(cfg.ends_with("config.toml"));
            assert!(regs.ends_with("registers.json"));
        }
    }

    #[test]
    #[serial]
    fn test_config_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[editor]\nshift_width = 2\n",
        )
        .unwrap();

        let previous = std::env::var_os("VIMCORE_CONFIG_DIR");
        std::env::set_var("VIMCORE_CONFIG_DIR", dir.path());
        let loaded = load_config();
        match previous {
            Some(value) => std::env::set_var("VIMCORE_CONFIG_DIR", value),
            None => std::env::remove_var("VIMCORE_CONFIG_DIR"),
        }

        assert_eq!(loaded.unwrap().editor.shift_width, 2);
    }

    #[test]
    fn test_load_config_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[editor\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[clipboard]
unnamed = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.clipboard.unnamed);
        // Other fields should be default
        assert_eq!(config.editor.text_width, 79);
    }
}
