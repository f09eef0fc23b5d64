//! Register persistence between sessions.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::registers_path;
use crate::register::{OperationKind, Register, RegisterMap, RegisterName, RegisterValue};

/// Current registers file schema version.
const REGISTERS_VERSION: u32 = 1;

/// One saved register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRegister {
    /// `a`-`z` or `0`-`9`.
    pub name: char,
    pub kind: OperationKind,
    /// Block registers store their rows joined with line breaks.
    pub text: String,
}

impl SavedRegister {
    pub fn from_register(register: &Register) -> Self {
        Self {
            name: register.name.char(),
            kind: register.value.kind(),
            text: register.value.text(),
        }
    }

    /// Entries naming a register that is not persisted are dropped.
    pub fn to_register(&self) -> Option<Register> {
        let name = match RegisterName::from_char(self.name)? {
            name @ (RegisterName::Named(_) | RegisterName::Numbered(_)) => name,
            _ => return None,
        };
        let value = match self.kind {
            OperationKind::CharacterWise => RegisterValue::character_wise(self.text.as_str()),
            OperationKind::LineWise => RegisterValue::line_wise(self.text.as_str()),
            OperationKind::BlockWise => {
                RegisterValue::block(self.text.split('\n').map(str::to_string).collect())?
            }
        };
        Some(Register { name, value })
    }
}

/// The registers file format with versioning.
#[derive(Debug, Serialize, Deserialize)]
struct RegistersFile {
    version: u32,
    #[serde(default)]
    registers: Vec<SavedRegister>,
}

/// Load saved registers from the default path.
pub fn load_registers() -> Result<Vec<SavedRegister>> {
    let path = registers_path().context("Could not determine registers path")?;
    load_registers_from_path(&path)
}

/// Load saved registers from a specific path. A missing file holds none.
pub fn load_registers_from_path(path: &Path) -> Result<Vec<SavedRegister>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read registers file: {}", path.display()))?;

    let file: RegistersFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse registers file: {}", path.display()))?;

    if file.version > REGISTERS_VERSION {
        warn!(version = file.version, "registers file is from a newer version, ignoring it");
        return Ok(Vec::new());
    }

    Ok(file.registers)
}

/// Save registers to the default path.
pub fn save_registers(registers: &[SavedRegister]) -> Result<PathBuf> {
    let path = registers_path().context("Could not determine registers path")?;
    save_registers_to_path(registers, &path)?;
    Ok(path)
}

/// Save registers to a specific path.
/// Uses atomic write (temp file + rename) to prevent corruption on crash.
pub fn save_registers_to_path(registers: &[SavedRegister], path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .context("Registers path has no parent directory")?;

    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;

    let file = RegistersFile {
        version: REGISTERS_VERSION,
        registers: registers.to_vec(),
    };

    let content = serde_json::to_string_pretty(&file).context("Failed to serialize registers")?;

    let mut tmp = NamedTempFile::new_in(parent).with_context(|| {
        format!(
            "Failed to create temp registers file in: {}",
            parent.display()
        )
    })?;

    tmp.write_all(content.as_bytes())
        .context("Failed to write temp registers file")?;
    tmp.flush().context("Failed to flush temp registers file")?;

    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!("Failed to persist registers file: {}", e))?;

    debug!(path = %path.display(), count = registers.len(), "registers saved");
    Ok(())
}

/// The named and numbered registers of `map`, ready to save.
pub fn snapshot(map: &RegisterMap) -> Vec<SavedRegister> {
    map.persistent_registers()
        .iter()
        .map(SavedRegister::from_register)
        .collect()
}

/// Puts saved registers back into `map`.
pub fn restore(map: &mut RegisterMap, saved: &[SavedRegister]) {
    for register in saved.iter().filter_map(SavedRegister::to_register) {
        map.restore(register);
    }
}
