//! Register payloads.

use serde::{Deserialize, Serialize};

use crate::key::{keys_to_notation, parse_keys, KeyInput};

/// Shape of a yanked or deleted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CharacterWise,
    LineWise,
    BlockWise,
}

/// One line per row of a block selection. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockData(Vec<String>);

impl BlockData {
    pub fn new(lines: Vec<String>) -> Option<Self> {
        if lines.is_empty() {
            None
        } else {
            Some(Self(lines))
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }
}

/// Text held by a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringData {
    Simple(String),
    Block(BlockData),
}

impl StringData {
    /// Flat string form; block rows are joined with line breaks.
    pub fn string(&self) -> String {
        match self {
            StringData::Simple(s) => s.clone(),
            StringData::Block(block) => block.lines().join("\n"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            StringData::Simple(s) => s.is_empty(),
            StringData::Block(_) => false,
        }
    }

    fn lines(&self) -> Vec<String> {
        match self {
            StringData::Simple(s) => s
                .strip_suffix('\n')
                .unwrap_or(s)
                .split('\n')
                .map(str::to_string)
                .collect(),
            StringData::Block(block) => block.lines().to_vec(),
        }
    }
}

impl Default for StringData {
    fn default() -> Self {
        StringData::Simple(String::new())
    }
}

/// Register contents plus the shape they were captured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterValue {
    data: StringData,
    kind: OperationKind,
}

impl Default for RegisterValue {
    fn default() -> Self {
        Self::character_wise("")
    }
}

impl RegisterValue {
    /// Block data is always block-wise regardless of `kind`.
    pub fn new(data: StringData, kind: OperationKind) -> Self {
        let kind = match data {
            StringData::Block(_) => OperationKind::BlockWise,
            StringData::Simple(_) if kind == OperationKind::BlockWise => {
                OperationKind::CharacterWise
            }
            StringData::Simple(_) => kind,
        };
        Self { data, kind }
    }

    pub fn character_wise(text: impl Into<String>) -> Self {
        Self::new(StringData::Simple(text.into()), OperationKind::CharacterWise)
    }

    /// Line-wise text always ends with a line break.
    pub fn line_wise(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Self::new(StringData::Simple(text), OperationKind::LineWise)
    }

    /// Returns `None` for an empty row list.
    pub fn block(lines: Vec<String>) -> Option<Self> {
        BlockData::new(lines).map(|block| Self::new(StringData::Block(block), OperationKind::BlockWise))
    }

    /// Stores a recorded key sequence as its notation text.
    pub fn from_keys(keys: &[KeyInput]) -> Self {
        Self::character_wise(keys_to_notation(keys))
    }

    pub fn data(&self) -> &StringData {
        &self.data
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn text(&self) -> String {
        self.data.string()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Interprets the contents as keys, the way `@x` replays them.
    pub fn to_keys(&self) -> Vec<KeyInput> {
        parse_keys(&self.text())
    }

    /// Whether the value covers more than one line, used by the small-delete rule.
    pub fn spans_lines(&self) -> bool {
        match (&self.data, self.kind) {
            (_, OperationKind::LineWise) => true,
            (StringData::Simple(s), _) => s.contains('\n'),
            (StringData::Block(block), _) => block.lines().len() > 1,
        }
    }

    /// Value produced by appending `other` (`"Ayw`).
    ///
    /// If either side is line-wise the result is line-wise and each part keeps
    /// its own lines.
    pub fn append(&self, other: &RegisterValue) -> RegisterValue {
        if self.is_empty() {
            return other.clone();
        }

        if self.kind == OperationKind::LineWise || other.kind == OperationKind::LineWise {
            let mut text = self.text();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&other.text());
            return RegisterValue::line_wise(text);
        }

        if self.kind == OperationKind::BlockWise || other.kind == OperationKind::BlockWise {
            let mut lines = self.data.lines();
            lines.extend(other.data.lines());
            return RegisterValue::block(lines).unwrap_or_default();
        }

        RegisterValue::character_wise(self.text() + &other.text())
    }
}
