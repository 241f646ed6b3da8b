//! Named signature definitions loaded from configuration or JSON files

use super::{MemoryPattern, Modifier};
use crate::core::types::MemoryResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A signature as written in a configuration or signature file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureDefinition {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl SignatureDefinition {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        SignatureDefinition {
            name: name.into(),
            pattern: pattern.into(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Parses the pattern text into a scannable [`MemoryPattern`]
    pub fn compile(&self) -> MemoryResult<MemoryPattern> {
        MemoryPattern::new(self.name.clone(), &self.pattern, self.modifiers.iter().copied())
    }
}

/// A collection of signatures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    #[serde(default)]
    pub signatures: Vec<SignatureDefinition>,
}

impl SignatureSet {
    pub fn from_json(content: &str) -> MemoryResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> MemoryResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> MemoryResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Finds a signature by name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&SignatureDefinition> {
        self.signatures
            .iter()
            .find(|signature| signature.name.eq_ignore_ascii_case(name))
    }

    /// Compiles every signature, failing on the first malformed pattern
    pub fn compile(&self) -> MemoryResult<Vec<MemoryPattern>> {
        self.signatures
            .iter()
            .map(SignatureDefinition::compile)
            .collect()
    }
}
