use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Dispatch shape used by the runtime decoders and the emitted source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Test every mask/match pair in order.
    Ordered,
    /// One table lookup per mask group.
    #[default]
    Hashed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Mnemonics flagged as control transfers when the table does not say.
    pub control_transfer: Vec<String>,
    pub strategy: Strategy,
    /// Reject tables where two mask groups can match the same word.
    pub strict_overlaps: bool,
    /// Namespace of the emitted C++ code.
    pub cpp_namespace: String,
    /// Random words checked for strategy equivalence before emitting.
    pub sample_words: usize,
    pub seed: u64,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            control_transfer: ["beq", "bne", "bge", "bgeu", "blt", "bltu", "jal", "jalr", "ecall"]
                .into_iter()
                .map(String::from)
                .collect(),
            strategy: Strategy::Hashed,
            strict_overlaps: false,
            cpp_namespace: "sim".to_string(),
            sample_words: 1 << 16,
            seed: 0x5EED,
        }
    }
}

impl GenConfig {
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&text)
    }
}
