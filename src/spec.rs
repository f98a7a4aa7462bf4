//! Instruction table entries and the JSON loader.
//!
//! The loader accepts the `instr_dict.json` layout produced by riscv-opcodes:
//! an object keyed by instruction name, each entry carrying `mask`, `match`
//! and `variable_fields`. Object order is definition order.

use std::path::Path;

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GenConfig;
use crate::error::{CompileError, LoadError};
use crate::Word;

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecFlags: u8 {
const CONTROL_TRANSFER = 1 << 0; // branches, jumps, environment calls
}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionSpec {
    name: String,
    mask: Word,
    matched: Word,
    fields: Vec<String>,
    flags: SpecFlags,
    extensions: Vec<String>,
}

impl InstructionSpec {
    /// Fails with `MatchMaskInconsistency` if `matched` sets bits the mask ignores.
    pub fn new(
        name: impl Into<String>,
        mask: Word,
        matched: Word,
        fields: impl IntoIterator<Item = impl Into<String>>,
        flags: SpecFlags,
    ) -> Result<Self, CompileError> {
        let name = name.into();
        if matched & !mask != 0 {
            return Err(CompileError::MatchMaskInconsistency { instruction: name, mask, matched });
        }
        Ok(Self {
            name,
            mask,
            matched,
            fields: fields.into_iter().map(Into::into).collect(),
            flags,
            extensions: Vec::new(),
        })
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mask(&self) -> Word {
        self.mask
    }

    pub fn matched(&self) -> Word {
        self.matched
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn flags(&self) -> SpecFlags {
        self.flags
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_control_transfer(&self) -> bool {
        self.flags.contains(SpecFlags::CONTROL_TRANSFER)
    }

    #[inline]
    pub fn matches(&self, word: Word) -> bool {
        word & self.mask == self.matched
    }
}

/// One entry as it appears in `instr_dict.json`.
#[derive(Debug, Clone, Deserialize)]
struct RawSpec {
    mask: String,
    #[serde(rename = "match")]
    matched: String,
    #[serde(default)]
    variable_fields: Vec<String>,
    #[serde(default)]
    extension: Vec<String>,
    #[serde(default)]
    control_transfer: Option<bool>,
}

/// Parse `0x`/`0b`/`0o` prefixed or plain decimal literals, allowing `_`.
pub fn parse_word(literal: &str) -> Option<Word> {
    let t: String = literal.trim().chars().filter(|&c| c != '_').collect();
    let (digits, radix) = if let Some(h) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        (h, 16)
    } else if let Some(b) = t.strip_prefix("0b").or_else(|| t.strip_prefix("0B")) {
        (b, 2)
    } else if let Some(o) = t.strip_prefix("0o") {
        (o, 8)
    } else {
        (t.as_str(), 10)
    };
    if digits.is_empty() {
        return None;
    }
    Word::from_str_radix(digits, radix).ok()
}

/// Parse an instruction table from JSON text.
pub fn parse_specs(json: &str, cfg: &GenConfig) -> Result<Vec<InstructionSpec>, LoadError> {
    let raw: IndexMap<String, RawSpec> = serde_json::from_str(json)?;
    let mut out = Vec::with_capacity(raw.len());
    for (name, r) in raw {
        let mask = parse_word(&r.mask).ok_or_else(|| LoadError::BadNumber {
            instruction: name.clone(),
            what: "mask",
            literal: r.mask.clone(),
        })?;
        let matched = parse_word(&r.matched).ok_or_else(|| LoadError::BadNumber {
            instruction: name.clone(),
            what: "match",
            literal: r.matched.clone(),
        })?;
        let transfer = r
            .control_transfer
            .unwrap_or_else(|| cfg.control_transfer.iter().any(|m| m == &name));
        let flags = if transfer { SpecFlags::CONTROL_TRANSFER } else { SpecFlags::empty() };
        let spec = InstructionSpec::new(name, mask, matched, r.variable_fields, flags)?
            .with_extensions(r.extension);
        debug!("loaded `{}` mask={:#010x} match={:#010x}", spec.name(), mask, matched);
        out.push(spec);
    }
    Ok(out)
}

pub fn load_specs(path: &Path, cfg: &GenConfig) -> Result<Vec<InstructionSpec>, LoadError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    parse_specs(&text, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_word_radixes() {
        assert_eq!(parse_word("0xfe00707f"), Some(0xFE00_707F));
        assert_eq!(parse_word("0b1010"), Some(10));
        assert_eq!(parse_word("51"), Some(51));
        assert_eq!(parse_word("0x_ffff_ffff"), Some(Word::MAX));
        assert_eq!(parse_word("0x1_0000_0000"), None);
        assert_eq!(parse_word("0x"), None);
        assert_eq!(parse_word("zz"), None);
    }

    #[test]
    fn match_outside_mask_is_rejected() {
        let err = InstructionSpec::new("bad", 0x7F, 0x1033, ["rd"], SpecFlags::empty()).unwrap_err();
        assert_eq!(
            err,
            CompileError::MatchMaskInconsistency { instruction: "bad".into(), mask: 0x7F, matched: 0x1033 }
        );
    }

    #[test]
    fn loader_keeps_order_and_flags() {
        let json = r#"{
            "jal":  { "mask": "0x7f", "match": "0x6f", "variable_fields": ["rd", "jimm20"] },
            "addi": { "mask": "0x707f", "match": "0x13", "variable_fields": ["rd", "rs1", "imm12"],
                      "extension": ["rv_i"] },
            "mret": { "mask": "0xffffffff", "match": "0x30200073", "control_transfer": true }
        }"#;
        let specs = parse_specs(json, &GenConfig::default()).unwrap();
        let names: Vec<_> = specs.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["jal", "addi", "mret"]);
        assert!(specs[0].is_control_transfer());
        assert!(!specs[1].is_control_transfer());
        assert!(specs[2].is_control_transfer());
        assert_eq!(specs[1].extensions(), ["rv_i"]);
        assert!(specs[2].fields().is_empty());
    }

    #[test]
    fn loader_reports_bad_literals() {
        let json = r#"{ "x": { "mask": "0xzz", "match": "0x0" } }"#;
        let err = parse_specs(json, &GenConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::BadNumber { what: "mask", .. }));

        let json = r#"{ "x": { "mask": "0x7f", "match": "0xff" } }"#;
        let err = parse_specs(json, &GenConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Compile(CompileError::MatchMaskInconsistency { .. })));
    }
}
