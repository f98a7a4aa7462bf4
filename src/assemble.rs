//! Decoder assembly: compiled rules plus mask groups form a [`DecoderPlan`].
//!
//! The plan is pure data. Two runtime interpreters read it:
//! [`TableDecoder`] (one hashed lookup per mask group) and
//! [`OrderedDecoder`] (every mask/match pair tested in turn). Both walk the
//! groups in definition order, so they agree on every word, including
//! tables whose groups overlap.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{GenConfig, Strategy};
use crate::decoder::{enum_ident, DecodedInstruction, Decoder, Opcode, OpcodeTable};
use crate::error::{CompileError, LoadError};
use crate::field::FieldCatalog;
use crate::isa::rv32;
use crate::partition::{find_overlaps, partition, MaskGroup, Overlap};
use crate::rules::{compile_rule, InstructionPlan};
use crate::spec::InstructionSpec;
use crate::Word;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoderPlan {
    catalog_version: String,
    opcodes: OpcodeTable,
    /// One per spec, in definition order; `instructions[i].opcode == i + 1`.
    instructions: Vec<InstructionPlan>,
    groups: Vec<MaskGroup>,
    overlaps: Vec<Overlap>,
}

impl DecoderPlan {
    /// Compile a whole table. The first error aborts; no partial plan exists.
    pub fn compile(
        specs: &[InstructionSpec],
        catalog: &FieldCatalog,
        cfg: &GenConfig,
    ) -> Result<Self, CompileError> {
        // UNKNOWN is taken by opcode 0 in every emitted enum.
        let mut idents: HashMap<String, &str> =
            HashMap::from([(OpcodeTable::UNKNOWN_NAME.to_string(), OpcodeTable::UNKNOWN_NAME)]);
        for s in specs {
            let ident = enum_ident(s.name());
            if ident.trim_matches('_').is_empty() {
                return Err(CompileError::EmptyName { mask: s.mask(), matched: s.matched() });
            }
            if let Some(first) = idents.insert(ident.clone(), s.name()) {
                return Err(CompileError::DuplicateName {
                    first: first.to_string(),
                    second: s.name().to_string(),
                    ident,
                });
            }
        }

        let mut opcodes = OpcodeTable::default();
        let mut instructions = Vec::with_capacity(specs.len());
        for s in specs {
            let op = opcodes
                .push(s.name())
                .ok_or(CompileError::TooManyInstructions { count: specs.len() })?;
            instructions.push(compile_rule(s, op, catalog)?);
        }

        let groups = partition(specs)?;
        let overlaps = find_overlaps(specs, &groups);
        for o in &overlaps {
            let (a, b) = (specs[o.first].name(), specs[o.second].name());
            if cfg.strict_overlaps {
                return Err(CompileError::AmbiguousEncoding {
                    first: a.to_string(),
                    second: b.to_string(),
                    witness: o.witness,
                });
            }
            warn!("`{a}` shadows `{b}` (both match {:#010x}); group order decides", o.witness);
        }

        info!(
            "compiled {} instructions into {} mask groups (catalog {})",
            instructions.len(),
            groups.len(),
            catalog.version()
        );
        Ok(Self {
            catalog_version: catalog.version().to_string(),
            opcodes,
            instructions,
            groups,
            overlaps,
        })
    }

    /// Plan for the embedded RV32 table.
    pub fn builtin(cfg: &GenConfig) -> Result<Self, LoadError> {
        let catalog = rv32::catalog().map_err(CompileError::from)?;
        let specs = rv32::builtin_specs(cfg)?;
        Ok(Self::compile(&specs, &catalog, cfg)?)
    }

    pub fn catalog_version(&self) -> &str {
        &self.catalog_version
    }

    pub fn opcodes(&self) -> &OpcodeTable {
        &self.opcodes
    }

    pub fn instructions(&self) -> &[InstructionPlan] {
        &self.instructions
    }

    pub fn groups(&self) -> &[MaskGroup] {
        &self.groups
    }

    pub fn overlaps(&self) -> &[Overlap] {
        &self.overlaps
    }

    pub fn instruction(&self, op: Opcode) -> Option<&InstructionPlan> {
        match op.0 {
            0 => None,
            n => self.instructions.get(n as usize - 1),
        }
    }

    pub fn by_name(&self, name: &str) -> Option<&InstructionPlan> {
        self.opcodes.lookup(name).and_then(|op| self.instruction(op))
    }

    pub fn name(&self, op: Opcode) -> &str {
        self.opcodes.name(op)
    }

    pub fn table_decoder(&self) -> TableDecoder<'_> {
        TableDecoder { plan: self }
    }

    pub fn ordered_decoder(&self) -> OrderedDecoder<'_> {
        let rows = self
            .groups
            .iter()
            .flat_map(|g| g.entries.iter().map(move |(&m, &i)| Row { mask: g.mask, matched: m, index: i }))
            .collect();
        OrderedDecoder { plan: self, rows }
    }

    pub fn decoder(&self, strategy: Strategy) -> Box<dyn Decoder + Send + Sync + '_> {
        match strategy {
            Strategy::Ordered => Box::new(self.ordered_decoder()),
            Strategy::Hashed => Box::new(self.table_decoder()),
        }
    }

    /// Deterministic edge words: each match with don't-cares cleared and
    /// set, each group's complement mask, and the all-zero/all-one words.
    pub fn edge_words(&self) -> Vec<Word> {
        let mut words = vec![0, Word::MAX];
        for p in &self.instructions {
            words.push(p.matched);
            words.push(p.matched | !p.mask);
        }
        for g in &self.groups {
            words.push(!g.mask);
        }
        words
    }

    /// Check that both strategies decode `words` identically.
    pub fn verify_equivalence(&self, words: impl IntoIterator<Item = Word>) -> Result<usize, Divergence> {
        let ordered = self.ordered_decoder();
        let hashed = self.table_decoder();
        let mut n = 0;
        for word in words {
            let a = ordered.decode(word);
            let b = hashed.decode(word);
            if a != b {
                return Err(Divergence { word, ordered: a, hashed: b });
            }
            n += 1;
        }
        Ok(n)
    }
}

impl Decoder for DecoderPlan {
    fn decode(&self, word: Word) -> DecodedInstruction {
        self.table_decoder().decode(word)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("dispatch strategies disagree on {word:#010x}: ordered={ordered:?} hashed={hashed:?}")]
pub struct Divergence {
    pub word: Word,
    pub ordered: DecodedInstruction,
    pub hashed: DecodedInstruction,
}

/// Two-level lookup: per group, one masked key lookup.
#[derive(Debug, Clone, Copy)]
pub struct TableDecoder<'a> {
    plan: &'a DecoderPlan,
}

impl Decoder for TableDecoder<'_> {
    fn decode(&self, word: Word) -> DecodedInstruction {
        for g in &self.plan.groups {
            if let Some(i) = g.lookup(word) {
                return self.plan.instructions[i].apply(word);
            }
        }
        DecodedInstruction::UNKNOWN
    }
}

#[derive(Debug, Clone, Copy)]
struct Row {
    mask: Word,
    matched: Word,
    index: usize,
}

/// Exhaustive ordered comparison, rows flattened in group order.
#[derive(Debug, Clone)]
pub struct OrderedDecoder<'a> {
    plan: &'a DecoderPlan,
    rows: Vec<Row>,
}

impl Decoder for OrderedDecoder<'_> {
    fn decode(&self, word: Word) -> DecodedInstruction {
        self.rows
            .iter()
            .find(|r| word & r.mask == r.matched)
            .map_or(DecodedInstruction::UNKNOWN, |r| self.plan.instructions[r.index].apply(word))
    }
}
