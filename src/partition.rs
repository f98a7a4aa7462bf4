//! Groups instruction specs by mask.
//!
//! Decoding then costs one masked lookup per group instead of one
//! comparison per instruction. Group order and in-group order follow the
//! table's definition order so generated output is reproducible.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::CompileError;
use crate::spec::InstructionSpec;
use crate::Word;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskGroup {
    pub mask: Word,
    /// `match -> index into the spec slice`, in definition order.
    pub entries: IndexMap<Word, usize>,
}

impl MaskGroup {
    pub fn lookup(&self, word: Word) -> Option<usize> {
        self.entries.get(&(word & self.mask)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split `specs` into mask groups. Fails on duplicate `(mask, match)` pairs.
pub fn partition(specs: &[InstructionSpec]) -> Result<Vec<MaskGroup>, CompileError> {
    let mut groups: IndexMap<Word, MaskGroup> = IndexMap::new();
    for (idx, spec) in specs.iter().enumerate() {
        let group = groups
            .entry(spec.mask())
            .or_insert_with(|| MaskGroup { mask: spec.mask(), entries: IndexMap::new() });
        if let Some(&prev) = group.entries.get(&spec.matched()) {
            return Err(CompileError::Conflict {
                first: specs[prev].name().to_string(),
                second: spec.name().to_string(),
                mask: spec.mask(),
                matched: spec.matched(),
            });
        }
        group.entries.insert(spec.matched(), idx);
    }
    for g in groups.values() {
        debug!("mask group {:#010x}: {} entries", g.mask, g.len());
    }
    Ok(groups.into_values().collect())
}

/// Two specs from different groups that accept a common word. `first` is
/// the one that wins under group-order dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub first: usize,
    pub second: usize,
    /// A word both specs accept.
    pub witness: Word,
}

/// Cross-group overlaps. Within a group matches are distinct, so two
/// entries there can never accept the same word.
pub fn find_overlaps(specs: &[InstructionSpec], groups: &[MaskGroup]) -> Vec<Overlap> {
    let mut out = Vec::new();
    for (gi, g) in groups.iter().enumerate() {
        for h in &groups[gi + 1..] {
            let common = g.mask & h.mask;
            for (&a, &ia) in &g.entries {
                for (&b, &ib) in &h.entries {
                    if (a ^ b) & common == 0 {
                        out.push(Overlap { first: ia, second: ib, witness: a | b });
                    }
                }
            }
        }
    }
    debug_assert!(out
        .iter()
        .all(|o| specs[o.first].matches(o.witness) && specs[o.second].matches(o.witness)));
    out
}
