//! Per-instruction decode rules.
//!
//! Each [`InstructionSpec`] compiles to a flat, syntax-free list of
//! [`DecodeOp`]s. Running the list against a word fills a
//! [`DecodedInstruction`]; the rendering backends walk the same list to emit
//! source code, so the two cannot drift apart.

use serde::Serialize;
use tracing::trace;

use crate::decoder::{DecodedInstruction, Opcode};
use crate::error::CompileError;
use crate::field::{sign_extend, BitField, FieldCatalog, NamedField, RegSlot, WORD_BITS};
use crate::spec::InstructionSpec;
use crate::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DecodeOp {
    SetOpcode { opcode: Opcode },
    MarkControlTransfer,
    LoadRegister { slot: RegSlot, bits: BitField },
    /// OR the placed fragment into the immediate accumulator.
    OrImmediate { bits: BitField },
    /// Replicate bit `width - 1` of the accumulator upward.
    SignExtend { width: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionPlan {
    pub name: String,
    pub opcode: Opcode,
    pub mask: Word,
    pub matched: Word,
    /// Variable field names in table order, kept for listings.
    pub fields: Vec<String>,
    pub ops: Vec<DecodeOp>,
}

impl InstructionPlan {
    /// Run the op list. The accumulator is a plain word; the result's
    /// immediate is its two's-complement reading.
    pub fn apply(&self, word: Word) -> DecodedInstruction {
        let mut d = DecodedInstruction::UNKNOWN;
        let mut imm: Word = 0;
        for op in &self.ops {
            match *op {
                DecodeOp::SetOpcode { opcode } => d.opcode = opcode,
                DecodeOp::MarkControlTransfer => d.is_control_transfer = true,
                DecodeOp::LoadRegister { slot, bits } => d.set_register(slot, bits.extract(word)),
                DecodeOp::OrImmediate { bits } => imm |= bits.extract(word),
                DecodeOp::SignExtend { width } => imm = sign_extend(imm, width),
            }
        }
        d.imm = imm as i32;
        d
    }

    pub fn sign_extension(&self) -> Option<u32> {
        self.ops.iter().find_map(|op| match op {
            DecodeOp::SignExtend { width } => Some(*width),
            _ => None,
        })
    }

    pub fn has_immediate(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DecodeOp::OrImmediate { .. }))
    }
}

/// Compile one spec against the catalog. Nothing is emitted on failure.
pub fn compile_rule(
    spec: &InstructionSpec,
    opcode: Opcode,
    catalog: &FieldCatalog,
) -> Result<InstructionPlan, CompileError> {
    let mut ops = vec![DecodeOp::SetOpcode { opcode }];
    if spec.is_control_transfer() {
        ops.push(DecodeOp::MarkControlTransfer);
    }

    let mut has_imm = false;
    let mut all_signed = true;
    let mut max_placed = 0;

    for name in spec.fields() {
        let field = catalog.get(name).ok_or_else(|| CompileError::UnknownField {
            instruction: spec.name().to_string(),
            field: name.clone(),
        })?;
        match field {
            NamedField::Register { slot, bits } => {
                ops.push(DecodeOp::LoadRegister { slot: *slot, bits: *bits });
            }
            NamedField::Immediate { fragments } => {
                has_imm = true;
                for bits in fragments {
                    if bits.placed_width() > WORD_BITS {
                        return Err(CompileError::ConstraintViolation {
                            instruction: spec.name().to_string(),
                            field: name.clone(),
                            reason: format!(
                                "fragment {}..{} << {} places bits up to {} in a {}-bit value",
                                bits.msb,
                                bits.lsb,
                                bits.shift,
                                bits.placed_width(),
                                WORD_BITS
                            ),
                        });
                    }
                    all_signed &= bits.sign;
                    max_placed = max_placed.max(bits.placed_width());
                    ops.push(DecodeOp::OrImmediate { bits: *bits });
                }
            }
        }
    }

    // Mixed signedness leaves the accumulator zero-extended.
    if has_imm && all_signed {
        ops.push(DecodeOp::SignExtend { width: max_placed });
    }

    trace!("compiled `{}` into {} ops", spec.name(), ops.len());
    Ok(InstructionPlan {
        name: spec.name().to_string(),
        opcode,
        mask: spec.mask(),
        matched: spec.matched(),
        fields: spec.fields().to_vec(),
        ops,
    })
}
