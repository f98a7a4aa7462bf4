use crate::config::GenConfig;
use crate::error::{FieldError, LoadError};
use crate::field::{BitField, FieldCatalog, RegSlot};
use crate::spec::{parse_specs, InstructionSpec};

/// RV32 field catalog, following the riscv-opcodes `variable_fields` names.
/// Bumped whenever an entry changes shape or sign rule.
pub const CATALOG_VERSION: &str = "rv32-fields-1";

const fn signed(msb: u32, lsb: u32, shift: u32) -> BitField {
    BitField::range(msb, lsb).at(shift)
}

const fn unsigned(msb: u32, lsb: u32, shift: u32) -> BitField {
    BitField::range(msb, lsb).at(shift).unsigned()
}

pub const REGISTERS: &[(&str, RegSlot, BitField)] = &[
    ("rm", RegSlot::Rm, unsigned(14, 12, 0)),
    ("rd", RegSlot::Rd, unsigned(11, 7, 0)),
    ("csr", RegSlot::Csr, unsigned(31, 20, 0)),
    ("rs2", RegSlot::Rs2, unsigned(24, 20, 0)),
    ("rs1", RegSlot::Rs1, unsigned(19, 15, 0)),
    ("rs3", RegSlot::Rs3, unsigned(31, 27, 0)),
];

// Shift amounts, fence ordering bits and the AMO aq/rl bits are not
// two's-complement quantities, so they stay zero-extended.
pub const IMMEDIATES: &[(&str, &[BitField])] = &[
    ("imm20", &[signed(31, 12, 12)]),
    (
        "jimm20",
        &[signed(31, 31, 20), signed(30, 21, 1), signed(20, 20, 11), signed(19, 12, 12)],
    ),
    ("succ", &[unsigned(23, 20, 0)]),
    ("pred", &[unsigned(27, 24, 4)]),
    ("fm", &[unsigned(31, 28, 8)]),
    ("imm12", &[signed(31, 20, 0)]),
    ("zimm", &[unsigned(19, 15, 0)]),
    ("aq", &[unsigned(26, 26, 1)]),
    ("rl", &[unsigned(25, 25, 0)]),
    ("bimm12hi", &[signed(31, 31, 12), signed(30, 25, 5)]),
    ("bimm12lo", &[signed(11, 8, 1), signed(7, 7, 11)]),
    ("imm12hi", &[signed(31, 25, 5)]),
    ("imm12lo", &[signed(11, 7, 0)]),
    ("shamtw", &[unsigned(24, 20, 0)]),
    ("shamtd", &[unsigned(25, 20, 0)]),
];

/// Build the RV32 catalog from the static tables above.
pub fn catalog() -> Result<FieldCatalog, FieldError> {
    let mut b = FieldCatalog::builder(CATALOG_VERSION);
    for &(name, slot, bits) in REGISTERS {
        b = b.register(name, slot, bits)?;
    }
    for &(name, fragments) in IMMEDIATES {
        b = b.immediate(name, fragments)?;
    }
    Ok(b.build())
}

/// Embedded RV32 I/M/A/F/Zicsr/Zifencei instruction table in
/// `instr_dict.json` form.
pub const BUILTIN_TABLE: &str = include_str!("../../data/rv32.json");

pub fn builtin_specs(cfg: &GenConfig) -> Result<Vec<InstructionSpec>, LoadError> {
    parse_specs(BUILTIN_TABLE, cfg)
}
