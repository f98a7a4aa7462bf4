use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::RegSlot;
use crate::Word;

/// Stable identifier of a decoded operation. `0` is reserved for UNKNOWN;
/// table entries are numbered from 1 in definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opcode(pub u16);

impl Opcode {
    pub const UNKNOWN: Opcode = Opcode(0);

    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DecodedInstruction {
    pub opcode: Opcode,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub rs3: u8,
    pub rm: u8,
    pub csr: u16,
    pub imm: i32,
    pub is_control_transfer: bool,
}

impl DecodedInstruction {
    pub const UNKNOWN: DecodedInstruction = DecodedInstruction {
        opcode: Opcode::UNKNOWN,
        rd: 0,
        rs1: 0,
        rs2: 0,
        rs3: 0,
        rm: 0,
        csr: 0,
        imm: 0,
        is_control_transfer: false,
    };

    // Catalog construction guarantees the value fits the slot.
    pub(crate) fn set_register(&mut self, slot: RegSlot, value: Word) {
        match slot {
            RegSlot::Rd => self.rd = value as u8,
            RegSlot::Rs1 => self.rs1 = value as u8,
            RegSlot::Rs2 => self.rs2 = value as u8,
            RegSlot::Rs3 => self.rs3 = value as u8,
            RegSlot::Rm => self.rm = value as u8,
            RegSlot::Csr => self.csr = value as u16,
        }
    }

    pub fn register(&self, slot: RegSlot) -> u32 {
        match slot {
            RegSlot::Rd => self.rd.into(),
            RegSlot::Rs1 => self.rs1.into(),
            RegSlot::Rs2 => self.rs2.into(),
            RegSlot::Rs3 => self.rs3.into(),
            RegSlot::Rm => self.rm.into(),
            RegSlot::Csr => self.csr.into(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.opcode.is_unknown()
    }
}

/// Name table for [`Opcode`] values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OpcodeTable {
    names: Vec<String>,
}

impl OpcodeTable {
    pub const UNKNOWN_NAME: &'static str = "UNKNOWN";

    /// Assign the next opcode to `name`. `None` once the 16-bit space is used up.
    pub(crate) fn push(&mut self, name: &str) -> Option<Opcode> {
        let next = u16::try_from(self.names.len() + 1).ok()?;
        self.names.push(name.to_string());
        Some(Opcode(next))
    }

    pub fn name(&self, op: Opcode) -> &str {
        match op.0 {
            0 => Self::UNKNOWN_NAME,
            n => self.names.get(n as usize - 1).map_or(Self::UNKNOWN_NAME, String::as_str),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Opcode> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| Opcode(i as u16 + 1))
    }

    /// Entries excluding UNKNOWN, in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (Opcode(i as u16 + 1), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Upper-case identifier used by the emitted enums (`fence.i` -> `FENCE_I`).
pub fn enum_ident(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// A total decoder: every word yields a record, UNKNOWN when nothing matches.
pub trait Decoder {
    fn decode(&self, word: Word) -> DecodedInstruction;
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_reserves_zero() {
        let mut t = OpcodeTable::default();
        let add = t.push("add").unwrap();
        let sub = t.push("sub").unwrap();
        assert_eq!(add, Opcode(1));
        assert_eq!(sub, Opcode(2));
        assert_eq!(t.name(Opcode::UNKNOWN), "UNKNOWN");
        assert_eq!(t.name(sub), "sub");
        assert_eq!(t.name(Opcode(99)), "UNKNOWN");
        assert_eq!(t.lookup("add"), Some(add));
        assert_eq!(t.lookup("mul"), None);
    }

    #[test]
    fn opcode_space_never_wraps_to_unknown() {
        let mut t = OpcodeTable::default();
        for i in 0..u16::MAX {
            assert_eq!(t.push(&format!("op{i}")), Some(Opcode(i + 1)));
        }
        assert_eq!(t.push("one_too_many"), None);
        assert_eq!(t.len(), u16::MAX as usize);
    }

    #[test]
    fn sentinel_is_default() {
        assert_eq!(DecodedInstruction::default(), DecodedInstruction::UNKNOWN);
        assert!(DecodedInstruction::UNKNOWN.is_unknown());
    }

    #[test]
    fn idents_are_sanitized() {
        assert_eq!(enum_ident("fence.i"), "FENCE_I");
        assert_eq!(enum_ident("amoadd_w"), "AMOADD_W");
        assert_eq!(enum_ident("c.addi4spn"), "C_ADDI4SPN");
    }
}
