//! Bit-range descriptors and the named-field catalog.
//!
//! A [`BitField`] describes where one run of bits lives in the instruction
//! word and where it lands once relocated into the decoded value. A
//! [`NamedField`] groups one or more of them under the symbolic name used by
//! the instruction tables (`rd`, `imm12`, `jimm20`, ...).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::Word;

/// Width of the instruction word in bits.
pub const WORD_BITS: u32 = Word::BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitField {
    pub msb: u32,
    pub lsb: u32,
    /// Left shift applied after extraction.
    pub shift: u32,
    pub sign: bool,
}

impl BitField {
    /// Checked constructor for fields built at runtime.
    pub fn new(msb: u32, lsb: u32, shift: u32, sign: bool) -> Result<Self, FieldError> {
        if msb < lsb {
            return Err(FieldError::InvertedRange { msb, lsb });
        }
        if msb >= WORD_BITS {
            return Err(FieldError::BitOutOfRange { bit: msb, width: WORD_BITS });
        }
        if shift >= WORD_BITS {
            return Err(FieldError::ShiftOutOfRange { shift, width: WORD_BITS });
        }
        Ok(Self { msb, lsb, shift, sign })
    }

    /// Compile-time constructor for static catalogs. Panics during const
    /// evaluation if the range is malformed, so a bad table never builds.
    pub const fn fixed(msb: u32, lsb: u32, shift: u32, sign: bool) -> Self {
        assert!(msb >= lsb, "bit range msb < lsb");
        assert!(msb < WORD_BITS, "bit index out of range");
        assert!(shift < WORD_BITS, "destination shift out of range");
        Self { msb, lsb, shift, sign }
    }

    /// Single bit, signed, not relocated.
    pub const fn bit(msb: u32) -> Self {
        Self::fixed(msb, msb, 0, true)
    }

    /// `msb..=lsb`, signed, not relocated.
    pub const fn range(msb: u32, lsb: u32) -> Self {
        Self::fixed(msb, lsb, 0, true)
    }

    /// Same source bits, landing at bit `shift` of the value.
    pub const fn at(self, shift: u32) -> Self {
        Self::fixed(self.msb, self.lsb, shift, self.sign)
    }

    pub const fn unsigned(self) -> Self {
        Self { sign: false, ..self }
    }

    /// Number of bits taken from the word.
    pub const fn len(&self) -> u32 {
        self.msb - self.lsb + 1
    }

    /// Span of the field once relocated: `shift + msb - lsb + 1`.
    pub const fn placed_width(&self) -> u32 {
        self.shift + self.len()
    }

    #[inline]
    pub const fn extract(&self, word: Word) -> Word {
        ((word >> self.lsb) & low_mask(self.len())) << self.shift
    }
}

/// Mask with the low `bits` bits set.
#[inline]
pub const fn low_mask(bits: u32) -> Word {
    if bits >= WORD_BITS {
        Word::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Treat bit `width - 1` of `value` as the sign and replicate it upward.
#[inline]
pub const fn sign_extend(value: Word, width: u32) -> Word {
    if width == 0 || width >= WORD_BITS {
        return value;
    }
    let s = WORD_BITS - width;
    ((value << s) as i32 >> s) as Word
}

/// Destination slot of a register field in the decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegSlot {
    Rd,
    Rs1,
    Rs2,
    Rs3,
    Rm,
    Csr,
}

impl RegSlot {
    /// Storage width of the slot in the decoded record.
    pub const fn capacity(self) -> u32 {
        match self {
            RegSlot::Csr => u16::BITS,
            _ => u8::BITS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RegSlot::Rd => "rd",
            RegSlot::Rs1 => "rs1",
            RegSlot::Rs2 => "rs2",
            RegSlot::Rs3 => "rs3",
            RegSlot::Rm => "rm",
            RegSlot::Csr => "csr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NamedField {
    Register { slot: RegSlot, bits: BitField },
    Immediate { fragments: Vec<BitField> },
}

impl NamedField {
    pub fn fragments(&self) -> &[BitField] {
        match self {
            NamedField::Register { bits, .. } => std::slice::from_ref(bits),
            NamedField::Immediate { fragments } => fragments,
        }
    }
}

/// Closed registry of field names an instruction table may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCatalog {
    version: String,
    fields: IndexMap<String, NamedField>,
}

impl FieldCatalog {
    pub fn builder(version: impl Into<String>) -> CatalogBuilder {
        CatalogBuilder {
            catalog: FieldCatalog { version: version.into(), fields: IndexMap::new() },
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, name: &str) -> Option<&NamedField> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NamedField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Validating builder; every entry is checked when it is added.
#[derive(Debug)]
pub struct CatalogBuilder {
    catalog: FieldCatalog,
}

impl CatalogBuilder {
    pub fn register(mut self, name: &str, slot: RegSlot, bits: BitField) -> Result<Self, FieldError> {
        let bits = BitField::new(bits.msb, bits.lsb, bits.shift, false)?;
        if bits.shift != 0 {
            return Err(FieldError::ShiftedRegister { name: name.to_string() });
        }
        if bits.len() > slot.capacity() {
            return Err(FieldError::SlotTooNarrow {
                name: name.to_string(),
                width: bits.len(),
                capacity: slot.capacity(),
            });
        }
        self.insert(name, NamedField::Register { slot, bits })?;
        Ok(self)
    }

    pub fn immediate(mut self, name: &str, fragments: &[BitField]) -> Result<Self, FieldError> {
        if fragments.is_empty() {
            return Err(FieldError::NoFragments { name: name.to_string() });
        }
        let mut checked = Vec::with_capacity(fragments.len());
        let mut seen: Word = 0;
        for f in fragments {
            let f = BitField::new(f.msb, f.lsb, f.shift, f.sign)?;
            let placed = low_mask(f.len()) << f.shift;
            if seen & placed != 0 {
                return Err(FieldError::OverlappingFragments { name: name.to_string() });
            }
            seen |= placed;
            checked.push(f);
        }
        self.insert(name, NamedField::Immediate { fragments: checked })?;
        Ok(self)
    }

    fn insert(&mut self, name: &str, field: NamedField) -> Result<(), FieldError> {
        if self.catalog.fields.contains_key(name) {
            return Err(FieldError::Duplicate { name: name.to_string() });
        }
        self.catalog.fields.insert(name.to_string(), field);
        Ok(())
    }

    pub fn build(self) -> FieldCatalog {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_matches_manual_shift() {
        let hi = BitField::new(31, 16, 0, false).unwrap();
        let lo = BitField::new(15, 0, 0, false).unwrap();
        assert_eq!(hi.extract(0xDEAD_BEEF), 0xDEAD);
        assert_eq!(lo.extract(0xDEAD_BEEF), 0xBEEF);

        let whole = BitField::new(31, 0, 0, true).unwrap();
        assert_eq!(whole.extract(0xDEAD_BEEF), 0xDEAD_BEEF);
    }

    #[test]
    fn extract_relocates() {
        // jal imm[20] lives in bit 31
        let b = BitField::new(31, 31, 20, true).unwrap();
        assert_eq!(b.extract(0x8000_0000), 1 << 20);
        assert_eq!(b.placed_width(), 21);
    }

    #[test]
    fn shorthand_constructors_default_to_signed_in_place() {
        assert_eq!(BitField::bit(31), BitField::fixed(31, 31, 0, true));
        assert_eq!(BitField::range(30, 21), BitField::fixed(30, 21, 0, true));
        assert_eq!(BitField::bit(31).at(20), BitField::fixed(31, 31, 20, true));
        assert_eq!(BitField::range(19, 15).unsigned(), BitField::fixed(19, 15, 0, false));
        assert_eq!(BitField::range(11, 8).at(1).placed_width(), 5);
    }

    #[test]
    fn rejects_bad_ranges() {
        assert_eq!(BitField::new(3, 4, 0, true), Err(FieldError::InvertedRange { msb: 3, lsb: 4 }));
        assert_eq!(
            BitField::new(7, 0, 32, true),
            Err(FieldError::ShiftOutOfRange { shift: 32, width: 32 })
        );
        assert_eq!(BitField::new(32, 0, 0, true), Err(FieldError::BitOutOfRange { bit: 32, width: 32 }));
    }

    #[test]
    fn sign_extend_widths() {
        assert_eq!(sign_extend(0x800, 12), 0xFFFF_F800);
        assert_eq!(sign_extend(0x7FF, 12), 0x7FF);
        assert_eq!(sign_extend(0x1, 1), Word::MAX);
        assert_eq!(sign_extend(0x8000_0000, 32), 0x8000_0000);
    }

    #[test]
    fn builder_checks_slots_and_overlap() {
        let err = FieldCatalog::builder("t")
            .register("wide", RegSlot::Rd, BitField::fixed(31, 20, 0, false))
            .unwrap_err();
        assert!(matches!(err, FieldError::SlotTooNarrow { width: 12, capacity: 8, .. }));

        let err = FieldCatalog::builder("t")
            .immediate("clash", &[BitField::fixed(11, 8, 0, true), BitField::fixed(3, 0, 2, true)])
            .unwrap_err();
        assert!(matches!(err, FieldError::OverlappingFragments { .. }));
    }
}
