use std::fmt::Write as _;

use super::{bin32, Artifact, ArtifactKind, Backend, HEADER};
use crate::assemble::DecoderPlan;
use crate::config::Strategy;
use crate::decoder::enum_ident;
use crate::field::RegSlot;
use crate::rules::{DecodeOp, InstructionPlan};

/// Emits `opcodes.rs` and `decoder.rs`, meant to sit side by side in one
/// parent module of the consuming crate.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend {
    strategy: Strategy,
}

impl RustBackend {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    fn opcodes(&self, plan: &DecoderPlan) -> String {
        let mut s = format!("// {HEADER}\n\n");
        s.push_str("#[allow(non_camel_case_types, clippy::upper_case_acronyms)]\n");
        s.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]\n");
        s.push_str("#[repr(u16)]\npub enum Opcode {\n    #[default]\n    UNKNOWN = 0,\n");
        for (op, name) in plan.opcodes().iter() {
            let _ = writeln!(s, "    {} = {},", enum_ident(name), op.0);
        }
        s.push_str("}\n\nimpl Opcode {\n    pub const fn name(self) -> &'static str {\n        match self {\n");
        s.push_str("            Opcode::UNKNOWN => \"UNKNOWN\",\n");
        for (_, name) in plan.opcodes().iter() {
            let id = enum_ident(name);
            let _ = writeln!(s, "            Opcode::{id} => \"{id}\",");
        }
        s.push_str("        }\n    }\n}\n");
        s
    }

    fn fill(ip: &InstructionPlan) -> String {
        let mut s = String::new();
        let reads_word =
            ip.ops.iter().any(|op| matches!(op, DecodeOp::LoadRegister { .. } | DecodeOp::OrImmediate { .. }));
        let param = if reads_word { "word" } else { "_word" };
        let _ = writeln!(s, "fn {}({param}: u32) -> DecodedInstruction {{", fn_name(ip));
        let _ = writeln!(s, "    let mut d = DecodedInstruction::default();");
        if ip.has_immediate() {
            let _ = writeln!(s, "    let mut imm: u32 = 0;");
        }
        for op in &ip.ops {
            match op {
                DecodeOp::SetOpcode { .. } => {
                    let _ = writeln!(s, "    d.opcode = Opcode::{};", enum_ident(&ip.name));
                }
                DecodeOp::MarkControlTransfer => {
                    let _ = writeln!(s, "    d.is_control_transfer = true;");
                }
                DecodeOp::LoadRegister { slot, bits } => {
                    let ty = if *slot == RegSlot::Csr { "u16" } else { "u8" };
                    let _ = writeln!(
                        s,
                        "    d.{} = bits(word, {}, {}) as {ty};",
                        slot.name(),
                        bits.msb,
                        bits.lsb
                    );
                }
                DecodeOp::OrImmediate { bits } => {
                    if bits.shift == 0 {
                        let _ = writeln!(s, "    imm |= bits(word, {}, {});", bits.msb, bits.lsb);
                    } else {
                        let _ = writeln!(s, "    imm |= bits(word, {}, {}) << {};", bits.msb, bits.lsb, bits.shift);
                    }
                }
                DecodeOp::SignExtend { width } => {
                    let _ = writeln!(s, "    imm = sign_extend(imm, {width});");
                }
            }
        }
        if ip.has_immediate() {
            let _ = writeln!(s, "    d.imm = imm as i32;");
        }
        s.push_str("    d\n}\n");
        s
    }

    fn dispatch(&self, plan: &DecoderPlan) -> String {
        let mut s = String::from("pub fn decode(word: u32) -> DecodedInstruction {\n");
        let ips = plan.instructions();
        match self.strategy {
            Strategy::Ordered => {
                for g in plan.groups() {
                    for (&m, &i) in &g.entries {
                        let _ = writeln!(
                            s,
                            "    if word & {} == {} {{\n        return {}(word);\n    }}",
                            bin32(g.mask),
                            bin32(m),
                            fn_name(&ips[i])
                        );
                    }
                }
            }
            Strategy::Hashed => {
                for g in plan.groups() {
                    let _ = writeln!(s, "    match word & {} {{", bin32(g.mask));
                    for (&m, &i) in &g.entries {
                        let _ = writeln!(s, "        {} => return {}(word),", bin32(m), fn_name(&ips[i]));
                    }
                    s.push_str("        _ => {}\n    }\n");
                }
            }
        }
        s.push_str("    DecodedInstruction::default()\n}\n");
        s
    }

    fn decoder(&self, plan: &DecoderPlan) -> String {
        let mut s = format!("// {HEADER}\n\nuse super::opcodes::Opcode;\n\n");
        s.push_str(PRELUDE);
        for ip in plan.instructions() {
            s.push('\n');
            s.push_str(&Self::fill(ip));
        }
        s.push('\n');
        s.push_str(&self.dispatch(plan));
        s
    }
}

impl Backend for RustBackend {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn render(&self, plan: &DecoderPlan) -> Vec<Artifact> {
        vec![
            Artifact { kind: ArtifactKind::Opcodes, file_name: "opcodes.rs".into(), contents: self.opcodes(plan) },
            Artifact { kind: ArtifactKind::Decoder, file_name: "decoder.rs".into(), contents: self.decoder(plan) },
        ]
    }
}

fn fn_name(ip: &InstructionPlan) -> String {
    format!("decode_{}", enum_ident(&ip.name).to_ascii_lowercase())
}

const PRELUDE: &str = r#"#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
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

#[inline(always)]
const fn bits(word: u32, msb: u32, lsb: u32) -> u32 {
    (word >> lsb) & (u32::MAX >> (31 - (msb - lsb)))
}

#[inline(always)]
const fn sign_extend(value: u32, width: u32) -> u32 {
    let s = 32 - width;
    ((value << s) as i32 >> s) as u32
}
"#;
