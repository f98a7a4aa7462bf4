use std::fmt::Write as _;

use super::{bin32, Artifact, ArtifactKind, Backend, HEADER};
use crate::assemble::DecoderPlan;
use crate::config::Strategy;
use crate::decoder::enum_ident;
use crate::rules::{DecodeOp, InstructionPlan};
use crate::Word;

/// Emits `opcodes.hh` (`enum class OpType` plus a name map) and
/// `decoder.cc` implementing `Decoder::decode` against the simulator's
/// `Instruction` record and its `getBits`/`signExtend` helpers.
#[derive(Debug, Clone)]
pub struct CppBackend {
    strategy: Strategy,
    namespace: String,
}

impl CppBackend {
    pub fn new(strategy: Strategy, namespace: &str) -> Self {
        Self { strategy, namespace: namespace.to_string() }
    }

    fn banner() -> String {
        format!("/*\n * {HEADER}\n */\n\n")
    }

    fn header(&self, plan: &DecoderPlan) -> String {
        let mut s = Self::banner();
        s.push_str("#include <string_view>\n#include <unordered_map>\n\n");
        let _ = writeln!(s, "namespace {} {{", self.namespace);
        s.push_str("enum class OpType {\n    UNKNOWN = 0,\n");
        for (_, name) in plan.opcodes().iter() {
            let _ = writeln!(s, "    {},", enum_ident(name));
        }
        s.push_str("};\n\n");
        s.push_str("inline std::unordered_map<OpType, std::string_view> opTypeToString {\n");
        for (_, name) in plan.opcodes().iter() {
            let id = enum_ident(name);
            let _ = writeln!(s, "    {{OpType::{id}, \"{id}\"}},");
        }
        s.push_str("};\n\n}\n");
        s
    }

    fn fill(ip: &InstructionPlan, indent: &str) -> String {
        let mut s = String::new();
        for op in &ip.ops {
            match op {
                DecodeOp::SetOpcode { .. } => {
                    let _ = writeln!(s, "{indent}decodedInst.type = OpType::{};", enum_ident(&ip.name));
                }
                DecodeOp::MarkControlTransfer => {
                    let _ = writeln!(s, "{indent}decodedInst.isBranch = true;");
                }
                DecodeOp::LoadRegister { slot, bits } => {
                    let dst = format!("decodedInst.{}", slot.name());
                    let _ = writeln!(
                        s,
                        "{indent}{dst} = static_cast<decltype({dst})>(getBits<{}, {}>(binInst));",
                        bits.msb,
                        bits.lsb
                    );
                }
                DecodeOp::OrImmediate { bits } => {
                    let mut get = format!("getBits<{}, {}>(binInst)", bits.msb, bits.lsb);
                    if bits.shift != 0 {
                        let _ = write!(get, " << Word({})", bits.shift);
                    }
                    let _ = writeln!(s, "{indent}decodedInst.imm |= {get};");
                }
                DecodeOp::SignExtend { width } => {
                    let _ = writeln!(s, "{indent}decodedInst.imm = signExtend<{width}>(decodedInst.imm);");
                }
            }
        }
        s
    }

    fn map_name(mask: Word) -> String {
        format!("decMap_{mask:08X}")
    }

    fn body(&self, plan: &DecoderPlan) -> String {
        let ips = plan.instructions();
        let mut s = String::new();
        match self.strategy {
            Strategy::Ordered => {
                for g in plan.groups() {
                    for (&m, &i) in &g.entries {
                        let _ = writeln!(s, "  if ((binInst & {}) == {}) {{", bin32(g.mask), bin32(m));
                        s.push_str(&Self::fill(&ips[i], "    "));
                        s.push_str("    return decodedInst;\n  }\n");
                    }
                }
            }
            Strategy::Hashed => {
                let mut finds = String::new();
                for g in plan.groups() {
                    let map = Self::map_name(g.mask);
                    let _ = writeln!(
                        s,
                        "  static const std::unordered_map<decltype(binInst), \
                         std::function<void(Instruction &, decltype(binInst))>> {map} = {{"
                    );
                    for (&m, &i) in &g.entries {
                        let _ = writeln!(
                            s,
                            "    {{{}, [](Instruction &decodedInst, decltype(binInst) binInst) {{",
                            bin32(m)
                        );
                        s.push_str("      (void)binInst;\n");
                        s.push_str(&Self::fill(&ips[i], "      "));
                        s.push_str("    }},\n");
                    }
                    s.push_str("  };\n\n");
                    let _ = writeln!(
                        finds,
                        "  if (auto it = {map}.find(binInst & {}); it != {map}.end()) {{",
                        bin32(g.mask)
                    );
                    finds.push_str("    it->second(decodedInst, binInst);\n    return decodedInst;\n  }\n");
                }
                s.push_str(&finds);
            }
        }
        s
    }

    fn source(&self, plan: &DecoderPlan) -> String {
        let mut s = Self::banner();
        s.push_str("#include <functional>\n#include <unordered_map>\n\n#include \"decoder/decoder.hh\"\n\n");
        let _ = writeln!(s, "namespace {} {{\n", self.namespace);
        s.push_str("Instruction Decoder::decode(Word binInst) {\n  Instruction decodedInst{};\n\n");
        s.push_str(&self.body(plan));
        s.push_str("  return decodedInst;\n}\n\n}\n");
        s
    }
}

impl Backend for CppBackend {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn render(&self, plan: &DecoderPlan) -> Vec<Artifact> {
        vec![
            Artifact { kind: ArtifactKind::Opcodes, file_name: "opcodes.hh".into(), contents: self.header(plan) },
            Artifact { kind: ArtifactKind::Decoder, file_name: "decoder.cc".into(), contents: self.source(plan) },
        ]
    }
}
