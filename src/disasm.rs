use crate::assemble::DecoderPlan;
use crate::decoder::DecodedInstruction;
use crate::field::RegSlot;
use crate::rules::DecodeOp;

/// Render a decoded record as `name operands`. Registers print in table
/// order, then the CSR, then the immediate.
pub fn fmt_decoded(plan: &DecoderPlan, d: &DecodedInstruction) -> String {
    let Some(ip) = plan.instruction(d.opcode) else {
        return "unknown".to_string();
    };
    let mut ops: Vec<String> = Vec::new();
    let mut csr = None;
    for op in &ip.ops {
        if let DecodeOp::LoadRegister { slot, .. } = op {
            match slot {
                RegSlot::Csr => csr = Some(d.csr),
                RegSlot::Rm => ops.push(format!("rm={}", d.rm)),
                s => ops.push(format!("x{}", d.register(*s))),
            }
        }
    }
    if let Some(c) = csr {
        ops.push(format!("{c:#x}"));
    }
    if ip.has_immediate() {
        if ip.sign_extension().is_some() {
            ops.push(format!("{}", d.imm));
        } else {
            ops.push(format!("{:#x}", d.imm as u32));
        }
    }
    let mnemonic = ip.name.replace('_', ".");
    if ops.is_empty() { mnemonic } else { format!("{} {}", mnemonic, ops.join(", ")) }
}
