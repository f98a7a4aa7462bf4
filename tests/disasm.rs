use rvdecgen::disasm::fmt_decoded;
use rvdecgen::{Decoder, DecoderPlan, GenConfig};

#[test]
fn disasm_loads_stores_branches() {
    let plan = DecoderPlan::builtin(&GenConfig::default()).unwrap();
    let text = |w: u32| fmt_decoded(&plan, &plan.decode(w));

    // lw x5, 8(x2)
    assert_eq!(text(0x0081_2283), "lw x5, x2, 8");
    // sw x5, -4(x2)
    assert_eq!(text(0xFE51_2E23), "sw x2, x5, -4");
    // beq x1, x2, -4
    assert_eq!(text(0xFE20_8EE3), "beq x1, x2, -4");
    // jal x1, -8
    assert_eq!(text(0xFF9F_F0EF), "jal x1, -8");
}

#[test]
fn disasm_dotted_mnemonics_and_unsigned_immediates() {
    let plan = DecoderPlan::builtin(&GenConfig::default()).unwrap();
    let text = |w: u32| fmt_decoded(&plan, &plan.decode(w));

    assert_eq!(text(0x0000_100F), "fence.i x0, x0, 0");
    assert_eq!(text(0x300F_D073), "csrrwi x0, 0x300, 0x1f");
    assert_eq!(text(0x41F0_D093), "srai x1, x1, 0x1f");
}
