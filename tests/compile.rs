use rvdecgen::isa::rv32;
use rvdecgen::spec::parse_specs;
use rvdecgen::{CompileError, DecoderPlan, GenConfig, LoadError};

fn compile_json(json: &str, cfg: &GenConfig) -> Result<DecoderPlan, LoadError> {
    let specs = parse_specs(json, cfg)?;
    let catalog = rv32::catalog().map_err(CompileError::from)?;
    Ok(DecoderPlan::compile(&specs, &catalog, cfg)?)
}

fn compile_err(json: &str) -> CompileError {
    match compile_json(json, &GenConfig::default()) {
        Err(LoadError::Compile(e)) => e,
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn match_outside_mask_names_the_instruction() {
    let err = compile_err(r#"{ "bogus": { "mask": "0x7f", "match": "0x1033", "variable_fields": [] } }"#);
    assert_eq!(err, CompileError::MatchMaskInconsistency { instruction: "bogus".into(), mask: 0x7F, matched: 0x1033 });
}

#[test]
fn unknown_field_is_rejected() {
    let err = compile_err(r#"{ "addw": { "mask": "0xfe00707f", "match": "0x3b", "variable_fields": ["rd", "rs9"] } }"#);
    assert_eq!(err, CompileError::UnknownField { instruction: "addw".into(), field: "rs9".into() });
}

#[test]
fn duplicate_encoding_conflicts() {
    let err = compile_err(
        r#"{
            "add":  { "mask": "0xfe00707f", "match": "0x33", "variable_fields": ["rd", "rs1", "rs2"] },
            "add2": { "mask": "0xfe00707f", "match": "0x33", "variable_fields": ["rd", "rs1", "rs2"] }
        }"#,
    );
    assert!(matches!(err, CompileError::Conflict { ref first, ref second, mask: 0xFE00_707F, matched: 0x33 }
        if first == "add" && second == "add2"));
}

#[test]
fn overlap_warns_unless_strict() {
    let json = r#"{
        "fence":     { "mask": "0x707f",     "match": "0xf",        "variable_fields": ["fm", "pred", "succ", "rs1", "rd"] },
        "fence_tso": { "mask": "0xfff0707f", "match": "0x8330000f", "variable_fields": ["rs1", "rd"] }
    }"#;
    let plan = compile_json(json, &GenConfig::default()).unwrap();
    assert_eq!(plan.overlaps().len(), 1);
    assert_eq!(plan.overlaps()[0].witness & 0xFFF0_707F, 0x8330_000F);

    let strict = GenConfig { strict_overlaps: true, ..GenConfig::default() };
    match compile_json(json, &strict) {
        Err(LoadError::Compile(CompileError::AmbiguousEncoding { first, second, .. })) => {
            assert_eq!((first.as_str(), second.as_str()), ("fence", "fence_tso"));
        }
        other => panic!("expected AmbiguousEncoding, got {other:?}"),
    }
}

#[test]
fn bad_literals_and_json_are_load_errors() {
    let err = compile_json(r#"{ "x": { "mask": "0xzz", "match": "0x0" } }"#, &GenConfig::default()).unwrap_err();
    assert!(matches!(err, LoadError::BadNumber { what: "mask", .. }), "{err:?}");
    assert!(err.to_string().contains("0xzz"));

    let err = compile_json("{ not json", &GenConfig::default()).unwrap_err();
    assert!(matches!(err, LoadError::Json(_)));
}

#[test]
fn control_transfer_follows_config_and_table() {
    let json = r#"{
        "jal":   { "mask": "0x7f",   "match": "0x6f", "variable_fields": ["rd", "jimm20"] },
        "mret":  { "mask": "0xffffffff", "match": "0x30200073", "control_transfer": true },
        "addi":  { "mask": "0x707f", "match": "0x13", "variable_fields": ["rd", "rs1", "imm12"] }
    }"#;
    let plan = compile_json(json, &GenConfig::default()).unwrap();
    use rvdecgen::Decoder;
    assert!(plan.decode(0x0000_006F).is_control_transfer);
    assert!(plan.decode(0x3020_0073).is_control_transfer);
    assert!(!plan.decode(0x0000_0013).is_control_transfer);

    let none = GenConfig { control_transfer: Vec::new(), ..GenConfig::default() };
    let plan = compile_json(json, &none).unwrap();
    assert!(!plan.decode(0x0000_006F).is_control_transfer);
}

#[test]
fn empty_table_decodes_nothing() {
    use rvdecgen::{DecodedInstruction, Decoder};
    let plan = compile_json("{}", &GenConfig::default()).unwrap();
    assert!(plan.groups().is_empty());
    assert_eq!(plan.decode(0x0000_0033), DecodedInstruction::UNKNOWN);
}
