use std::io::Cursor;

use rvdecgen::trace::{compare, Side, TraceVerdict};

fn trace(records: &[(u64, u32, Option<(u32, u32)>, Option<(u32, u32)>)]) -> String {
    let mut s = String::from("---------- simulator trace ----------\n");
    for &(num, pc, reg, mem) in records {
        s.push_str(&format!("NUM={num}\nPC=0x{pc:x}\n"));
        if let Some((r, v)) = reg {
            s.push_str(&format!("x{r}=0x{v:x}\n"));
        }
        if let Some((a, v)) = mem {
            s.push_str(&format!("M[0x{a:x}]=0x{v:x}\n"));
        }
        s.push_str("--------------------\n");
    }
    s
}

#[test]
fn traces_from_two_simulators_agree() {
    let recs = [
        (1, 0x8000_0000, Some((5, 0x10)), None),
        (2, 0x8000_0004, None, Some((0x2000, 0xdead_beef))),
        (3, 0x8000_0008, Some((1, 0x8000_000c)), None),
    ];
    let v = compare(Cursor::new(trace(&recs)), Cursor::new(trace(&recs))).unwrap();
    assert!(v.is_match(), "{v}");
}

#[test]
fn memory_write_divergence_reports_step() {
    let master = [(1, 0x100, None, Some((0x2000, 1))), (2, 0x104, None, Some((0x2004, 2)))];
    let slave = [(1, 0x100, None, Some((0x2000, 1))), (2, 0x104, None, Some((0x2008, 2)))];
    let v = compare(Cursor::new(trace(&master)), Cursor::new(trace(&slave))).unwrap();
    match v {
        TraceVerdict::Mismatch { count, master, slave } => {
            assert_eq!(count, 2);
            assert_eq!(master.last_mem, Some((0x2004, 2)));
            assert_eq!(slave.last_mem, Some((0x2008, 2)));
        }
        other => panic!("expected a mismatch, got {other:?}"),
    }
}

#[test]
fn shorter_master_is_reported() {
    let long = [(1, 0x100, None, None), (2, 0x104, None, None)];
    let short = [(1, 0x100, None, None)];
    let v = compare(Cursor::new(trace(&short)), Cursor::new(trace(&long))).unwrap();
    assert!(matches!(v, TraceVerdict::UnexpectedEnd { ended: Side::Master, .. }), "{v:?}");
}

#[test]
fn verdict_serializes_with_tag() {
    let recs = [(1, 0x100, None, None)];
    let v = compare(Cursor::new(trace(&recs)), Cursor::new(trace(&recs))).unwrap();
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["verdict"], "match");
}
