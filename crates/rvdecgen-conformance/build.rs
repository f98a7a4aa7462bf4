use std::path::PathBuf;

use rvdecgen::render::{Backend, RustBackend};
use rvdecgen::{DecoderPlan, GenConfig, Strategy};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    let out = PathBuf::from(std::env::var("OUT_DIR").expect("cargo sets OUT_DIR"));
    let plan = DecoderPlan::builtin(&GenConfig::default()).expect("built-in table compiles");
    for (name, strategy) in [("hashed", Strategy::Hashed), ("ordered", Strategy::Ordered)] {
        let dir = out.join(name);
        std::fs::create_dir_all(&dir).expect("create output dir");
        for a in RustBackend::new(strategy).render(&plan) {
            std::fs::write(a.path_in(&dir), a.contents).expect("write generated source");
        }
    }
}
