//! Source emitters for a compiled [`DecoderPlan`].
//!
//! Backends only read the plan; they never see the instruction table or
//! the field catalog. Every artifact is produced in memory, so a caller can
//! render everything before touching the filesystem.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assemble::DecoderPlan;
use crate::config::Strategy;
use crate::Word;

mod cpp;
mod rust;

pub use cpp::CppBackend;
pub use rust::RustBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Opcodes,
    Decoder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// File name relative to the output directory.
    pub file_name: String,
    pub contents: String,
}

impl Artifact {
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }
}

pub trait Backend {
    fn name(&self) -> &'static str;
    fn render(&self, plan: &DecoderPlan) -> Vec<Artifact>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Rust,
    Cpp,
}

impl BackendKind {
    pub fn build(self, strategy: Strategy, cpp_namespace: &str) -> Box<dyn Backend> {
        match self {
            BackendKind::Rust => Box::new(RustBackend::new(strategy)),
            BackendKind::Cpp => Box::new(CppBackend::new(strategy, cpp_namespace)),
        }
    }
}

pub(crate) const HEADER: &str = "autogenerated by rvdecgen from a riscv-opcodes instruction table; do not edit";

pub(crate) fn bin32(w: Word) -> String {
    format!("0b{w:032b}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;

    #[test]
    fn every_backend_emits_both_artifacts() {
        let plan = DecoderPlan::builtin(&GenConfig::default()).unwrap();
        for kind in [BackendKind::Rust, BackendKind::Cpp] {
            for strategy in [Strategy::Ordered, Strategy::Hashed] {
                let arts = kind.build(strategy, "sim").render(&plan);
                assert!(arts.iter().any(|a| a.kind == ArtifactKind::Opcodes), "{kind:?}");
                assert!(arts.iter().any(|a| a.kind == ArtifactKind::Decoder), "{kind:?}");
                assert!(arts.iter().all(|a| !a.contents.is_empty()));
            }
        }
    }

    #[test]
    fn bin32_is_padded() {
        assert_eq!(bin32(0x33), "0b00000000000000000000000000110011");
    }
}
