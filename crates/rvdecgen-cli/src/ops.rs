use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use rvdecgen::disasm::fmt_decoded;
use rvdecgen::isa::rv32;
use rvdecgen::render::{Artifact, BackendKind};
use rvdecgen::spec::load_specs;
use rvdecgen::{DecodedInstruction, Decoder, DecoderPlan, GenConfig};

/// Compile `spec`, or the built-in RV32 table when absent.
pub fn load_plan(spec: Option<&Path>, cfg: &GenConfig) -> Result<DecoderPlan> {
    let Some(path) = spec else {
        return DecoderPlan::builtin(cfg).context("compiling built-in table");
    };
    let specs = load_specs(path, cfg).with_context(|| format!("loading {}", path.display()))?;
    let catalog = rv32::catalog()?;
    DecoderPlan::compile(&specs, &catalog, cfg).with_context(|| format!("compiling {}", path.display()))
}

/// Edge words of the plan followed by `n` seeded random words.
pub fn sample_words(plan: &DecoderPlan, n: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut words = plan.edge_words();
    words.extend((0..n).map(|_| rng.random::<u32>()));
    words
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub words: usize,
    /// Instructions whose own match word decodes to something else.
    pub shadowed: Vec<String>,
}

/// Strategy equivalence over `words`, plus a self-decode pass over every entry.
pub fn check(plan: &DecoderPlan, words: &[u32]) -> Result<CheckReport> {
    let n = plan.verify_equivalence(words.iter().copied())?;
    let shadowed: Vec<String> = plan
        .instructions()
        .iter()
        .filter(|ip| plan.decode(ip.matched).opcode != ip.opcode)
        .map(|ip| ip.name.clone())
        .collect();
    // shadowing is only possible where the partitioner saw an overlap
    anyhow::ensure!(
        shadowed.is_empty() || !plan.overlaps().is_empty(),
        "entries decode to the wrong opcode without any overlap: {shadowed:?}"
    );
    debug!("{n} words agree, {} shadowed", shadowed.len());
    Ok(CheckReport { words: n, shadowed })
}

/// Render every artifact in memory first; nothing is written if rendering fails.
pub fn render_all(plan: &DecoderPlan, backend: BackendKind, cfg: &GenConfig) -> Vec<Artifact> {
    let be = backend.build(cfg.strategy, &cfg.cpp_namespace);
    let arts = be.render(plan);
    info!("{} backend rendered {} artifacts ({:?})", be.name(), arts.len(), cfg.strategy);
    arts
}

pub fn write_artifacts(arts: &[Artifact], out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let mut written = Vec::with_capacity(arts.len());
    for a in arts {
        let path = a.path_in(out_dir);
        std::fs::write(&path, &a.contents).with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<u32>,
    pub word: u32,
    pub name: String,
    pub text: String,
    pub decoded: DecodedInstruction,
}

impl ListingLine {
    pub fn new(plan: &DecoderPlan, addr: Option<u32>, word: u32) -> Self {
        let decoded = plan.decode(word);
        Self {
            addr,
            word,
            name: plan.name(decoded.opcode).to_string(),
            text: fmt_decoded(plan, &decoded),
            decoded,
        }
    }

    pub fn render(&self) -> String {
        match self.addr {
            Some(pc) => format!("{pc:#010x}: {:08x}  {}", self.word, self.text),
            None => format!("{:#010x}: {}", self.word, self.text),
        }
    }
}
