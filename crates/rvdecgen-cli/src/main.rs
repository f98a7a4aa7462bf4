use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use rvdecgen::render::BackendKind;
use rvdecgen::{DecoderPlan, GenConfig, Strategy};
use rvdecgen_cli::{check, load_plan, load_raw_bin, parse_number, render_all, sample_words, write_artifacts, ListingLine};

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile riscv-opcodes tables into RISC-V decoders", long_about=None)]
struct Cli {
    /// Instruction table (riscv-opcodes instr_dict.json); built-in RV32 table if omitted
    #[arg(long, global = true, value_name = "FILE")]
    spec: Option<PathBuf>,
    /// Generator configuration (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Reject tables whose mask groups overlap
    #[arg(long, global = true)]
    strict: bool,
    /// Subcommand
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile, verify and write decoder sources
    Gen {
        #[arg(long, value_enum, default_value_t = BackendArg::Rust)]
        backend: BackendArg,
        /// Dispatch shape (default: from config)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// C++ namespace (default: from config)
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
        /// Also dump the compiled plan as JSON
        #[arg(long, value_name = "FILE")]
        plan_json: Option<PathBuf>,
    },
    /// Decode hex words or a raw binary
    Decode {
        /// Instruction words (0x, 0b, 0o or decimal)
        #[arg(value_name = "WORD", conflicts_with = "bin")]
        words: Vec<String>,
        /// Raw little-endian binary to decode instead
        #[arg(long, value_name = "BINFILE")]
        bin: Option<PathBuf>,
        /// Load address for the binary (0x, 0b, 0o or decimal)
        #[arg(long, default_value = "0")]
        base: String,
        /// Skip N bytes at start of file before loading
        #[arg(long, default_value_t = 0usize)]
        skip: usize,
        /// Limit bytes loaded (default: to EOF after --skip)
        #[arg(long)]
        len: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the opcode table and mask groups
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Verify that ordered and hashed dispatch agree
    Check {
        /// Random words on top of the edge words (default: from config)
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat { Text, Json }

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg { Rust, Cpp }

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Rust => BackendKind::Rust,
            BackendArg::Cpp => BackendKind::Cpp,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg { Ordered, Hashed }

impl From<StrategyArg> for Strategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Ordered => Strategy::Ordered,
            StrategyArg::Hashed => Strategy::Hashed,
        }
    }
}

fn load_config(path: Option<&Path>, strict: bool) -> Result<GenConfig> {
    let mut cfg = match path {
        Some(p) => GenConfig::load(p)?,
        None => GenConfig::default(),
    };
    cfg.strict_overlaps |= strict;
    Ok(cfg)
}

fn print_listing(lines: &[ListingLine], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(lines)?),
        OutputFormat::Text => {
            for l in lines {
                println!("{}", l.render());
            }
        }
    }
    Ok(())
}

fn print_table(plan: &DecoderPlan) {
    println!("catalog {}", plan.catalog_version());
    println!("{:<6} {:<14} {:<12} {:<12}", "op", "name", "mask", "match");
    for ip in plan.instructions() {
        println!("{:<6} {:<14} {:#010x}   {:#010x}", ip.opcode.0, ip.name, ip.mask, ip.matched);
    }
    println!("\nMask groups:");
    for g in plan.groups() {
        println!("  {:#010x}: {} entries", g.mask, g.len());
    }
    for o in plan.overlaps() {
        println!(
            "  overlap: {} / {} (witness {:#010x})",
            plan.instructions()[o.first].name,
            plan.instructions()[o.second].name,
            o.witness
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref(), cli.strict)?;

    match cli.cmd {
        Command::Gen { backend, strategy, namespace, out_dir, plan_json } => {
            if let Some(s) = strategy {
                cfg.strategy = s.into();
            }
            if let Some(ns) = namespace {
                cfg.cpp_namespace = ns;
            }
            let plan = load_plan(cli.spec.as_deref(), &cfg)?;
            check(&plan, &sample_words(&plan, cfg.sample_words, cfg.seed))?;

            let arts = render_all(&plan, backend.into(), &cfg);
            let plan_text = match &plan_json {
                Some(_) => Some(serde_json::to_string_pretty(&plan)?),
                None => None,
            };
            for path in write_artifacts(&arts, &out_dir)? {
                println!("wrote {}", path.display());
            }
            if let (Some(path), Some(text)) = (plan_json, plan_text) {
                std::fs::write(&path, text)?;
                println!("wrote {}", path.display());
            }
        }
        Command::Decode { words, bin, base, skip, len, format } => {
            let plan = load_plan(cli.spec.as_deref(), &cfg)?;
            let lines: Vec<ListingLine> = match bin {
                Some(path) => {
                    let img = load_raw_bin(&path, parse_number(&base)?, skip, len)?;
                    img.words().map(|(pc, w)| ListingLine::new(&plan, Some(pc), w)).collect()
                }
                None => {
                    anyhow::ensure!(!words.is_empty(), "give instruction words or --bin");
                    let mut v = Vec::with_capacity(words.len());
                    for w in &words {
                        v.push(ListingLine::new(&plan, None, parse_number(w)?));
                    }
                    v
                }
            };
            print_listing(&lines, format)?;
        }
        Command::List { format } => {
            let plan = load_plan(cli.spec.as_deref(), &cfg)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Text => print_table(&plan),
            }
        }
        Command::Check { samples, seed } => {
            let plan = load_plan(cli.spec.as_deref(), &cfg)?;
            let words = sample_words(&plan, samples.unwrap_or(cfg.sample_words), seed.unwrap_or(cfg.seed));
            let report = check(&plan, &words)?;
            println!(
                "{} instructions, {} mask groups: {} words agree across strategies",
                plan.instructions().len(),
                plan.groups().len(),
                report.words
            );
            for name in &report.shadowed {
                println!("  shadowed: {name}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn gen_flags_parse() {
        let cli = Cli::try_parse_from([
            "rvdecgen", "gen", "--backend", "cpp", "--strategy", "ordered", "--out-dir", "out", "--strict",
        ])
        .unwrap();
        assert!(cli.strict);
        assert!(matches!(
            cli.cmd,
            Command::Gen { backend: BackendArg::Cpp, strategy: Some(StrategyArg::Ordered), .. }
        ));
    }

    #[test]
    fn decode_words_and_bin_conflict() {
        assert!(Cli::try_parse_from(["rvdecgen", "decode", "0x33", "--bin", "x.bin"]).is_err());
    }

    #[test]
    fn decode_accepts_binary_words() {
        let cli = Cli::try_parse_from(["rvdecgen", "decode", "0b0110011", "0x0031_00b3"]).unwrap();
        let Command::Decode { words, .. } = cli.cmd else { panic!("expected decode") };
        let parsed: Vec<u32> = words.iter().map(|w| parse_number(w).unwrap()).collect();
        assert_eq!(parsed, vec![0x33, 0x003100B3]);
    }

    #[test]
    fn strict_flag_overrides_config() {
        let cfg = load_config(None, true).unwrap();
        assert!(cfg.strict_overlaps);
    }
}
