use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use rvdecgen::trace::compare;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compare two simulator execution traces in lock-step")]
struct Opts {
    /// Reference trace
    #[arg(long, value_name = "FILE")]
    master: PathBuf,
    /// Trace under test
    #[arg(long, value_name = "FILE")]
    slave: PathBuf,
    /// Print the verdict as JSON
    #[arg(long)]
    json: bool,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufReader::new(f))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let verdict = compare(open(&opts.master)?, open(&opts.slave)?)?;
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("{verdict}");
    }
    if !verdict.is_match() {
        std::process::exit(1);
    }
    Ok(())
}
