//! Lock-step comparison of two execution traces.
//!
//! A trace opens with one preamble line, followed by records made of
//! `NUM=<n>`, `PC=0x<hex>`, `x<n>=0x<hex>` and `M[0x<hex>]=0x<hex>` lines.
//! A line of dashes closes a record. Each update step consumes
//! lines until one of them changes the state, a record ends, or the input
//! runs out.

use std::fmt;
use std::io::BufRead;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::TraceError;

struct Patterns {
    separator: Regex,
    count: Regex,
    pc: Regex,
    reg: Regex,
    mem: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            separator: Regex::new(r"^-+")?,
            count: Regex::new(r"^NUM=([0-9]+)")?,
            pc: Regex::new(r"^PC=0x([0-9A-Fa-f]+)")?,
            reg: Regex::new(r"^x([0-9]+)=0x([0-9A-Fa-f]+)")?,
            mem: Regex::new(r"^M\[0x([0-9A-Fa-f]+)\]=0x([0-9A-Fa-f]+)")?,
        })
    }
}

/// Architectural state visible in a trace, as of the last update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub count: u64,
    pub pc: u64,
    pub last_reg: Option<(u32, u64)>,
    pub last_mem: Option<(u64, u64)>,
}

impl Snapshot {
    /// Same PC and same last register/memory writes. The count is compared separately.
    fn same_effects(&self, other: &Snapshot) -> bool {
        self.pc == other.pc && self.last_reg == other.last_reg && self.last_mem == other.last_mem
    }
}

pub struct TraceState<R> {
    input: R,
    line_no: usize,
    state: Snapshot,
    eof: bool,
}

impl<R: BufRead> TraceState<R> {
    /// Consume the preamble line.
    pub fn new(mut input: R) -> Result<Self, TraceError> {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(TraceError::MissingPreamble);
        }
        Ok(Self { input, line_no: 1, state: Snapshot::default(), eof: false })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    fn update(&mut self, pats: &Patterns) -> Result<(), TraceError> {
        let mut line = String::new();
        while !self.eof {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                self.eof = true;
                break;
            }
            self.line_no += 1;
            let l = line.trim_end();
            if pats.separator.is_match(l) {
                break;
            }
            if let Some(c) = pats.count.captures(l) {
                self.state.count = self.num(&c[1], 10)?;
                break;
            }
            if let Some(c) = pats.pc.captures(l) {
                self.state.pc = self.num(&c[1], 16)?;
                break;
            }
            if let Some(c) = pats.reg.captures(l) {
                let reg = self.num(&c[1], 10)?;
                let reg = u32::try_from(reg).map_err(|_| self.bad(&c[1]))?;
                self.state.last_reg = Some((reg, self.num(&c[2], 16)?));
                break;
            }
            if let Some(c) = pats.mem.captures(l) {
                self.state.last_mem = Some((self.num(&c[1], 16)?, self.num(&c[2], 16)?));
                break;
            }
        }
        Ok(())
    }

    fn num(&self, literal: &str, radix: u32) -> Result<u64, TraceError> {
        u64::from_str_radix(literal, radix).map_err(|_| self.bad(literal))
    }

    fn bad(&self, literal: &str) -> TraceError {
        TraceError::BadNumber { line: self.line_no, literal: literal.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Master,
    Slave,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Master => "master",
            Side::Slave => "slave",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum TraceVerdict {
    Match { steps: usize },
    /// Instruction counts diverged; `ended` is the side that ran out first.
    UnexpectedEnd { ended: Side, master: Snapshot, slave: Snapshot },
    Mismatch { count: u64, master: Snapshot, slave: Snapshot },
}

impl TraceVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, TraceVerdict::Match { .. })
    }
}

impl fmt::Display for TraceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceVerdict::Match { steps } => write!(f, "Successfully compared ({steps} steps)"),
            TraceVerdict::UnexpectedEnd { ended, .. } => {
                write!(f, "Comparison failed: {ended} unexpected end of trace")
            }
            TraceVerdict::Mismatch { count, master, slave } => write!(
                f,
                "Comparison failed: Mismatch at NUM = {count} (master pc {:#x}, slave pc {:#x})",
                master.pc, slave.pc
            ),
        }
    }
}

/// Step both traces together until they diverge or both are exhausted.
pub fn compare<M: BufRead, S: BufRead>(master: M, slave: S) -> Result<TraceVerdict, TraceError> {
    let pats = Patterns::new()?;
    let mut m = TraceState::new(master)?;
    let mut s = TraceState::new(slave)?;
    let mut steps = 0;
    while !(m.is_eof() && s.is_eof()) {
        m.update(&pats)?;
        s.update(&pats)?;
        steps += 1;
        let (a, b) = (*m.snapshot(), *s.snapshot());
        if a.count != b.count {
            let ended = if m.is_eof() { Side::Master } else { Side::Slave };
            debug!("count diverged after {steps} steps: master {} slave {}", a.count, b.count);
            return Ok(TraceVerdict::UnexpectedEnd { ended, master: a, slave: b });
        }
        if !a.same_effects(&b) {
            return Ok(TraceVerdict::Mismatch { count: a.count, master: a, slave: b });
        }
    }
    Ok(TraceVerdict::Match { steps })
}
