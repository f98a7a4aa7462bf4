use std::path::PathBuf;

use crate::Word;

/// Malformed bit-range or catalog entry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("bit range {msb}..{lsb} has msb < lsb")]
    InvertedRange { msb: u32, lsb: u32 },
    #[error("bit {bit} is outside a {width}-bit word")]
    BitOutOfRange { bit: u32, width: u32 },
    #[error("destination shift {shift} is not below word width {width}")]
    ShiftOutOfRange { shift: u32, width: u32 },
    #[error("register field `{name}` must not be relocated")]
    ShiftedRegister { name: String },
    #[error("register field `{name}` is {width} bits but its slot holds {capacity}")]
    SlotTooNarrow { name: String, width: u32, capacity: u32 },
    #[error("immediate field `{name}` has no fragments")]
    NoFragments { name: String },
    #[error("fragments of immediate field `{name}` overlap once placed")]
    OverlappingFragments { name: String },
    #[error("field `{name}` is defined twice")]
    Duplicate { name: String },
}

/// Fatal compile-time errors. Any of these aborts the whole compilation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("constraint violation in `{instruction}` field `{field}`: {reason}")]
    ConstraintViolation { instruction: String, field: String, reason: String },
    #[error("unknown field `{field}` in `{instruction}`")]
    UnknownField { instruction: String, field: String },
    #[error("`{second}` duplicates `{first}` (mask {mask:#010x}, match {matched:#010x})")]
    Conflict { first: String, second: String, mask: Word, matched: Word },
    #[error("`{instruction}`: match {matched:#010x} sets bits outside mask {mask:#010x}")]
    MatchMaskInconsistency { instruction: String, mask: Word, matched: Word },
    #[error("`{first}` and `{second}` both match {witness:#010x}")]
    AmbiguousEncoding { first: String, second: String, witness: Word },
    #[error("`{first}` and `{second}` both render as `{ident}`")]
    DuplicateName { first: String, second: String, ident: String },
    #[error("instruction with mask {mask:#010x}, match {matched:#010x} has no usable name")]
    EmptyName { mask: Word, matched: Word },
    #[error("{count} instructions exceed the 16-bit opcode space")]
    TooManyInstructions { count: usize },
    #[error("invalid field catalog: {0}")]
    Catalog(#[from] FieldError),
}

/// Errors raised while reading an instruction table.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("malformed instruction table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{instruction}`: bad {what} literal `{literal}`")]
    BadNumber { instruction: String, what: &'static str, literal: String },
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Errors raised while scanning execution traces.
#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("trace I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("trace is empty (missing preamble)")]
    MissingPreamble,
    #[error("line {line}: bad number `{literal}`")]
    BadNumber { line: usize, literal: String },
    #[error("trace pattern: {0}")]
    Pattern(#[from] regex::Error),
}
