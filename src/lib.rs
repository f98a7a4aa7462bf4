pub mod assemble;
pub mod config;
pub mod decoder;
pub mod disasm;
pub mod error;
pub mod field;
pub mod partition;
pub mod render;
pub mod rules;
pub mod spec;
pub mod trace;

pub mod isa {
    pub mod rv32; // RV32IMAF subset, riscv-opcodes field names
}

/// Raw instruction word.
pub type Word = u32;

pub use assemble::{DecoderPlan, Divergence};
pub use config::{GenConfig, Strategy};
pub use decoder::{DecodedInstruction, Decoder, Opcode};
pub use error::{CompileError, FieldError, LoadError, TraceError};
pub use spec::{InstructionSpec, SpecFlags};
