//! The Rust decoders `rvdecgen` emits for its built-in RV32 table, one
//! module per dispatch strategy, compiled as ordinary crate code.

pub mod hashed {
    pub mod opcodes {
        include!(concat!(env!("OUT_DIR"), "/hashed/opcodes.rs"));
    }
    pub mod decoder {
        include!(concat!(env!("OUT_DIR"), "/hashed/decoder.rs"));
    }
}

pub mod ordered {
    pub mod opcodes {
        include!(concat!(env!("OUT_DIR"), "/ordered/opcodes.rs"));
    }
    pub mod decoder {
        include!(concat!(env!("OUT_DIR"), "/ordered/decoder.rs"));
    }
}
