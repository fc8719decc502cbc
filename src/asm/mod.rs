//! Loader and disassembler for register machine programs.
//!
//! This module provides:
//! - A two-pass assembler (source text → [`Program`](crate::cpu::Program))
//! - A disassembler (instructions → re-loadable listing)

pub mod assembler;
pub mod disasm;

pub use assembler::{assemble, LoadError};
pub use disasm::disassemble;
