//! # bytecpu
//!
//! An emulator for a small 8-bit register machine, driven one instruction at
//! a time.
//!
//! Source text goes through the loader ([`asm::assemble`]) into a checked
//! [`cpu::Program`]; the engine ([`cpu::Cpu`]) executes it step by step and
//! reports what every step changed. [`Emulator`] ties the two together for a
//! presentation layer.

pub mod asm;
pub mod config;
pub mod cpu;
pub mod emulator;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use asm::{assemble, disassemble, LoadError};
pub use config::{ConfigError, MachineConfig};
pub use cpu::{Cpu, CpuState, Flags, Instruction, MachineState, MemoryAccess, StepError, StepRecord};
pub use emulator::Emulator;
