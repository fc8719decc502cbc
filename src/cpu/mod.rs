//! CPU emulation for the 8-bit register machine.
//!
//! - 2 to 16 byte registers (4 by default); R1:R0 form a 16-bit super register
//! - 256 cells of data memory shared with a downward-growing stack
//! - up to 256 instructions of program memory, executed one step at a time

pub mod alu;
pub mod decode;
pub mod execute;
pub mod memory;
pub mod registers;
pub mod snapshot;

pub use decode::{Instruction, Mnemonic, OperandSource};
pub use execute::{Cpu, CpuState, StepError};
pub use memory::{Memory, Program};
pub use registers::{Flags, Reg, Registers};
pub use snapshot::{AccessKind, MachineState, MemoryAccess, StepRecord};
