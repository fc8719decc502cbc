//! Data and program memory.
//!
//! The two address spaces are independent. Data memory is 256 byte cells,
//! addressed by an 8-bit value, and also holds the stack. Program memory is
//! an ordered list of decoded instructions written once at load time.

use crate::cpu::decode::Instruction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of data memory cells.
pub const MEMORY_SIZE: usize = 256;

/// The maximum number of instructions in program memory.
pub const PROGRAM_CAPACITY: usize = 256;

/// Data memory: 256 byte cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read a cell. Every 8-bit address is valid.
    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.cells[usize::from(addr)]
    }

    /// Write a cell.
    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) {
        self.cells[usize::from(addr)] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// All cells, address 0 first.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Program memory: the decoded instructions of the loaded program.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Install a list of instructions, checking it fits program memory.
    pub fn new(instructions: Vec<Instruction>) -> Result<Self, MemoryError> {
        if instructions.len() > PROGRAM_CAPACITY {
            return Err(MemoryError::ProgramTooLarge {
                size: instructions.len(),
                available: PROGRAM_CAPACITY,
            });
        }
        Ok(Self { instructions })
    }

    /// The instruction at `pc`, or `None` past the end of the program.
    #[inline]
    pub fn fetch(&self, pc: u16) -> Option<&Instruction> {
        self.instructions.get(usize::from(pc))
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instructions in address order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

/// Errors that can occur when installing a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
