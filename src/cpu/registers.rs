//! Register file and status flags.
//!
//! The machine has a small bank of 8-bit general purpose registers
//! (`R0..Rn-1`) and four independent status flags:
//! - zero: the last flag-defining result truncated to 0
//! - carry: the untruncated result left the 0..=255 range
//! - sign: bit 7 of the truncated result
//! - overflow: two's-complement overflow of the last add/subtract
//!
//! R0 and R1 double as the low and high bytes of a 16-bit "super register"
//! that receives widening multiply results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of registers on a default machine.
pub const DEFAULT_REGISTER_COUNT: usize = 4;

/// Largest register bank a machine may be configured with.
pub const MAX_REGISTER_COUNT: usize = 16;

/// Smallest register bank; the super register needs R0 and R1.
pub const MIN_REGISTER_COUNT: usize = 2;

/// A register index as written in source (`R0`, `R1`, ...).
///
/// The loader checks every `Reg` it emits against the configured register
/// count; the engine faults on any other out-of-bank register before
/// touching the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reg(u8);

impl Reg {
    /// Low byte of the super register.
    pub const R0: Reg = Reg(0);
    /// High byte of the super register.
    pub const R1: Reg = Reg(1);

    /// Create a register reference without range checking.
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Index into the register file.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Parse a register name such as `R3` or `r3`.
    pub fn parse(token: &str) -> Option<Self> {
        let digits = token.strip_prefix('R').or_else(|| token.strip_prefix('r'))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u8>().ok().map(Self)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// The four status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    pub zero: bool,
    pub carry: bool,
    pub sign: bool,
    pub overflow: bool,
}

impl Flags {
    /// Flag names in reporting order.
    pub const NAMES: [&'static str; 4] = ["zero", "carry", "sign", "overflow"];

    /// Flag values in the same order as [`Flags::NAMES`].
    pub fn values(&self) -> [bool; 4] {
        [self.zero, self.carry, self.sign, self.overflow]
    }
}

/// The general purpose register bank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    regs: Vec<u8>,
}

impl Registers {
    /// Create a register bank of `count` registers, all zero.
    pub fn new(count: usize) -> Self {
        Self {
            regs: vec![0; count],
        }
    }

    /// Number of registers.
    pub fn count(&self) -> usize {
        self.regs.len()
    }

    /// Read a register.
    ///
    /// # Panics
    /// Panics if `reg` is outside the bank.
    #[inline]
    pub fn get(&self, reg: Reg) -> u8 {
        self.regs[reg.index()]
    }

    /// Write a register.
    ///
    /// # Panics
    /// Panics if `reg` is outside the bank.
    #[inline]
    pub fn set(&mut self, reg: Reg, value: u8) {
        self.regs[reg.index()] = value;
    }

    /// Write the R1:R0 super register (low byte in R0, high byte in R1).
    pub fn set_wide(&mut self, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.set(Reg::R0, low);
        self.set(Reg::R1, high);
    }

    /// All register values, `R0` first.
    pub fn values(&self) -> &[u8] {
        &self.regs
    }

    /// Zero every register.
    pub fn reset(&mut self) {
        self.regs.fill(0);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTER_COUNT)
    }
}
