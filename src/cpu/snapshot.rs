//! Machine state snapshots and per-step change records.
//!
//! A [`StepRecord`] is assembled fresh by every executed instruction. The
//! engine captures a [`RegisterSnapshot`] before executing and diffs it
//! against the live registers and flags afterwards, so the record names
//! exactly the elements the instruction changed.

use crate::cpu::decode::Instruction;
use crate::cpu::execute::{Cpu, CpuState};
use crate::cpu::registers::{Flags, Reg, Registers};
use serde::{Deserialize, Serialize};

/// Direction of a data memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Read,
    Write,
}

/// The data memory cell an instruction touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAccess {
    pub address: u8,
    pub direction: AccessKind,
    pub value: u8,
}

impl MemoryAccess {
    pub fn read(address: u8, value: u8) -> Self {
        Self {
            address,
            direction: AccessKind::Read,
            value,
        }
    }

    pub fn write(address: u8, value: u8) -> Self {
        Self {
            address,
            direction: AccessKind::Write,
            value,
        }
    }
}

/// What one executed instruction did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Canonical text of the executed instruction.
    pub instruction: String,
    /// Program address the instruction was fetched from.
    pub address: u16,
    /// Registers whose value differs from before the step, `R0` first.
    pub changed_registers: Vec<String>,
    /// Flags whose value differs from before the step, in `Flags::NAMES` order.
    pub changed_flags: Vec<String>,
    pub memory_access: Option<MemoryAccess>,
    /// Stack pointer after the step.
    pub stack_pointer: u8,
    pub halted: bool,
}

/// Register and flag values captured before an instruction executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSnapshot {
    registers: Vec<u8>,
    flags: Flags,
}

impl RegisterSnapshot {
    pub fn capture(regs: &Registers, flags: Flags) -> Self {
        Self {
            registers: regs.values().to_vec(),
            flags,
        }
    }

    /// Names of the registers and flags that differ from `regs`/`flags`.
    pub fn diff(&self, regs: &Registers, flags: Flags) -> (Vec<String>, Vec<String>) {
        (
            changed_registers(&self.registers, regs.values()),
            changed_flags(self.flags, flags),
        )
    }
}

/// Names of the registers whose values differ, in index order.
pub fn changed_registers(before: &[u8], after: &[u8]) -> Vec<String> {
    before
        .iter()
        .zip(after)
        .enumerate()
        .filter(|(_, (old, new))| old != new)
        .map(|(index, _)| Reg::new(index as u8).to_string())
        .collect()
}

/// Names of the flags whose values differ, in [`Flags::NAMES`] order.
pub fn changed_flags(before: Flags, after: Flags) -> Vec<String> {
    Flags::NAMES
        .iter()
        .zip(before.values().into_iter().zip(after.values()))
        .filter(|(_, (old, new))| old != new)
        .map(|(name, _)| (*name).to_string())
        .collect()
}

/// An owned copy of the whole machine state.
///
/// Nothing in a `MachineState` aliases the engine, so callers may keep or
/// mutate it freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    pub program_counter: u16,
    pub stack_pointer: u8,
    pub registers: Vec<u8>,
    pub flags: Flags,
    pub data_memory: Vec<u8>,
    pub program: Vec<Instruction>,
    pub status: CpuState,
}

impl MachineState {
    pub fn capture(cpu: &Cpu) -> Self {
        Self {
            program_counter: cpu.pc,
            stack_pointer: cpu.sp,
            registers: cpu.regs.values().to_vec(),
            flags: cpu.flags,
            data_memory: cpu.mem.cells().to_vec(),
            program: cpu.program.instructions().to_vec(),
            status: cpu.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_registers() {
        assert_eq!(changed_registers(&[0, 1, 2, 3], &[0, 9, 2, 4]), vec!["R1", "R3"]);
        assert!(changed_registers(&[5, 5], &[5, 5]).is_empty());
    }

    #[test]
    fn test_changed_flags_only_reports_differences() {
        let before = Flags {
            zero: true,
            carry: true,
            ..Flags::default()
        };
        let after = Flags {
            zero: true,
            sign: true,
            ..Flags::default()
        };
        assert_eq!(changed_flags(before, after), vec!["carry", "sign"]);
        assert!(changed_flags(after, after).is_empty());
    }

    #[test]
    fn test_snapshot_diff() {
        let mut regs = Registers::new(4);
        let snapshot = RegisterSnapshot::capture(&regs, Flags::default());

        regs.set(Reg::new(2), 7);
        let flags = Flags {
            overflow: true,
            ..Flags::default()
        };
        let (registers, flags) = snapshot.diff(&regs, flags);

        assert_eq!(registers, vec!["R2"]);
        assert_eq!(flags, vec!["overflow"]);
    }

    #[test]
    fn test_state_is_independent_copy() {
        let cpu = Cpu::new();
        let mut state = MachineState::capture(&cpu);
        state.registers[0] = 99;
        state.data_memory[0] = 99;

        assert_eq!(cpu.regs.values()[0], 0);
        assert_eq!(cpu.mem.read(0), 0);
    }

    #[test]
    fn test_access_serializes_lowercase() {
        let json = serde_json::to_string(&MemoryAccess::write(0, 22)).unwrap();
        assert_eq!(json, r#"{"address":0,"direction":"write","value":22}"#);
    }
}
