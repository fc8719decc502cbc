//! The emulator facade.
//!
//! [`Emulator`] is the single entry point a presentation layer drives: load
//! source text, step, inspect, reset. Each instance owns its machine outright,
//! so any number of emulators can run side by side.

use crate::asm::{assemble, LoadError};
use crate::config::{ConfigError, MachineConfig};
use crate::cpu::{Cpu, CpuState, Program, StepError};
use crate::cpu::snapshot::{MachineState, StepRecord};

/// A machine plus the loader configured for it.
#[derive(Debug, Clone)]
pub struct Emulator {
    cpu: Cpu,
    config: MachineConfig,
}

impl Emulator {
    /// Create an emulator for the standard machine with no program loaded.
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            config: MachineConfig::default(),
        }
    }

    /// Create an emulator for a custom machine.
    pub fn with_config(config: MachineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            cpu: Cpu::with_config(config)?,
            config,
        })
    }

    /// Assemble `source` and install it, resetting the machine.
    ///
    /// Returns the number of instructions loaded. On error the machine,
    /// including any previously loaded program, is left exactly as it was.
    pub fn load(&mut self, source: &str) -> Result<usize, LoadError> {
        let program = assemble(source, &self.config).map_err(|err| {
            tracing::debug!(error = %err, "load rejected");
            err
        })?;
        let len = program.len();
        self.cpu.load_program(program);
        Ok(len)
    }

    /// Execute one instruction. See [`Cpu::step`].
    pub fn step(&mut self) -> Result<Option<StepRecord>, StepError> {
        self.cpu.step()
    }

    /// Return the machine to power-on state, keeping the loaded program.
    pub fn reset(&mut self) {
        self.cpu.reset();
        tracing::debug!("machine reset");
    }

    /// An owned snapshot of the whole machine.
    pub fn state(&self) -> MachineState {
        MachineState::capture(&self.cpu)
    }

    /// True once the machine halted or faulted.
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    pub fn status(&self) -> CpuState {
        self.cpu.state
    }

    pub fn program(&self) -> &Program {
        &self.cpu.program
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Instructions executed since the last load or reset.
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reports_count() {
        let mut emu = Emulator::new();
        assert_eq!(emu.load("MOVEI R0, 1\nHALT"), Ok(2));
        assert_eq!(emu.program().len(), 2);
        assert_eq!(emu.status(), CpuState::Ready);
    }

    #[test]
    fn test_failed_load_keeps_previous_program() {
        let mut emu = Emulator::new();
        emu.load("MOVEI R0, 7\nHALT").unwrap();
        emu.step().unwrap();
        let before = emu.state();

        assert!(emu.load("MOVEI R0, 1\nBOGUS R0").is_err());

        assert_eq!(emu.state(), before);
    }

    #[test]
    fn test_load_resets_machine() {
        let mut emu = Emulator::new();
        emu.load("MOVEI R0, 7\nHALT").unwrap();
        emu.step().unwrap();
        emu.step().unwrap();
        assert!(emu.is_halted());

        emu.load("HALT").unwrap();

        assert!(!emu.is_halted());
        assert_eq!(emu.state().registers[0], 0);
        assert_eq!(emu.cycles(), 0);
    }

    #[test]
    fn test_reset_reruns_same_program() {
        let mut emu = Emulator::new();
        emu.load("MOVEI R0, 3\nMOVEM R0, 10").unwrap();
        while emu.step().unwrap().is_some() {}
        assert_eq!(emu.state().data_memory[10], 3);

        emu.reset();
        let state = emu.state();
        assert_eq!(state.program_counter, 0);
        assert_eq!(state.data_memory[10], 0);
        assert_eq!(state.program.len(), 2);
        assert!(!emu.is_halted());
    }

    #[test]
    fn test_with_config_validates() {
        let config = MachineConfig {
            register_count: 17,
            ..MachineConfig::default()
        };
        assert!(matches!(Emulator::with_config(config), Err(ConfigError::Invalid(_))));

        let config = MachineConfig {
            register_count: 8,
            stack_top: 0x7F,
        };
        let emu = Emulator::with_config(config).unwrap();
        assert_eq!(emu.state().registers.len(), 8);
        assert_eq!(emu.state().stack_pointer, 0x7F);
    }
}
