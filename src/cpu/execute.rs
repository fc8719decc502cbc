//! CPU execution engine.
//!
//! Implements the fetch-decode-execute cycle one instruction at a time and
//! all instruction behaviors.

use crate::config::{ConfigError, MachineConfig};
use crate::cpu::alu;
use crate::cpu::decode::{Instruction, Operand};
use crate::cpu::memory::{Memory, Program};
use crate::cpu::registers::{Flags, Reg, Registers};
use crate::cpu::snapshot::{MemoryAccess, RegisterSnapshot, StepRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// A program is installed and the next step will execute.
    Ready,
    /// Executed HALT or ran past the last instruction.
    Halted,
    /// A step failed; the run is over until reset.
    Faulted,
}

/// What an executed instruction asks of the step that ran it.
#[derive(Debug, Default)]
struct Effect {
    /// Explicit next PC for a taken jump, CALL or RET.
    jump: Option<u8>,
    memory_access: Option<MemoryAccess>,
    halt: bool,
}

impl Effect {
    fn jump(target: u8) -> Self {
        Self {
            jump: Some(target),
            ..Self::default()
        }
    }

    fn jump_if(taken: bool, target: u8) -> Self {
        Self {
            jump: taken.then_some(target),
            ..Self::default()
        }
    }

    fn access(access: MemoryAccess) -> Self {
        Self {
            memory_access: Some(access),
            ..Self::default()
        }
    }
}

/// The machine.
#[derive(Clone)]
pub struct Cpu {
    /// General purpose registers.
    pub regs: Registers,
    /// Status flags.
    pub flags: Flags,
    /// Data memory (also holds the stack).
    pub mem: Memory,
    /// Program memory.
    pub program: Program,
    /// Program counter: index into program memory.
    pub pc: u16,
    /// Stack pointer: next free cell of the stack.
    pub sp: u8,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed since the last reset.
    pub cycles: u64,
    config: MachineConfig,
}

impl Cpu {
    /// Create a machine with the default configuration and no program.
    pub fn new() -> Self {
        Self::build(MachineConfig::default())
    }

    /// Create a machine with a custom configuration and no program.
    pub fn with_config(config: MachineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MachineConfig) -> Self {
        Self {
            regs: Registers::new(config.register_count),
            flags: Flags::default(),
            mem: Memory::new(),
            program: Program::default(),
            pc: 0,
            sp: config.stack_top,
            state: CpuState::Ready,
            cycles: 0,
            config,
        }
    }

    /// The configuration this machine was built with.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Return every register, flag and memory cell to power-on defaults.
    ///
    /// The installed program is kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.flags = Flags::default();
        self.mem.clear();
        self.pc = 0;
        self.sp = self.config.stack_top;
        self.state = CpuState::Ready;
        self.cycles = 0;
    }

    /// Reset the machine and install a new program.
    pub fn load_program(&mut self, program: Program) {
        self.reset();
        self.program = program;
        tracing::debug!(instructions = self.program.len(), "program installed");
    }

    /// Execute a single instruction.
    ///
    /// Returns `Ok(None)` without doing anything once the machine is halted
    /// or faulted. Running past the last instruction halts the machine and
    /// also returns `Ok(None)`. A failed step leaves the machine state as it
    /// was before the step and moves it to [`CpuState::Faulted`].
    pub fn step(&mut self) -> Result<Option<StepRecord>, StepError> {
        if self.state != CpuState::Ready {
            return Ok(None);
        }

        // Fetch
        let address = self.pc;
        let Some(&instr) = self.program.fetch(address) else {
            tracing::debug!(pc = address, "end of program");
            self.state = CpuState::Halted;
            return Ok(None);
        };

        tracing::trace!(pc = address, instruction = %instr, "step");
        let before = RegisterSnapshot::capture(&self.regs, self.flags);

        // Execute
        let effect = match self.execute(instr, address) {
            Ok(effect) => effect,
            Err(err) => {
                tracing::warn!(pc = address, instruction = %instr, error = %err, "step failed");
                self.state = CpuState::Faulted;
                return Err(err);
            }
        };

        self.pc = match effect.jump {
            Some(target) => u16::from(target),
            None => address + 1,
        };
        if effect.halt {
            self.state = CpuState::Halted;
        }
        self.cycles += 1;

        let (changed_registers, changed_flags) = before.diff(&self.regs, self.flags);

        Ok(Some(StepRecord {
            instruction: instr.to_string(),
            address,
            changed_registers,
            changed_flags,
            memory_access: effect.memory_access,
            stack_pointer: self.sp,
            halted: self.state == CpuState::Halted,
        }))
    }

    /// Execute a decoded instruction fetched from `pc`.
    fn execute(&mut self, instr: Instruction, pc: u16) -> Result<Effect, StepError> {
        if let Some(register) = instr.registers().find(|reg| reg.index() >= self.regs.count()) {
            return Err(StepError::InvalidRegister { pc, register });
        }

        let effect = match instr {
            // ==================== Transfer ====================

            Instruction::MoveI { reg, imm } => {
                self.regs.set(reg, imm);
                Effect::default()
            }

            Instruction::MoveR { reg, addr } => {
                let value = self.mem.read(addr);
                self.regs.set(reg, value);
                Effect::access(MemoryAccess::read(addr, value))
            }

            Instruction::MoveM { reg, addr } => {
                let value = self.regs.get(reg);
                self.mem.write(addr, value);
                Effect::access(MemoryAccess::write(addr, value))
            }

            Instruction::MoveMI { addr, imm } => {
                self.mem.write(addr, imm);
                Effect::access(MemoryAccess::write(addr, imm))
            }

            // ==================== Arithmetic / logic ====================

            Instruction::Alu { op, dst, src } => {
                let operand = self.operand(src);
                let (result, flags) = alu::apply(op, self.regs.get(dst), operand, self.flags)
                    .ok_or(StepError::DivideByZero { pc })?;
                self.regs.set(dst, result);
                self.flags = flags;
                Effect::default()
            }

            Instruction::Mult16 { src } => {
                let operand = self.operand(src);
                let (product, flags) = alu::multiply_wide(self.regs.get(Reg::R0), operand, self.flags);
                self.regs.set_wide(product);
                self.flags = flags;
                Effect::default()
            }

            Instruction::Not { reg } => {
                let (result, flags) = alu::not(self.regs.get(reg), self.flags);
                self.regs.set(reg, result);
                self.flags = flags;
                Effect::default()
            }

            Instruction::Shl { reg } => {
                let (result, flags) = alu::shift_left(self.regs.get(reg), self.flags);
                self.regs.set(reg, result);
                self.flags = flags;
                Effect::default()
            }

            Instruction::Shr { reg } => {
                let (result, flags) = alu::shift_right(self.regs.get(reg), self.flags);
                self.regs.set(reg, result);
                self.flags = flags;
                Effect::default()
            }

            Instruction::Cmp { lhs, rhs } => {
                let operand = self.operand(rhs);
                let (_, flags) = alu::subtract(self.regs.get(lhs), operand, false, self.flags);
                self.flags = flags;
                Effect::default()
            }

            // ==================== Control ====================

            Instruction::Jmp { target } => Effect::jump(target),
            Instruction::Jz { target } => Effect::jump_if(self.flags.zero, target),
            Instruction::Jnz { target } => Effect::jump_if(!self.flags.zero, target),
            Instruction::Je { target } => Effect::jump_if(self.flags.zero, target),
            Instruction::Jne { target } => Effect::jump_if(!self.flags.zero, target),
            Instruction::Jg { target } => Effect::jump_if(
                !self.flags.zero && self.flags.sign == self.flags.overflow,
                target,
            ),
            Instruction::Jge { target } => {
                Effect::jump_if(self.flags.sign == self.flags.overflow, target)
            }
            Instruction::Jl { target } => {
                Effect::jump_if(self.flags.sign != self.flags.overflow, target)
            }

            Instruction::Call { target } => {
                let ret = u8::try_from(pc + 1)
                    .map_err(|_| StepError::ReturnAddressOutOfRange { pc })?;
                let access = self.push(ret, pc)?;
                Effect {
                    jump: Some(target),
                    memory_access: Some(access),
                    halt: false,
                }
            }

            Instruction::Ret => {
                let access = self.pop(pc)?;
                Effect {
                    jump: Some(access.value),
                    memory_access: Some(access),
                    halt: false,
                }
            }

            Instruction::Halt => Effect {
                halt: true,
                ..Effect::default()
            },

            // ==================== Stack ====================

            Instruction::Push { reg } => {
                let access = self.push(self.regs.get(reg), pc)?;
                Effect::access(access)
            }

            Instruction::Pop { reg } => {
                let access = self.pop(pc)?;
                self.regs.set(reg, access.value);
                Effect::access(access)
            }
        };

        Ok(effect)
    }

    /// Resolve a register-or-immediate operand.
    fn operand(&self, operand: Operand) -> u8 {
        match operand {
            Operand::Reg(reg) => self.regs.get(reg),
            Operand::Imm(imm) => imm,
        }
    }

    /// Write `value` at SP, then move SP down.
    fn push(&mut self, value: u8, pc: u16) -> Result<MemoryAccess, StepError> {
        if self.sp == 0 {
            return Err(StepError::StackOverflow { pc, sp: self.sp });
        }
        let addr = self.sp;
        self.mem.write(addr, value);
        self.sp -= 1;
        Ok(MemoryAccess::write(addr, value))
    }

    /// Move SP up, then read the value there.
    fn pop(&mut self, pc: u16) -> Result<MemoryAccess, StepError> {
        if self.sp >= self.config.stack_top {
            return Err(StepError::StackUnderflow { pc, sp: self.sp });
        }
        self.sp += 1;
        let addr = self.sp;
        Ok(MemoryAccess::read(addr, self.mem.read(addr)))
    }

    /// Check if the CPU has stopped, either by halting or by faulting.
    pub fn is_halted(&self) -> bool {
        matches!(self.state, CpuState::Halted | CpuState::Faulted)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("sp", &self.sp)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Errors that end a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("stack overflow at PC={pc} (SP={sp})")]
    StackOverflow { pc: u16, sp: u8 },

    #[error("stack underflow at PC={pc} (SP={sp})")]
    StackUnderflow { pc: u16, sp: u8 },

    #[error("return address after PC={pc} does not fit program address space")]
    ReturnAddressOutOfRange { pc: u16 },

    #[error("division by zero at PC={pc}")]
    DivideByZero { pc: u16 },

    #[error("register {register} at PC={pc} is outside the register file")]
    InvalidRegister { pc: u16, register: Reg },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::AluOp;
    use crate::cpu::snapshot::AccessKind;
    use proptest::prelude::*;

    const R0: Reg = Reg::R0;
    const R1: Reg = Reg::R1;
    const R2: Reg = Reg::new(2);

    fn cpu_with(instructions: Vec<Instruction>) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.load_program(Program::new(instructions).unwrap());
        cpu
    }

    fn run(cpu: &mut Cpu) -> Vec<StepRecord> {
        let mut records = Vec::new();
        while let Some(record) = cpu.step().unwrap() {
            records.push(record);
        }
        records
    }

    fn add(dst: Reg, src: Reg) -> Instruction {
        Instruction::Alu {
            op: AluOp::Add,
            dst,
            src: Operand::Reg(src),
        }
    }

    #[test]
    fn test_cpu_halt() {
        let mut cpu = cpu_with(vec![Instruction::Halt]);

        let record = cpu.step().unwrap().unwrap();

        assert!(record.halted);
        assert!(cpu.is_halted());
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.step().unwrap(), None);
        assert_eq!(cpu.cycles, 1);
    }

    #[test]
    fn test_cpu_runs_off_end() {
        let mut cpu = cpu_with(vec![Instruction::MoveI { reg: R0, imm: 1 }]);

        assert!(cpu.step().unwrap().is_some());
        assert_eq!(cpu.step().unwrap(), None);
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_empty_program_halts() {
        let mut cpu = Cpu::new();
        assert_eq!(cpu.step().unwrap(), None);
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_cpu_load_store() {
        let mut cpu = cpu_with(vec![
            Instruction::MoveI { reg: R0, imm: 16 },
            Instruction::MoveI { reg: R1, imm: 6 },
            add(R0, R1),
            Instruction::MoveM { reg: R0, addr: 0 },
            Instruction::MoveR { reg: R2, addr: 0 },
            Instruction::Halt,
        ]);

        let records = run(&mut cpu);

        assert_eq!(records.len(), 6);
        assert_eq!(cpu.regs.get(R0), 22);
        assert_eq!(cpu.regs.get(R2), 22);
        assert_eq!(cpu.mem.read(0), 22);
        assert_eq!(records[3].memory_access, Some(MemoryAccess::write(0, 22)));
        assert_eq!(records[4].memory_access, Some(MemoryAccess::read(0, 22)));
        assert_eq!(records[4].changed_registers, vec!["R2"]);
    }

    #[test]
    fn test_step_record_diff() {
        let mut cpu = cpu_with(vec![
            Instruction::MoveI { reg: R0, imm: 255 },
            Instruction::Alu {
                op: AluOp::Add,
                dst: R0,
                src: Operand::Imm(1),
            },
            Instruction::MoveI { reg: R0, imm: 0 },
        ]);

        let first = cpu.step().unwrap().unwrap();
        assert_eq!(first.changed_registers, vec!["R0"]);
        assert!(first.changed_flags.is_empty());

        let second = cpu.step().unwrap().unwrap();
        assert_eq!(second.instruction, "ADDI R0, 1");
        assert_eq!(second.address, 1);
        assert_eq!(second.changed_registers, vec!["R0"]);
        assert_eq!(second.changed_flags, vec!["zero", "carry"]);

        // Writing the value a register already holds is not a change.
        let third = cpu.step().unwrap().unwrap();
        assert!(third.changed_registers.is_empty());
        assert!(third.changed_flags.is_empty());
    }

    #[test]
    fn test_mult16_super_register() {
        let mut cpu = cpu_with(vec![Instruction::Mult16 {
            src: Operand::Reg(R2),
        }]);
        cpu.regs.set(R0, 200);
        cpu.regs.set(R2, 3);

        let record = cpu.step().unwrap().unwrap();

        assert_eq!(cpu.regs.get(R0), 0x58);
        assert_eq!(cpu.regs.get(R1), 2);
        assert!(cpu.flags.carry);
        assert!(!cpu.flags.zero);
        assert_eq!(record.changed_registers, vec!["R0", "R1"]);
    }

    #[test]
    fn test_conditional_jumps() {
        let mut cpu = cpu_with(vec![
            Instruction::MoveI { reg: R0, imm: 3 },
            // loop: R0 -= 1 until zero, counting iterations in R1
            Instruction::Alu {
                op: AluOp::Sub,
                dst: R0,
                src: Operand::Imm(1),
            },
            Instruction::Alu {
                op: AluOp::Add,
                dst: R1,
                src: Operand::Imm(1),
            },
            Instruction::Cmp {
                lhs: R0,
                rhs: Operand::Imm(0),
            },
            Instruction::Jnz { target: 1 },
            Instruction::Halt,
        ]);

        run(&mut cpu);

        assert_eq!(cpu.regs.get(R0), 0);
        assert_eq!(cpu.regs.get(R1), 3);
        assert!(cpu.is_halted());
    }

    #[test]
    fn test_jz_not_taken_advances() {
        let mut cpu = cpu_with(vec![Instruction::Jz { target: 5 }, Instruction::Halt]);

        cpu.step().unwrap();
        assert_eq!(cpu.pc, 1);
    }

    #[test]
    fn test_signed_jumps_after_cmp() {
        let mut cpu = cpu_with(vec![
            Instruction::MoveI { reg: R0, imm: (-5i8) as u8 },
            Instruction::Cmp {
                lhs: R0,
                rhs: Operand::Imm(3),
            },
            Instruction::Jl { target: 4 },
            Instruction::Halt,
            Instruction::MoveI { reg: R1, imm: 1 },
            Instruction::Halt,
        ]);

        run(&mut cpu);

        assert_eq!(cpu.regs.get(R1), 1);
    }

    /// Run `MOVEI R0, a` / `CMPI R0, b` / `jump 4` and report whether the jump was taken.
    fn branch_taken(a: i8, b: i8, jump: fn(u8) -> Instruction) -> bool {
        let mut cpu = cpu_with(vec![
            Instruction::MoveI { reg: R0, imm: a as u8 },
            Instruction::Cmp {
                lhs: R0,
                rhs: Operand::Imm(b as u8),
            },
            jump(4),
            Instruction::Halt,
            Instruction::Halt,
        ]);
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        cpu.pc == 4
    }

    #[test]
    fn test_signed_branches_taken_and_not_taken() {
        let jge = |target| Instruction::Jge { target };
        let jl = |target| Instruction::Jl { target };
        let jg = |target| Instruction::Jg { target };

        // (a, b, a >= b, a < b, a > b); 127 - (-1) sets overflow.
        let cases = [
            (-5, 3, false, true, false),
            (3, -5, true, false, true),
            (5, 5, true, false, false),
            (127, -1, true, false, true),
            (-128, 1, false, true, false),
        ];
        for (a, b, ge, lt, gt) in cases {
            assert_eq!(branch_taken(a, b, jge), ge, "JGE {} {}", a, b);
            assert_eq!(branch_taken(a, b, jl), lt, "JL {} {}", a, b);
            assert_eq!(branch_taken(a, b, jg), gt, "JG {} {}", a, b);
        }
    }

    #[test]
    fn test_equality_branches() {
        let je = |target| Instruction::Je { target };
        let jne = |target| Instruction::Jne { target };

        assert!(branch_taken(9, 9, je));
        assert!(!branch_taken(9, 8, je));
        assert!(branch_taken(9, 8, jne));
        assert!(!branch_taken(9, 9, jne));
    }

    #[test]
    fn test_divide_and_modulo() {
        let mut cpu = cpu_with(vec![
            Instruction::MoveI { reg: R0, imm: 47 },
            Instruction::MoveI { reg: R1, imm: 47 },
            Instruction::MoveI { reg: R2, imm: 5 },
            Instruction::Alu {
                op: AluOp::Div,
                dst: R0,
                src: Operand::Reg(R2),
            },
            Instruction::Alu {
                op: AluOp::Mod,
                dst: R1,
                src: Operand::Imm(5),
            },
        ]);

        run(&mut cpu);

        assert_eq!(cpu.regs.get(R0), 9);
        assert_eq!(cpu.regs.get(R1), 2);
    }

    #[test]
    fn test_divide_by_zero_faults() {
        let mut cpu = cpu_with(vec![
            Instruction::MoveI { reg: R0, imm: 10 },
            Instruction::Alu {
                op: AluOp::Div,
                dst: R0,
                src: Operand::Reg(R1),
            },
            Instruction::Halt,
        ]);
        cpu.step().unwrap();

        let err = cpu.step().unwrap_err();

        assert_eq!(err, StepError::DivideByZero { pc: 1 });
        assert_eq!(cpu.state, CpuState::Faulted);
        assert_eq!(cpu.regs.get(R0), 10);
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.step().unwrap(), None);
    }

    #[test]
    fn test_register_outside_file_faults() {
        let mut cpu = cpu_with(vec![Instruction::Push { reg: Reg::new(9) }]);

        assert_eq!(
            cpu.step(),
            Err(StepError::InvalidRegister {
                pc: 0,
                register: Reg::new(9)
            })
        );
        assert_eq!(cpu.state, CpuState::Faulted);
        assert_eq!(cpu.sp, 0xFF);
    }

    #[test]
    fn test_with_config_validates() {
        let config = MachineConfig {
            register_count: 0,
            ..MachineConfig::default()
        };
        assert!(matches!(Cpu::with_config(config), Err(ConfigError::Invalid(_))));

        let config = MachineConfig {
            register_count: 8,
            stack_top: 0x80,
        };
        let cpu = Cpu::with_config(config).unwrap();
        assert_eq!(cpu.regs.count(), 8);
        assert_eq!(cpu.sp, 0x80);
    }

    #[test]
    fn test_call_and_ret() {
        let mut cpu = cpu_with(vec![
            Instruction::Call { target: 3 },
            Instruction::MoveI { reg: R1, imm: 7 },
            Instruction::Halt,
            Instruction::MoveI { reg: R0, imm: 9 },
            Instruction::Ret,
        ]);

        let call = cpu.step().unwrap().unwrap();
        assert_eq!(cpu.pc, 3);
        assert_eq!(cpu.sp, 0xFE);
        assert_eq!(call.memory_access, Some(MemoryAccess::write(0xFF, 1)));

        cpu.step().unwrap();
        let ret = cpu.step().unwrap().unwrap();
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.sp, 0xFF);
        assert_eq!(ret.memory_access.map(|a| a.direction), Some(AccessKind::Read));

        run(&mut cpu);
        assert_eq!(cpu.regs.get(R0), 9);
        assert_eq!(cpu.regs.get(R1), 7);
    }

    #[test]
    fn test_pop_empty_stack_faults() {
        let mut cpu = cpu_with(vec![Instruction::Pop { reg: R0 }]);

        let err = cpu.step().unwrap_err();

        assert_eq!(err, StepError::StackUnderflow { pc: 0, sp: 0xFF });
        assert_eq!(cpu.state, CpuState::Faulted);
        assert_eq!(cpu.sp, 0xFF);
        assert_eq!(cpu.step().unwrap(), None);
    }

    #[test]
    fn test_ret_without_call_faults() {
        let mut cpu = cpu_with(vec![Instruction::Ret]);
        assert!(matches!(cpu.step(), Err(StepError::StackUnderflow { .. })));
    }

    #[test]
    fn test_push_full_stack_faults() {
        let mut cpu = cpu_with(vec![Instruction::Push { reg: R0 }]);
        cpu.sp = 0;

        let err = cpu.step().unwrap_err();

        assert_eq!(err, StepError::StackOverflow { pc: 0, sp: 0 });
        assert_eq!(cpu.pc, 0);
        assert_eq!(cpu.state, CpuState::Faulted);
    }

    #[test]
    fn test_call_from_last_address_faults() {
        let mut program = vec![Instruction::Halt; 255];
        program.push(Instruction::Call { target: 0 });
        let mut cpu = cpu_with(program);
        cpu.pc = 255;

        assert_eq!(
            cpu.step(),
            Err(StepError::ReturnAddressOutOfRange { pc: 255 })
        );
        assert_eq!(cpu.sp, 0xFF);
    }

    #[test]
    fn test_reset_keeps_program() {
        let mut cpu = cpu_with(vec![
            Instruction::MoveMI { addr: 9, imm: 1 },
            Instruction::Push { reg: R0 },
            Instruction::Halt,
        ]);
        run(&mut cpu);

        cpu.reset();

        assert_eq!(cpu.pc, 0);
        assert_eq!(cpu.sp, 0xFF);
        assert_eq!(cpu.mem.read(9), 0);
        assert_eq!(cpu.state, CpuState::Ready);
        assert_eq!(cpu.program.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_push_pop_roundtrip(value: u8, sp in 1u8..=0xFF) {
            let mut cpu = cpu_with(vec![
                Instruction::Push { reg: R0 },
                Instruction::Pop { reg: R2 },
            ]);
            cpu.regs.set(R0, value);
            cpu.sp = sp;

            cpu.step().unwrap();
            cpu.step().unwrap();

            prop_assert_eq!(cpu.regs.get(R2), value);
            prop_assert_eq!(cpu.sp, sp);
        }

        #[test]
        fn prop_call_ret_is_neutral(r0: u8, r1: u8, r2: u8) {
            let mut cpu = cpu_with(vec![
                Instruction::Call { target: 2 },
                Instruction::Halt,
                Instruction::Ret,
            ]);
            cpu.regs.set(R0, r0);
            cpu.regs.set(R1, r1);
            cpu.regs.set(R2, r2);
            let regs = cpu.regs.clone();

            cpu.step().unwrap();
            cpu.step().unwrap();

            prop_assert_eq!(cpu.pc, 1);
            prop_assert_eq!(cpu.sp, 0xFF);
            prop_assert_eq!(&cpu.regs, &regs);
        }
    }
}
