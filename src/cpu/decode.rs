//! Instruction set definition.
//!
//! Every instruction the machine executes is a variant of [`Instruction`],
//! built by the loader from a [`Mnemonic`] and its checked operands. The set
//! is closed: an unknown opcode can only be an error at load time.

use crate::cpu::registers::Reg;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Second operand of a two-operand instruction: a register or an immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Reg(Reg),
    Imm(u8),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Imm(imm) => write!(f, "{}", imm),
        }
    }
}

/// Binary operations of the `Alu` instruction group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
}

/// Decoded instruction.
///
/// Organized into groups:
/// - Transfer: MOVEI, MOVER, MOVEM, MOVEMI
/// - Arithmetic/logic: the `Alu` group, MULT_16, NOT, SHL, SHR, CMP
/// - Control: JMP, JZ/JE, JNZ/JNE, JG, JGE, JL, CALL, RET, HALT
/// - Stack: PUSH, POP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Transfer ====================

    /// reg := imm
    MoveI { reg: Reg, imm: u8 },

    /// reg := data[addr]
    MoveR { reg: Reg, addr: u8 },

    /// data[addr] := reg
    MoveM { reg: Reg, addr: u8 },

    /// data[addr] := imm
    MoveMI { addr: u8, imm: u8 },

    // ==================== Arithmetic / logic ====================

    /// dst := dst op src
    Alu { op: AluOp, dst: Reg, src: Operand },

    /// (R1:R0) := R0 * src
    Mult16 { src: Operand },

    /// reg := !reg
    Not { reg: Reg },

    /// reg := reg << 1
    Shl { reg: Reg },

    /// reg := reg >> 1
    Shr { reg: Reg },

    /// Set flags from lhs - rhs without storing the result.
    Cmp { lhs: Reg, rhs: Operand },

    // ==================== Control ====================

    Jmp { target: u8 },
    Jz { target: u8 },
    Jnz { target: u8 },
    /// Same condition as JZ, written after a CMP.
    Je { target: u8 },
    /// Same condition as JNZ, written after a CMP.
    Jne { target: u8 },
    /// Jump if !zero && sign == overflow (signed greater-than after CMP).
    Jg { target: u8 },
    /// Jump if sign == overflow (signed greater-or-equal after CMP).
    Jge { target: u8 },
    /// Jump if sign != overflow (signed less-than after CMP).
    Jl { target: u8 },
    Call { target: u8 },
    Ret,
    Halt,

    // ==================== Stack ====================

    Push { reg: Reg },
    Pop { reg: Reg },
}

impl Instruction {
    /// The mnemonic this instruction is written with.
    pub fn mnemonic(&self) -> Mnemonic {
        use Mnemonic as M;

        match *self {
            Instruction::MoveI { .. } => M::MoveI,
            Instruction::MoveR { .. } => M::MoveR,
            Instruction::MoveM { .. } => M::MoveM,
            Instruction::MoveMI { .. } => M::MoveMI,
            Instruction::Alu { op, src, .. } => {
                let imm = matches!(src, Operand::Imm(_));
                match (op, imm) {
                    (AluOp::Add, false) => M::Add,
                    (AluOp::Add, true) => M::AddI,
                    (AluOp::Adc, false) => M::Adc,
                    (AluOp::Adc, true) => M::AdcI,
                    (AluOp::Sub, false) => M::Sub,
                    (AluOp::Sub, true) => M::SubI,
                    (AluOp::Sbc, false) => M::Sbc,
                    (AluOp::Sbc, true) => M::SbcI,
                    (AluOp::Mul, false) => M::Mult,
                    (AluOp::Mul, true) => M::MultI,
                    (AluOp::Div, false) => M::Div,
                    (AluOp::Div, true) => M::DivI,
                    (AluOp::Mod, false) => M::Mod,
                    (AluOp::Mod, true) => M::ModI,
                    (AluOp::And, false) => M::And,
                    (AluOp::And, true) => M::AndI,
                    (AluOp::Or, false) => M::Or,
                    (AluOp::Or, true) => M::OrI,
                    (AluOp::Xor, false) => M::Xor,
                    (AluOp::Xor, true) => M::XorI,
                }
            }
            Instruction::Mult16 { src: Operand::Reg(_) } => M::Mult16,
            Instruction::Mult16 { src: Operand::Imm(_) } => M::Mult16I,
            Instruction::Not { .. } => M::Not,
            Instruction::Shl { .. } => M::Shl,
            Instruction::Shr { .. } => M::Shr,
            Instruction::Cmp { rhs: Operand::Reg(_), .. } => M::Cmp,
            Instruction::Cmp { rhs: Operand::Imm(_), .. } => M::CmpI,
            Instruction::Jmp { .. } => M::Jmp,
            Instruction::Jz { .. } => M::Jz,
            Instruction::Jnz { .. } => M::Jnz,
            Instruction::Je { .. } => M::Je,
            Instruction::Jne { .. } => M::Jne,
            Instruction::Jg { .. } => M::Jg,
            Instruction::Jge { .. } => M::Jge,
            Instruction::Jl { .. } => M::Jl,
            Instruction::Call { .. } => M::Call,
            Instruction::Ret => M::Ret,
            Instruction::Halt => M::Halt,
            Instruction::Push { .. } => M::Push,
            Instruction::Pop { .. } => M::Pop,
        }
    }

    /// Every register the instruction reads or writes, implicit ones included.
    pub fn registers(&self) -> impl Iterator<Item = Reg> {
        let src_reg = |operand: Operand| match operand {
            Operand::Reg(reg) => Some(reg),
            Operand::Imm(_) => None,
        };

        let regs = match *self {
            Instruction::MoveI { reg, .. }
            | Instruction::MoveR { reg, .. }
            | Instruction::MoveM { reg, .. }
            | Instruction::Not { reg }
            | Instruction::Shl { reg }
            | Instruction::Shr { reg }
            | Instruction::Push { reg }
            | Instruction::Pop { reg } => [Some(reg), None, None],
            Instruction::Alu { dst, src, .. } => [Some(dst), src_reg(src), None],
            Instruction::Cmp { lhs, rhs } => [Some(lhs), src_reg(rhs), None],
            Instruction::Mult16 { src } => [Some(Reg::R0), Some(Reg::R1), src_reg(src)],
            _ => [None, None, None],
        };
        regs.into_iter().flatten()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.mnemonic().name();
        match self {
            Instruction::MoveI { reg, imm } => write!(f, "{} {}, {}", name, reg, imm),
            Instruction::MoveR { reg, addr } | Instruction::MoveM { reg, addr } => {
                write!(f, "{} {}, {}", name, reg, addr)
            }
            Instruction::MoveMI { addr, imm } => write!(f, "{} {}, {}", name, addr, imm),
            Instruction::Alu { dst, src, .. } => write!(f, "{} {}, {}", name, dst, src),
            Instruction::Mult16 { src } => write!(f, "{} {}", name, src),
            Instruction::Not { reg }
            | Instruction::Shl { reg }
            | Instruction::Shr { reg }
            | Instruction::Push { reg }
            | Instruction::Pop { reg } => write!(f, "{} {}", name, reg),
            Instruction::Cmp { lhs, rhs } => write!(f, "{} {}, {}", name, lhs, rhs),
            Instruction::Jmp { target }
            | Instruction::Jz { target }
            | Instruction::Jnz { target }
            | Instruction::Je { target }
            | Instruction::Jne { target }
            | Instruction::Jg { target }
            | Instruction::Jge { target }
            | Instruction::Jl { target }
            | Instruction::Call { target } => write!(f, "{} {}", name, target),
            Instruction::Ret | Instruction::Halt => f.write_str(name),
        }
    }
}

/// The kind of value an operand slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// A register name, `R0..Rn-1`.
    Register,
    /// A decimal literal with an optional `#` marker.
    Immediate,
    /// A data memory address, `0..=255`.
    Address,
    /// A program address, `0..=255`, or a label.
    Target,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperandKind::Register => "register",
            OperandKind::Immediate => "immediate",
            OperandKind::Address => "address",
            OperandKind::Target => "jump target",
        };
        f.write_str(name)
    }
}

/// Supplies typed operands by position while an instruction is built.
///
/// [`Mnemonic::build`] asks for each operand with the kind its signature
/// declares, so a source only has to parse, never to check kinds.
pub trait OperandSource {
    type Error;

    fn register(&mut self, index: usize) -> Result<Reg, Self::Error>;
    fn immediate(&mut self, index: usize) -> Result<u8, Self::Error>;
    fn address(&mut self, index: usize) -> Result<u8, Self::Error>;
    fn target(&mut self, index: usize) -> Result<u8, Self::Error>;
}

macro_rules! mnemonics {
    ($($variant:ident => $name:literal [$($kind:ident),*]),* $(,)?) => {
        /// Source-level opcode names and their operand signatures.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Mnemonic {
            $($variant),*
        }

        impl Mnemonic {
            /// Every mnemonic, in opcode table order.
            pub const ALL: &'static [Mnemonic] = &[$(Mnemonic::$variant),*];

            /// The upper-case name as written in source.
            pub fn name(self) -> &'static str {
                match self {
                    $(Mnemonic::$variant => $name),*
                }
            }

            /// Operand kinds, in source order.
            pub fn signature(self) -> &'static [OperandKind] {
                match self {
                    $(Mnemonic::$variant => &[$(OperandKind::$kind),*]),*
                }
            }
        }
    };
}

mnemonics! {
    Halt => "HALT" [],
    MoveI => "MOVEI" [Register, Immediate],
    MoveR => "MOVER" [Register, Address],
    MoveM => "MOVEM" [Register, Address],
    MoveMI => "MOVEMI" [Address, Immediate],
    Add => "ADD" [Register, Register],
    AddI => "ADDI" [Register, Immediate],
    Adc => "ADC" [Register, Register],
    AdcI => "ADCI" [Register, Immediate],
    Sub => "SUB" [Register, Register],
    SubI => "SUBI" [Register, Immediate],
    Sbc => "SBC" [Register, Register],
    SbcI => "SBCI" [Register, Immediate],
    Mult => "MULT" [Register, Register],
    MultI => "MULTI" [Register, Immediate],
    Mult16 => "MULT_16" [Register],
    Mult16I => "MULT_16I" [Immediate],
    Div => "DIV" [Register, Register],
    DivI => "DIVI" [Register, Immediate],
    Mod => "MOD" [Register, Register],
    ModI => "MODI" [Register, Immediate],
    And => "AND" [Register, Register],
    AndI => "ANDI" [Register, Immediate],
    Or => "OR" [Register, Register],
    OrI => "ORI" [Register, Immediate],
    Xor => "XOR" [Register, Register],
    XorI => "XORI" [Register, Immediate],
    Not => "NOT" [Register],
    Shl => "SHL" [Register],
    Shr => "SHR" [Register],
    Cmp => "CMP" [Register, Register],
    CmpI => "CMPI" [Register, Immediate],
    Jmp => "JMP" [Target],
    Jz => "JZ" [Target],
    Jnz => "JNZ" [Target],
    Je => "JE" [Target],
    Jne => "JNE" [Target],
    Jg => "JG" [Target],
    Jge => "JGE" [Target],
    Jl => "JL" [Target],
    Call => "CALL" [Target],
    Ret => "RET" [],
    Push => "PUSH" [Register],
    Pop => "POP" [Register],
}

impl Mnemonic {
    /// Look up a mnemonic by name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// Build the instruction, pulling operands from `ops` in
    /// [`Mnemonic::signature`] order.
    pub fn build<S: OperandSource>(self, ops: &mut S) -> Result<Instruction, S::Error> {
        use Mnemonic as M;

        let alu = |op: AluOp, ops: &mut S| -> Result<Instruction, S::Error> {
            let dst = ops.register(0)?;
            let src = Operand::Reg(ops.register(1)?);
            Ok(Instruction::Alu { op, dst, src })
        };
        let alu_imm = |op: AluOp, ops: &mut S| -> Result<Instruction, S::Error> {
            let dst = ops.register(0)?;
            let src = Operand::Imm(ops.immediate(1)?);
            Ok(Instruction::Alu { op, dst, src })
        };

        let instr = match self {
            M::Halt => Instruction::Halt,
            M::Ret => Instruction::Ret,

            M::MoveI => Instruction::MoveI {
                reg: ops.register(0)?,
                imm: ops.immediate(1)?,
            },
            M::MoveR => Instruction::MoveR {
                reg: ops.register(0)?,
                addr: ops.address(1)?,
            },
            M::MoveM => Instruction::MoveM {
                reg: ops.register(0)?,
                addr: ops.address(1)?,
            },
            M::MoveMI => Instruction::MoveMI {
                addr: ops.address(0)?,
                imm: ops.immediate(1)?,
            },

            M::Add => alu(AluOp::Add, ops)?,
            M::AddI => alu_imm(AluOp::Add, ops)?,
            M::Adc => alu(AluOp::Adc, ops)?,
            M::AdcI => alu_imm(AluOp::Adc, ops)?,
            M::Sub => alu(AluOp::Sub, ops)?,
            M::SubI => alu_imm(AluOp::Sub, ops)?,
            M::Sbc => alu(AluOp::Sbc, ops)?,
            M::SbcI => alu_imm(AluOp::Sbc, ops)?,
            M::Mult => alu(AluOp::Mul, ops)?,
            M::MultI => alu_imm(AluOp::Mul, ops)?,
            M::Div => alu(AluOp::Div, ops)?,
            M::DivI => alu_imm(AluOp::Div, ops)?,
            M::Mod => alu(AluOp::Mod, ops)?,
            M::ModI => alu_imm(AluOp::Mod, ops)?,
            M::And => alu(AluOp::And, ops)?,
            M::AndI => alu_imm(AluOp::And, ops)?,
            M::Or => alu(AluOp::Or, ops)?,
            M::OrI => alu_imm(AluOp::Or, ops)?,
            M::Xor => alu(AluOp::Xor, ops)?,
            M::XorI => alu_imm(AluOp::Xor, ops)?,

            M::Mult16 => Instruction::Mult16 {
                src: Operand::Reg(ops.register(0)?),
            },
            M::Mult16I => Instruction::Mult16 {
                src: Operand::Imm(ops.immediate(0)?),
            },
            M::Not => Instruction::Not { reg: ops.register(0)? },
            M::Shl => Instruction::Shl { reg: ops.register(0)? },
            M::Shr => Instruction::Shr { reg: ops.register(0)? },
            M::Cmp => Instruction::Cmp {
                lhs: ops.register(0)?,
                rhs: Operand::Reg(ops.register(1)?),
            },
            M::CmpI => Instruction::Cmp {
                lhs: ops.register(0)?,
                rhs: Operand::Imm(ops.immediate(1)?),
            },

            M::Jmp => Instruction::Jmp { target: ops.target(0)? },
            M::Jz => Instruction::Jz { target: ops.target(0)? },
            M::Jnz => Instruction::Jnz { target: ops.target(0)? },
            M::Je => Instruction::Je { target: ops.target(0)? },
            M::Jne => Instruction::Jne { target: ops.target(0)? },
            M::Jg => Instruction::Jg { target: ops.target(0)? },
            M::Jge => Instruction::Jge { target: ops.target(0)? },
            M::Jl => Instruction::Jl { target: ops.target(0)? },
            M::Call => Instruction::Call { target: ops.target(0)? },

            M::Push => Instruction::Push { reg: ops.register(0)? },
            M::Pop => Instruction::Pop { reg: ops.register(0)? },
        };

        Ok(instr)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
