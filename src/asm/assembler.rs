//! Two-pass assembler for register machine programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! START:              ; Define a label
//!     MOVEI R0, 16    ; Load an immediate (a leading # is optional)
//!     MOVEM R0, 0     ; Store to data address 0
//!     JNZ START       ; Jump to a label or a numeric address
//!     HALT
//! ```
//!
//! Pass one strips comments, records labels and splits each line into a
//! mnemonic and raw operands. Pass two checks operands against the
//! mnemonic's signature and builds the instructions, so forward references
//! resolve naturally. Either pass failing leaves nothing behind.

use crate::config::MachineConfig;
use crate::cpu::decode::{Instruction, Mnemonic, OperandSource};
use crate::cpu::memory::{MemoryError, Program};
use crate::cpu::registers::Reg;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source text into a program for a machine built from `config`.
pub fn assemble(source: &str, config: &MachineConfig) -> Result<Program, LoadError> {
    let mut asm = Assembler::new(config.register_count);
    asm.assemble(source)
}

/// A source line reduced to its instruction.
struct Statement<'a> {
    line: usize,
    mnemonic: Mnemonic,
    operands: Vec<&'a str>,
}

/// The assembler state.
struct Assembler<'a> {
    register_count: usize,
    /// Symbol table (label -> program address).
    symbols: HashMap<String, usize>,
    statements: Vec<Statement<'a>>,
}

impl<'a> Assembler<'a> {
    fn new(register_count: usize) -> Self {
        Self {
            register_count,
            symbols: HashMap::new(),
            statements: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &'a str) -> Result<Program, LoadError> {
        // Pass 1: labels and statements
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: operands
        let instructions = self
            .statements
            .iter()
            .map(|stmt| self.build(stmt))
            .collect::<Result<Vec<_>, _>>()?;

        Program::new(instructions).map_err(|err| match err {
            MemoryError::ProgramTooLarge { size, available } => LoadError::ProgramTooLarge {
                len: size,
                capacity: available,
            },
        })
    }

    fn process_line(&mut self, line: &'a str, line_num: usize) -> Result<(), LoadError> {
        // Remove inline comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim();
            self.define_label(label, line_num)?;
            line = line[colon_idx + 1..].trim();
        }

        if line.is_empty() {
            return Ok(());
        }

        let (name, rest) = match line.find(|c: char| c.is_whitespace() || c == ',') {
            Some(idx) => (&line[..idx], line[idx..].trim()),
            None => (line, ""),
        };
        let mnemonic = Mnemonic::parse(name).ok_or_else(|| LoadError::UnknownMnemonic {
            line: line_num,
            mnemonic: name.to_string(),
        })?;

        // Commas separate operands and may not be doubled or left dangling;
        // plain whitespace between operands is also accepted.
        let mut operands = Vec::new();
        if !rest.is_empty() {
            for piece in rest.split(',') {
                let piece = piece.trim();
                if piece.is_empty() {
                    return Err(LoadError::EmptyOperand { line: line_num });
                }
                operands.extend(piece.split_whitespace());
            }
        }

        self.statements.push(Statement {
            line: line_num,
            mnemonic,
            operands,
        });
        Ok(())
    }

    fn define_label(&mut self, label: &str, line_num: usize) -> Result<(), LoadError> {
        if !is_identifier(label) {
            return Err(LoadError::InvalidLabel {
                line: line_num,
                label: label.to_string(),
            });
        }

        let key = label.to_uppercase();
        if self.symbols.contains_key(&key) {
            return Err(LoadError::DuplicateLabel {
                line: line_num,
                label: label.to_string(),
            });
        }
        self.symbols.insert(key, self.statements.len());
        Ok(())
    }

    fn build(&self, stmt: &Statement<'a>) -> Result<Instruction, LoadError> {
        let expected = stmt.mnemonic.signature().len();
        if stmt.operands.len() != expected {
            return Err(LoadError::OperandCount {
                line: stmt.line,
                mnemonic: stmt.mnemonic.name(),
                expected,
                found: stmt.operands.len(),
            });
        }

        stmt.mnemonic.build(&mut Operands { asm: self, stmt })
    }

    fn parse_register(&self, token: &str, line_num: usize) -> Result<Reg, LoadError> {
        let reg = Reg::parse(token).ok_or_else(|| LoadError::InvalidRegister {
            line: line_num,
            token: token.to_string(),
        })?;
        if reg.index() >= self.register_count {
            return Err(LoadError::RegisterOutOfRange {
                line: line_num,
                register: reg.to_string(),
                count: self.register_count,
            });
        }
        Ok(reg)
    }

    fn parse_target(&self, token: &str, line_num: usize) -> Result<u8, LoadError> {
        if !is_identifier(token) {
            return parse_address(token).ok_or_else(|| LoadError::InvalidAddress {
                line: line_num,
                token: token.to_string(),
            });
        }

        let addr = self
            .symbols
            .get(&token.to_uppercase())
            .ok_or_else(|| LoadError::UndefinedLabel {
                line: line_num,
                label: token.to_string(),
            })?;
        u8::try_from(*addr).map_err(|_| LoadError::InvalidAddress {
            line: line_num,
            token: token.to_string(),
        })
    }
}

/// The operand tokens of one statement, parsed on demand.
struct Operands<'s, 'a> {
    asm: &'s Assembler<'a>,
    stmt: &'s Statement<'a>,
}

impl Operands<'_, '_> {
    fn token(&self, index: usize) -> &str {
        self.stmt.operands.get(index).copied().unwrap_or_default()
    }
}

impl OperandSource for Operands<'_, '_> {
    type Error = LoadError;

    fn register(&mut self, index: usize) -> Result<Reg, LoadError> {
        self.asm.parse_register(self.token(index), self.stmt.line)
    }

    fn immediate(&mut self, index: usize) -> Result<u8, LoadError> {
        let token = self.token(index);
        parse_immediate(token).ok_or_else(|| LoadError::InvalidImmediate {
            line: self.stmt.line,
            token: token.to_string(),
        })
    }

    fn address(&mut self, index: usize) -> Result<u8, LoadError> {
        let token = self.token(index);
        parse_address(token).ok_or_else(|| LoadError::InvalidAddress {
            line: self.stmt.line,
            token: token.to_string(),
        })
    }

    fn target(&mut self, index: usize) -> Result<u8, LoadError> {
        self.asm.parse_target(self.token(index), self.stmt.line)
    }
}

/// Labels are identifiers: a letter or `_`, then letters, digits or `_`.
fn is_identifier(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_decimal(digits: &str) -> bool {
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decimal immediate with an optional `#` marker, `-128..=255`.
fn parse_immediate(token: &str) -> Option<u8> {
    let digits = token.strip_prefix('#').unwrap_or(token);
    if !is_decimal(digits.strip_prefix('-').unwrap_or(digits)) {
        return None;
    }
    let value: i16 = digits.parse().ok()?;
    match value {
        0..=255 => Some(value as u8),
        -128..=-1 => Some(value as i8 as u8),
        _ => None,
    }
}

/// Decimal address, `0..=255`.
fn parse_address(token: &str) -> Option<u8> {
    if !is_decimal(token) {
        return None;
    }
    token.parse().ok()
}

/// Errors that can occur while loading source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("{mnemonic} on line {line} takes {expected} operand(s), found {found}")]
    OperandCount {
        line: usize,
        mnemonic: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid register on line {line}: {token}")]
    InvalidRegister { line: usize, token: String },

    #[error("register {register} on line {line} does not exist (machine has {count})")]
    RegisterOutOfRange {
        line: usize,
        register: String,
        count: usize,
    },

    #[error("invalid immediate on line {line}: {token}")]
    InvalidImmediate { line: usize, token: String },

    #[error("invalid address on line {line}: {token}")]
    InvalidAddress { line: usize, token: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("invalid label on line {line}: {label:?}")]
    InvalidLabel { line: usize, label: String },

    #[error("empty operand on line {line}")]
    EmptyOperand { line: usize },

    #[error("program has {len} instructions, program memory holds {capacity}")]
    ProgramTooLarge { len: usize, capacity: usize },
}
