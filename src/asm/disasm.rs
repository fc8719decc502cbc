//! Disassembler for register machine programs.
//!
//! Produces canonical assembly with each line's program address as a
//! trailing comment, so a listing loads back to the same program.

use crate::cpu::decode::Instruction;

/// Disassemble a single instruction to text.
pub fn disassemble_instruction(instr: &Instruction) -> String {
    instr.to_string()
}

/// Disassemble a slice of instructions.
pub fn disassemble(instructions: &[Instruction]) -> String {
    let mut output = String::new();
    for (addr, instr) in instructions.iter().enumerate() {
        output.push_str(&format!("{:<20} ; {:03}\n", disassemble_instruction(instr), addr));
    }
    output
}
