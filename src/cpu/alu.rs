//! 8-bit arithmetic and flag computation.
//!
//! Every operation works at 16-bit precision, truncates to a byte for
//! storage and derives carry from the untruncated result. Each function
//! takes the current flags and returns them with only the flags the
//! operation defines recomputed.

use crate::cpu::decode::AluOp;
use crate::cpu::registers::Flags;

const SIGN_BIT: u8 = 0x80;

#[inline]
fn is_negative(value: u8) -> bool {
    value & SIGN_BIT != 0
}

/// `a + b + carry_in`. Defines zero, carry and overflow.
pub fn add(a: u8, b: u8, carry_in: bool, mut flags: Flags) -> (u8, Flags) {
    let wide = u16::from(a) + u16::from(b) + u16::from(carry_in);
    let result = wide as u8;

    flags.zero = result == 0;
    flags.carry = wide > 0xFF;
    flags.overflow = is_negative(!(a ^ b) & (a ^ result));
    (result, flags)
}

/// `a - b - borrow_in`. Defines zero, carry (borrow), sign and overflow.
pub fn subtract(a: u8, b: u8, borrow_in: bool, mut flags: Flags) -> (u8, Flags) {
    let wide = i16::from(a) - i16::from(b) - i16::from(borrow_in);
    let result = wide as u8;

    flags.zero = result == 0;
    flags.carry = wide < 0;
    flags.sign = is_negative(result);
    flags.overflow = is_negative((a ^ b) & (a ^ result));
    (result, flags)
}

/// `a * b` truncated to a byte. Defines zero and carry.
pub fn multiply(a: u8, b: u8, mut flags: Flags) -> (u8, Flags) {
    let wide = u16::from(a) * u16::from(b);
    let result = wide as u8;

    flags.zero = result == 0;
    flags.carry = wide > 0xFF;
    (result, flags)
}

/// Full 16-bit product for the super register. Defines zero and carry.
pub fn multiply_wide(a: u8, b: u8, mut flags: Flags) -> (u16, Flags) {
    let product = u16::from(a) * u16::from(b);

    flags.zero = product == 0;
    flags.carry = product > 0xFF;
    (product, flags)
}

/// Result-only flags for bitwise operations; carry and overflow are cleared.
fn logic_flags(result: u8, mut flags: Flags) -> Flags {
    flags.zero = result == 0;
    flags.sign = is_negative(result);
    flags.carry = false;
    flags.overflow = false;
    flags
}

/// Bitwise NOT.
pub fn not(a: u8, flags: Flags) -> (u8, Flags) {
    let result = !a;
    (result, logic_flags(result, flags))
}

/// Shift left by one; carry receives the old bit 7.
pub fn shift_left(a: u8, flags: Flags) -> (u8, Flags) {
    let result = a << 1;
    let mut flags = logic_flags(result, flags);
    flags.carry = is_negative(a);
    (result, flags)
}

/// Logical shift right by one; carry receives the old bit 0.
pub fn shift_right(a: u8, flags: Flags) -> (u8, Flags) {
    let result = a >> 1;
    let mut flags = logic_flags(result, flags);
    flags.carry = a & 1 != 0;
    (result, flags)
}

/// Unsigned `a / b`, or `None` when `b` is zero.
///
/// Defines zero and sign; carry and overflow are cleared.
pub fn divide(a: u8, b: u8, flags: Flags) -> Option<(u8, Flags)> {
    let result = a.checked_div(b)?;
    Some((result, logic_flags(result, flags)))
}

/// Unsigned `a % b`, or `None` when `b` is zero. Flags as for [`divide`].
pub fn remainder(a: u8, b: u8, flags: Flags) -> Option<(u8, Flags)> {
    let result = a.checked_rem(b)?;
    Some((result, logic_flags(result, flags)))
}

/// Apply one of the `Alu` group operations.
///
/// Returns `None` only for a division or remainder by zero.
pub fn apply(op: AluOp, a: u8, b: u8, flags: Flags) -> Option<(u8, Flags)> {
    let out = match op {
        AluOp::Add => add(a, b, false, flags),
        AluOp::Adc => add(a, b, flags.carry, flags),
        AluOp::Sub => subtract(a, b, false, flags),
        AluOp::Sbc => subtract(a, b, flags.carry, flags),
        AluOp::Mul => multiply(a, b, flags),
        AluOp::Div => return divide(a, b, flags),
        AluOp::Mod => return remainder(a, b, flags),
        AluOp::And => {
            let result = a & b;
            (result, logic_flags(result, flags))
        }
        AluOp::Or => {
            let result = a | b;
            (result, logic_flags(result, flags))
        }
        AluOp::Xor => {
            let result = a ^ b;
            (result, logic_flags(result, flags))
        }
    };
    Some(out)
}
