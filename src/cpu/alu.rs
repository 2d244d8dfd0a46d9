//! Pure flag and bit arithmetic shared by the instruction handlers. The only
//! side effect any of these have is on the status register they are given.

use super::StatusFlags;

/// Two's-complement interpretation of a byte as -128..=127.
pub fn signed_byte(byte: u8) -> i8 {
    byte as i8
}

pub fn two_complement(byte: u8) -> u8 {
    (0x100u16.wrapping_sub(byte as u16) & 0xFF) as u8
}

pub fn bit_value(bit: u8, byte: u8) -> u8 {
    (byte >> bit) & 1
}

pub fn update_zero(p: &mut StatusFlags, result: u8) {
    p.set(StatusFlags::ZERO, result == 0);
}

pub fn update_negative(p: &mut StatusFlags, result: u8) {
    p.set(StatusFlags::NEGATIVE, result & 0x80 != 0);
}

/// Classic signed-overflow rule: the operands' sign bits agree with each
/// other but disagree with the result's.
pub fn update_overflow(p: &mut StatusFlags, result: u8, a: u8, b: u8) {
    let overflow = (a ^ b) & 0x80 == 0 && (a ^ result) & 0x80 != 0;
    p.set(StatusFlags::OVERFLOW, overflow);
}
