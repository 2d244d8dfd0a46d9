//! The twelve 6502 addressing modes: operand resolution for reads, commit
//! for writes, instruction sizing, and the operand text the disassembler
//! renders. Decode width and execution width come from the same place so the
//! two can never drift apart.

use crate::cpu::alu;
use crate::cpu::Registers;
use crate::memory::Memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
    Implied,
}

impl AddressingMode {
    /// Total instruction length in bytes, opcode included.
    pub const fn instruction_size(self) -> u16 {
        match self {
            AddressingMode::Accumulator | AddressingMode::Implied => 1,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::Relative
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed => 2,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 3,
        }
    }

    /// Resolve the operand into the value the instruction consumes.
    /// Address-producing modes go through `Memory::address_for`, which is
    /// where the zero-page wraparound and indexed arithmetic live.
    pub fn get(self, regs: &Registers, mem: &Memory, operand: u16) -> u8 {
        match self {
            AddressingMode::Accumulator => regs.a,
            AddressingMode::Immediate => (operand & 0xFF) as u8,
            _ => mem.load(mem.address_for(self, operand, regs)),
        }
    }

    /// Commit a computed value back through this mode. Memory stores record
    /// the last write when the memory image is in debug mode.
    pub fn set(self, regs: &mut Registers, mem: &mut Memory, operand: u16, value: u8) {
        match self {
            AddressingMode::Accumulator => regs.a = value,
            _ => {
                let addr = mem.address_for(self, operand, regs);
                mem.store(addr, value);
            }
        }
    }

    /// Operand text as the disassembler prints it. Relative operands render
    /// the resolved branch target rather than the raw displacement.
    pub fn format_operand(self, operand: u16, address: u16) -> String {
        match self {
            AddressingMode::Implied => String::new(),
            AddressingMode::Accumulator => "A".to_string(),
            AddressingMode::Immediate => format!("#${:02X}", operand & 0xFF),
            AddressingMode::ZeroPage => format!("${:02X}", operand & 0xFF),
            AddressingMode::ZeroPageX => format!("${:02X}, X", operand & 0xFF),
            AddressingMode::ZeroPageY => format!("${:02X}, Y", operand & 0xFF),
            AddressingMode::Absolute => format!("${:04X}", operand),
            AddressingMode::AbsoluteX => format!("${:04X}, X", operand),
            AddressingMode::AbsoluteY => format!("${:04X}, Y", operand),
            AddressingMode::Indirect => format!("(${:04X})", operand),
            AddressingMode::IndexedIndirect => format!("(${:02X}, X)", operand & 0xFF),
            AddressingMode::IndirectIndexed => format!("(${:02X}), Y", operand & 0xFF),
            AddressingMode::Relative => {
                let displacement = alu::signed_byte((operand & 0xFF) as u8);
                let target = address.wrapping_add(2).wrapping_add(displacement as u16);
                format!("${:04X}", target)
            }
        }
    }
}
