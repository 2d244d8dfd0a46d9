//! Opcode table and instruction execution. One entry per documented opcode;
//! dispatch is an O(1) array index into `OPCODES` followed by a single match
//! on the operation tag. Unknown opcodes are a hard error, never a NOP.

use crate::cpu::addressing::AddressingMode;
use crate::cpu::{alu, Cpu, StatusFlags};
use crate::errors::Error;
use crate::memory::{Memory, IRQ_VECTOR, STACK_BASE};

/// Operation tag; every opcode maps to exactly one of these plus an
/// addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
}

/// Uniform per-opcode contract: mnemonic, addressing mode, base cycle cost,
/// and whether an indexed page-cross charges the +1 cycle.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub name: &'static str,
    pub op: Op,
    pub mode: AddressingMode,
    pub cycles: u8,
    pub page_sensitive: bool,
}

const fn ins(name: &'static str, op: Op, mode: AddressingMode, cycles: u8) -> Option<Instruction> {
    Some(Instruction {
        name,
        op,
        mode,
        cycles,
        page_sensitive: false,
    })
}

/// Cycle-sensitive read forms: the ones that pay +1 on a page cross.
const fn ins_px(
    name: &'static str,
    op: Op,
    mode: AddressingMode,
    cycles: u8,
) -> Option<Instruction> {
    Some(Instruction {
        name,
        op,
        mode,
        cycles,
        page_sensitive: true,
    })
}

pub static OPCODES: [Option<Instruction>; 256] = build_opcode_table();

#[rustfmt::skip]
const fn build_opcode_table() -> [Option<Instruction>; 256] {
    use AddressingMode::*;
    use Op::*;

    let mut t: [Option<Instruction>; 256] = [None; 256];

    t[0x00] = ins("BRK", Brk, Implied, 7);
    t[0x01] = ins("ORA", Ora, IndexedIndirect, 6);
    t[0x05] = ins("ORA", Ora, ZeroPage, 3);
    t[0x06] = ins("ASL", Asl, ZeroPage, 5);
    t[0x08] = ins("PHP", Php, Implied, 3);
    t[0x09] = ins("ORA", Ora, Immediate, 2);
    t[0x0A] = ins("ASL", Asl, Accumulator, 2);
    t[0x0D] = ins("ORA", Ora, Absolute, 4);
    t[0x0E] = ins("ASL", Asl, Absolute, 6);

    t[0x10] = ins("BPL", Bpl, Relative, 2);
    t[0x11] = ins("ORA", Ora, IndirectIndexed, 5);
    t[0x15] = ins("ORA", Ora, ZeroPageX, 4);
    t[0x16] = ins("ASL", Asl, ZeroPageX, 6);
    t[0x18] = ins("CLC", Clc, Implied, 2);
    t[0x19] = ins("ORA", Ora, AbsoluteY, 4);
    t[0x1D] = ins("ORA", Ora, AbsoluteX, 4);
    t[0x1E] = ins("ASL", Asl, AbsoluteX, 7);

    t[0x20] = ins("JSR", Jsr, Absolute, 6);
    t[0x21] = ins("AND", And, IndexedIndirect, 6);
    t[0x24] = ins("BIT", Bit, ZeroPage, 3);
    t[0x25] = ins("AND", And, ZeroPage, 3);
    t[0x26] = ins("ROL", Rol, ZeroPage, 5);
    t[0x28] = ins("PLP", Plp, Implied, 4);
    t[0x29] = ins("AND", And, Immediate, 2);
    t[0x2A] = ins("ROL", Rol, Accumulator, 2);
    t[0x2C] = ins("BIT", Bit, Absolute, 4);
    t[0x2D] = ins("AND", And, Absolute, 4);
    t[0x2E] = ins("ROL", Rol, Absolute, 6);

    t[0x30] = ins("BMI", Bmi, Relative, 2);
    t[0x31] = ins_px("AND", And, IndirectIndexed, 5);
    t[0x35] = ins("AND", And, ZeroPageX, 4);
    t[0x36] = ins("ROL", Rol, ZeroPageX, 6);
    t[0x38] = ins("SEC", Sec, Implied, 2);
    t[0x39] = ins_px("AND", And, AbsoluteY, 4);
    t[0x3D] = ins_px("AND", And, AbsoluteX, 4);
    t[0x3E] = ins("ROL", Rol, AbsoluteX, 7);

    t[0x40] = ins("RTI", Rti, Implied, 6);
    t[0x41] = ins("EOR", Eor, IndexedIndirect, 6);
    t[0x45] = ins("EOR", Eor, ZeroPage, 3);
    t[0x46] = ins("LSR", Lsr, ZeroPage, 5);
    t[0x48] = ins("PHA", Pha, Implied, 3);
    t[0x49] = ins("EOR", Eor, Immediate, 2);
    t[0x4A] = ins("LSR", Lsr, Accumulator, 2);
    t[0x4C] = ins("JMP", Jmp, Absolute, 3);
    t[0x4D] = ins("EOR", Eor, Absolute, 4);
    t[0x4E] = ins("LSR", Lsr, Absolute, 6);

    t[0x50] = ins("BVC", Bvc, Relative, 2);
    t[0x51] = ins_px("EOR", Eor, IndirectIndexed, 5);
    t[0x55] = ins("EOR", Eor, ZeroPageX, 4);
    t[0x56] = ins("LSR", Lsr, ZeroPageX, 6);
    t[0x58] = ins("CLI", Cli, Implied, 2);
    t[0x59] = ins_px("EOR", Eor, AbsoluteY, 4);
    t[0x5D] = ins_px("EOR", Eor, AbsoluteX, 4);
    t[0x5E] = ins("LSR", Lsr, AbsoluteX, 7);

    t[0x60] = ins("RTS", Rts, Implied, 6);
    t[0x61] = ins("ADC", Adc, IndexedIndirect, 6);
    t[0x65] = ins("ADC", Adc, ZeroPage, 3);
    t[0x66] = ins("ROR", Ror, ZeroPage, 5);
    t[0x68] = ins("PLA", Pla, Implied, 4);
    t[0x69] = ins("ADC", Adc, Immediate, 2);
    t[0x6A] = ins("ROR", Ror, Accumulator, 2);
    t[0x6C] = ins("JMP", Jmp, Indirect, 5);
    t[0x6D] = ins("ADC", Adc, Absolute, 4);
    t[0x6E] = ins("ROR", Ror, Absolute, 6);

    t[0x70] = ins("BVS", Bvs, Relative, 2);
    t[0x71] = ins_px("ADC", Adc, IndirectIndexed, 5);
    t[0x75] = ins("ADC", Adc, ZeroPageX, 4);
    t[0x76] = ins("ROR", Ror, ZeroPageX, 6);
    t[0x78] = ins("SEI", Sei, Implied, 2);
    t[0x79] = ins_px("ADC", Adc, AbsoluteY, 4);
    t[0x7D] = ins_px("ADC", Adc, AbsoluteX, 4);
    t[0x7E] = ins("ROR", Ror, AbsoluteX, 7);

    t[0x81] = ins("STA", Sta, IndexedIndirect, 6);
    t[0x84] = ins("STY", Sty, ZeroPage, 3);
    t[0x85] = ins("STA", Sta, ZeroPage, 3);
    t[0x86] = ins("STX", Stx, ZeroPage, 3);
    t[0x88] = ins("DEY", Dey, Implied, 2);
    t[0x8A] = ins("TXA", Txa, Implied, 2);
    t[0x8C] = ins("STY", Sty, Absolute, 4);
    t[0x8D] = ins("STA", Sta, Absolute, 4);
    t[0x8E] = ins("STX", Stx, Absolute, 4);

    t[0x90] = ins("BCC", Bcc, Relative, 2);
    t[0x91] = ins("STA", Sta, IndirectIndexed, 6);
    t[0x94] = ins("STY", Sty, ZeroPageX, 4);
    t[0x95] = ins("STA", Sta, ZeroPageX, 4);
    t[0x96] = ins("STX", Stx, ZeroPageY, 4);
    t[0x98] = ins("TYA", Tya, Implied, 2);
    t[0x99] = ins("STA", Sta, AbsoluteY, 5);
    t[0x9A] = ins("TXS", Txs, Implied, 2);
    t[0x9D] = ins("STA", Sta, AbsoluteX, 5);

    t[0xA0] = ins("LDY", Ldy, Immediate, 2);
    t[0xA1] = ins("LDA", Lda, IndexedIndirect, 6);
    t[0xA2] = ins("LDX", Ldx, Immediate, 2);
    t[0xA4] = ins("LDY", Ldy, ZeroPage, 3);
    t[0xA5] = ins("LDA", Lda, ZeroPage, 3);
    t[0xA6] = ins("LDX", Ldx, ZeroPage, 3);
    t[0xA8] = ins("TAY", Tay, Implied, 2);
    t[0xA9] = ins("LDA", Lda, Immediate, 2);
    t[0xAA] = ins("TAX", Tax, Implied, 2);
    t[0xAC] = ins("LDY", Ldy, Absolute, 4);
    t[0xAD] = ins("LDA", Lda, Absolute, 4);
    t[0xAE] = ins("LDX", Ldx, Absolute, 4);

    t[0xB0] = ins("BCS", Bcs, Relative, 2);
    t[0xB1] = ins_px("LDA", Lda, IndirectIndexed, 5);
    t[0xB4] = ins("LDY", Ldy, ZeroPageX, 4);
    t[0xB5] = ins("LDA", Lda, ZeroPageX, 4);
    t[0xB6] = ins("LDX", Ldx, ZeroPageY, 4);
    t[0xB8] = ins("CLV", Clv, Implied, 2);
    t[0xB9] = ins_px("LDA", Lda, AbsoluteY, 4);
    t[0xBA] = ins("TSX", Tsx, Implied, 2);
    t[0xBC] = ins_px("LDY", Ldy, AbsoluteX, 4);
    t[0xBD] = ins_px("LDA", Lda, AbsoluteX, 4);
    t[0xBE] = ins_px("LDX", Ldx, AbsoluteY, 4);

    t[0xC0] = ins("CPY", Cpy, Immediate, 2);
    t[0xC1] = ins("CMP", Cmp, IndexedIndirect, 6);
    t[0xC4] = ins("CPY", Cpy, ZeroPage, 3);
    t[0xC5] = ins("CMP", Cmp, ZeroPage, 3);
    t[0xC6] = ins("DEC", Dec, ZeroPage, 5);
    t[0xC8] = ins("INY", Iny, Implied, 2);
    t[0xC9] = ins("CMP", Cmp, Immediate, 2);
    t[0xCA] = ins("DEX", Dex, Implied, 2);
    t[0xCC] = ins("CPY", Cpy, Absolute, 4);
    t[0xCD] = ins("CMP", Cmp, Absolute, 4);
    t[0xCE] = ins("DEC", Dec, Absolute, 6);

    t[0xD0] = ins("BNE", Bne, Relative, 2);
    t[0xD1] = ins_px("CMP", Cmp, IndirectIndexed, 5);
    t[0xD5] = ins("CMP", Cmp, ZeroPageX, 4);
    t[0xD6] = ins("DEC", Dec, ZeroPageX, 6);
    t[0xD8] = ins("CLD", Cld, Implied, 2);
    t[0xD9] = ins_px("CMP", Cmp, AbsoluteY, 4);
    t[0xDD] = ins_px("CMP", Cmp, AbsoluteX, 4);
    t[0xDE] = ins("DEC", Dec, AbsoluteX, 7);

    t[0xE0] = ins("CPX", Cpx, Immediate, 2);
    t[0xE1] = ins("SBC", Sbc, IndexedIndirect, 6);
    t[0xE4] = ins("CPX", Cpx, ZeroPage, 3);
    t[0xE5] = ins("SBC", Sbc, ZeroPage, 3);
    t[0xE6] = ins("INC", Inc, ZeroPage, 5);
    t[0xE8] = ins("INX", Inx, Implied, 2);
    t[0xE9] = ins("SBC", Sbc, Immediate, 2);
    t[0xEA] = ins("NOP", Nop, Implied, 2);
    t[0xEC] = ins("CPX", Cpx, Absolute, 4);
    t[0xED] = ins("SBC", Sbc, Absolute, 4);
    t[0xEE] = ins("INC", Inc, Absolute, 6);

    t[0xF0] = ins("BEQ", Beq, Relative, 2);
    t[0xF1] = ins_px("SBC", Sbc, IndirectIndexed, 5);
    t[0xF5] = ins("SBC", Sbc, ZeroPageX, 4);
    t[0xF6] = ins("INC", Inc, ZeroPageX, 6);
    t[0xF8] = ins("SED", Sed, Implied, 2);
    t[0xF9] = ins_px("SBC", Sbc, AbsoluteY, 4);
    t[0xFD] = ins_px("SBC", Sbc, AbsoluteX, 4);
    t[0xFE] = ins("INC", Inc, AbsoluteX, 7);

    t
}

fn set_zero_negative(cpu: &mut Cpu, result: u8) {
    alu::update_zero(&mut cpu.regs.p, result);
    alu::update_negative(&mut cpu.regs.p, result);
}

/// A + value + carry. Carry and overflow are derived from the raw sum
/// before zero/negative, matching the hardware's flag update order.
fn add_with_carry(cpu: &mut Cpu, value: u8) {
    let a = cpu.regs.a;
    let carry_in = cpu.regs.p.contains(StatusFlags::CARRY) as u16;
    let sum = a as u16 + value as u16 + carry_in;
    cpu.regs.p.set(StatusFlags::CARRY, sum > 0xFF);
    let result = (sum & 0xFF) as u8;
    alu::update_overflow(&mut cpu.regs.p, result, a, value);
    set_zero_negative(cpu, result);
    cpu.regs.a = result;
}

/// 0x100 + reg - value; carry out means reg >= value.
fn compare(cpu: &mut Cpu, reg: u8, value: u8) {
    let result = (0x100u16 + reg as u16 - value as u16) as u8;
    cpu.regs.p.set(StatusFlags::CARRY, reg >= value);
    set_zero_negative(cpu, result);
}

/// Taken branches cost +1 cycle, +2 when the target sits on another page
/// than the instruction that follows the branch.
fn branch(cpu: &mut Cpu, operand: u16, taken: bool) {
    let next = cpu.regs.pc.wrapping_add(2);
    if taken {
        let displacement = alu::signed_byte((operand & 0xFF) as u8);
        let target = next.wrapping_add(displacement as u16);
        let mut extra = 1;
        if Memory::has_crossed_page(next, target) {
            extra += 1;
        }
        cpu.clock.last_extra_cycles += extra;
        cpu.regs.pc = target;
    } else {
        cpu.regs.pc = next;
    }
}

fn pull_status(cpu: &mut Cpu, mem: &Memory) {
    let mut p = StatusFlags::from_bits_truncate(cpu.pull(mem));
    p.remove(StatusFlags::BREAK);
    p.insert(StatusFlags::UNUSED);
    cpu.regs.p = p;
}

/// Execute one decoded instruction. The operand comes in exactly as fetched
/// (one or two bytes, already combined little-endian). Returns the base
/// cycle cost from the table; conditional extras land in
/// `clock.last_extra_cycles` as a side effect.
pub fn execute(cpu: &mut Cpu, mem: &mut Memory, opcode: u8, operand: u16) -> Result<u8, Error> {
    let inst = OPCODES[opcode as usize].ok_or(Error::UnknownOpcode {
        opcode,
        pc: cpu.regs.pc,
    })?;

    if inst.page_sensitive && mem.has_extra_cycle(inst.mode, operand, &cpu.regs) {
        cpu.clock.last_extra_cycles += 1;
    }

    let mode = inst.mode;
    match inst.op {
        // Loads and stores
        Op::Lda => {
            let v = mode.get(&cpu.regs, mem, operand);
            cpu.regs.a = v;
            set_zero_negative(cpu, v);
        }
        Op::Ldx => {
            let v = mode.get(&cpu.regs, mem, operand);
            cpu.regs.x = v;
            set_zero_negative(cpu, v);
        }
        Op::Ldy => {
            let v = mode.get(&cpu.regs, mem, operand);
            cpu.regs.y = v;
            set_zero_negative(cpu, v);
        }
        Op::Sta => {
            let v = cpu.regs.a;
            mode.set(&mut cpu.regs, mem, operand, v);
        }
        Op::Stx => {
            let v = cpu.regs.x;
            mode.set(&mut cpu.regs, mem, operand, v);
        }
        Op::Sty => {
            let v = cpu.regs.y;
            mode.set(&mut cpu.regs, mem, operand, v);
        }

        // Register transfers
        Op::Tax => {
            cpu.regs.x = cpu.regs.a;
            let v = cpu.regs.x;
            set_zero_negative(cpu, v);
        }
        Op::Tay => {
            cpu.regs.y = cpu.regs.a;
            let v = cpu.regs.y;
            set_zero_negative(cpu, v);
        }
        Op::Txa => {
            cpu.regs.a = cpu.regs.x;
            let v = cpu.regs.a;
            set_zero_negative(cpu, v);
        }
        Op::Tya => {
            cpu.regs.a = cpu.regs.y;
            let v = cpu.regs.a;
            set_zero_negative(cpu, v);
        }
        Op::Tsx => {
            cpu.regs.x = cpu.regs.sp;
            let v = cpu.regs.x;
            set_zero_negative(cpu, v);
        }
        Op::Txs => {
            cpu.regs.sp = cpu.regs.x;
        }

        // Arithmetic
        Op::Adc => {
            let v = mode.get(&cpu.regs, mem, operand);
            add_with_carry(cpu, v);
        }
        Op::Sbc => {
            // Borrow is folded into the carry-in of the complement
            let v = mode.get(&cpu.regs, mem, operand);
            add_with_carry(cpu, v ^ 0xFF);
        }
        Op::Cmp => {
            let v = mode.get(&cpu.regs, mem, operand);
            compare(cpu, cpu.regs.a, v);
        }
        Op::Cpx => {
            let v = mode.get(&cpu.regs, mem, operand);
            compare(cpu, cpu.regs.x, v);
        }
        Op::Cpy => {
            let v = mode.get(&cpu.regs, mem, operand);
            compare(cpu, cpu.regs.y, v);
        }

        // Logic
        Op::And => {
            let v = mode.get(&cpu.regs, mem, operand);
            cpu.regs.a &= v;
            let r = cpu.regs.a;
            set_zero_negative(cpu, r);
        }
        Op::Ora => {
            let v = mode.get(&cpu.regs, mem, operand);
            cpu.regs.a |= v;
            let r = cpu.regs.a;
            set_zero_negative(cpu, r);
        }
        Op::Eor => {
            let v = mode.get(&cpu.regs, mem, operand);
            cpu.regs.a ^= v;
            let r = cpu.regs.a;
            set_zero_negative(cpu, r);
        }
        Op::Bit => {
            let v = mode.get(&cpu.regs, mem, operand);
            let a = cpu.regs.a;
            cpu.regs.p.set(StatusFlags::ZERO, a & v == 0);
            cpu.regs.p.set(StatusFlags::NEGATIVE, alu::bit_value(7, v) == 1);
            cpu.regs.p.set(StatusFlags::OVERFLOW, alu::bit_value(6, v) == 1);
        }

        // Shifts and rotates
        Op::Asl => {
            let v = mode.get(&cpu.regs, mem, operand);
            cpu.regs.p.set(StatusFlags::CARRY, v & 0x80 != 0);
            let r = v << 1;
            mode.set(&mut cpu.regs, mem, operand, r);
            set_zero_negative(cpu, r);
        }
        Op::Lsr => {
            let v = mode.get(&cpu.regs, mem, operand);
            cpu.regs.p.set(StatusFlags::CARRY, v & 0x01 != 0);
            let r = v >> 1;
            mode.set(&mut cpu.regs, mem, operand, r);
            set_zero_negative(cpu, r);
        }
        Op::Rol => {
            let v = mode.get(&cpu.regs, mem, operand);
            let carry_in = cpu.regs.p.contains(StatusFlags::CARRY) as u8;
            cpu.regs.p.set(StatusFlags::CARRY, v & 0x80 != 0);
            let r = (v << 1) | carry_in;
            mode.set(&mut cpu.regs, mem, operand, r);
            set_zero_negative(cpu, r);
        }
        Op::Ror => {
            let v = mode.get(&cpu.regs, mem, operand);
            let carry_in = cpu.regs.p.contains(StatusFlags::CARRY) as u8;
            cpu.regs.p.set(StatusFlags::CARRY, v & 0x01 != 0);
            let r = (v >> 1) | (carry_in << 7);
            mode.set(&mut cpu.regs, mem, operand, r);
            set_zero_negative(cpu, r);
        }

        // Increments and decrements
        Op::Inc => {
            let r = mode.get(&cpu.regs, mem, operand).wrapping_add(1);
            mode.set(&mut cpu.regs, mem, operand, r);
            set_zero_negative(cpu, r);
        }
        Op::Dec => {
            let r = mode.get(&cpu.regs, mem, operand).wrapping_sub(1);
            mode.set(&mut cpu.regs, mem, operand, r);
            set_zero_negative(cpu, r);
        }
        Op::Inx => {
            cpu.regs.x = cpu.regs.x.wrapping_add(1);
            let v = cpu.regs.x;
            set_zero_negative(cpu, v);
        }
        Op::Iny => {
            cpu.regs.y = cpu.regs.y.wrapping_add(1);
            let v = cpu.regs.y;
            set_zero_negative(cpu, v);
        }
        Op::Dex => {
            cpu.regs.x = cpu.regs.x.wrapping_sub(1);
            let v = cpu.regs.x;
            set_zero_negative(cpu, v);
        }
        Op::Dey => {
            cpu.regs.y = cpu.regs.y.wrapping_sub(1);
            let v = cpu.regs.y;
            set_zero_negative(cpu, v);
        }

        // Flag operations
        Op::Clc => cpu.regs.p.remove(StatusFlags::CARRY),
        Op::Cld => cpu.regs.p.remove(StatusFlags::DECIMAL),
        Op::Cli => cpu.regs.p.remove(StatusFlags::INTERRUPT_DISABLE),
        Op::Clv => cpu.regs.p.remove(StatusFlags::OVERFLOW),
        Op::Sec => cpu.regs.p.insert(StatusFlags::CARRY),
        Op::Sed => cpu.regs.p.insert(StatusFlags::DECIMAL),
        Op::Sei => cpu.regs.p.insert(StatusFlags::INTERRUPT_DISABLE),

        // Stack
        Op::Pha => {
            let v = cpu.regs.a;
            cpu.push(mem, v);
        }
        Op::Php => {
            let v = (cpu.regs.p | StatusFlags::BREAK).bits();
            cpu.push(mem, v);
        }
        Op::Pla => {
            let v = cpu.pull(mem);
            cpu.regs.a = v;
            set_zero_negative(cpu, v);
        }
        Op::Plp => pull_status(cpu, mem),

        Op::Nop => {}

        // Branches: these manage PC themselves
        Op::Bcc => {
            let taken = !cpu.regs.p.contains(StatusFlags::CARRY);
            branch(cpu, operand, taken);
            return Ok(inst.cycles);
        }
        Op::Bcs => {
            let taken = cpu.regs.p.contains(StatusFlags::CARRY);
            branch(cpu, operand, taken);
            return Ok(inst.cycles);
        }
        Op::Beq => {
            let taken = cpu.regs.p.contains(StatusFlags::ZERO);
            branch(cpu, operand, taken);
            return Ok(inst.cycles);
        }
        Op::Bne => {
            let taken = !cpu.regs.p.contains(StatusFlags::ZERO);
            branch(cpu, operand, taken);
            return Ok(inst.cycles);
        }
        Op::Bmi => {
            let taken = cpu.regs.p.contains(StatusFlags::NEGATIVE);
            branch(cpu, operand, taken);
            return Ok(inst.cycles);
        }
        Op::Bpl => {
            let taken = !cpu.regs.p.contains(StatusFlags::NEGATIVE);
            branch(cpu, operand, taken);
            return Ok(inst.cycles);
        }
        Op::Bvs => {
            let taken = cpu.regs.p.contains(StatusFlags::OVERFLOW);
            branch(cpu, operand, taken);
            return Ok(inst.cycles);
        }
        Op::Bvc => {
            let taken = !cpu.regs.p.contains(StatusFlags::OVERFLOW);
            branch(cpu, operand, taken);
            return Ok(inst.cycles);
        }

        // Flow control
        Op::Jmp => {
            cpu.regs.pc = mem.address_for(mode, operand, &cpu.regs);
            return Ok(inst.cycles);
        }
        Op::Jsr => {
            let ret = cpu.regs.pc.wrapping_add(2);
            cpu.push(mem, (ret >> 8) as u8);
            cpu.push(mem, (ret & 0xFF) as u8);
            cpu.regs.pc = operand;
            return Ok(inst.cycles);
        }
        Op::Rts => {
            let lo = cpu.pull(mem) as u16;
            let hi = cpu.pull(mem) as u16;
            cpu.regs.pc = ((hi << 8) | lo).wrapping_add(1);
            return Ok(inst.cycles);
        }
        Op::Rti => {
            pull_status(cpu, mem);
            let lo = cpu.pull(mem) as u16;
            let hi = cpu.pull(mem) as u16;
            cpu.regs.pc = (hi << 8) | lo;
            return Ok(inst.cycles);
        }
        Op::Brk => {
            // PCL, PCH, then P land at SP, SP-1, SP-2; SP itself only drops
            // by two in this model. Each slot wraps within page 1.
            let ret = cpu.regs.pc.wrapping_add(2);
            let sp = cpu.regs.sp;
            mem.store(STACK_BASE + sp as u16, (ret & 0xFF) as u8);
            mem.store(STACK_BASE + sp.wrapping_sub(1) as u16, (ret >> 8) as u8);
            mem.store(
                STACK_BASE + sp.wrapping_sub(2) as u16,
                (cpu.regs.p | StatusFlags::BREAK).bits(),
            );
            cpu.regs.sp = sp.wrapping_sub(2);
            cpu.regs.p.insert(StatusFlags::BREAK);
            cpu.regs.pc = mem.load_word(IRQ_VECTOR);
            return Ok(inst.cycles);
        }
    }

    cpu.regs.pc = cpu.regs.pc.wrapping_add(mode.instruction_size());
    Ok(inst.cycles)
}
