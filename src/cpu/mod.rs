use std::fmt;

use bitflags::bitflags;

use crate::memory::{Memory, RESET_VECTOR, STACK_BASE};

pub mod addressing;
pub mod alu;
pub mod instructions;

#[cfg(test)]
mod tests;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const CARRY = 0b00000001;
        const ZERO = 0b00000010;
        const INTERRUPT_DISABLE = 0b00000100;
        const DECIMAL = 0b00001000;
        const BREAK = 0b00010000;
        const UNUSED = 0b00100000;
        const OVERFLOW = 0b01000000;
        const NEGATIVE = 0b10000000;
    }
}

/// Register file. Width truncation is carried by the field types; all
/// arithmetic on them goes through `wrapping_*`.
pub struct Registers {
    pub pc: u16,
    pub sp: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: StatusFlags,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            pc: 0,
            sp: 0xFD,
            a: 0,
            x: 0,
            y: 0,
            p: StatusFlags::from_bits_truncate(0x34),
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Cycle bookkeeping, mutated once per executed instruction by the
/// scheduler after the instruction engine reports its extra cycles.
pub struct Clock {
    /// Cycle budget per scheduling tick (one frame's worth by default).
    pub frequency: u32,
    pub cycles: u64,
    pub last_extra_cycles: u8,
    pub last_instruction_cycles: u8,
}

/// Cycles the NTSC CPU runs in one video frame; the default tick budget.
pub const DEFAULT_FREQUENCY: u32 = 29_780;

impl Clock {
    pub fn new(frequency: u32) -> Self {
        Clock {
            frequency,
            cycles: 0,
            last_extra_cycles: 0,
            last_instruction_cycles: 0,
        }
    }
}

/// One CPU instance: registers plus clock. Memory is owned by the emulator
/// context and passed in by reference, so there are no hidden globals.
pub struct Cpu {
    pub regs: Registers,
    pub clock: Clock,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            regs: Registers::new(),
            clock: Clock::new(DEFAULT_FREQUENCY),
        }
    }

    /// Full power-up defaults, then PC from the reset vector.
    pub fn power_up(&mut self, mem: &Memory) {
        self.regs = Registers::new();
        self.regs.pc = mem.load_word(RESET_VECTOR);
    }

    /// Hardware reset leaves A/X/Y alone: SP drops by 3, interrupts are
    /// disabled, and execution restarts at the reset vector.
    pub fn reset(&mut self, mem: &Memory) {
        self.regs.sp = self.regs.sp.wrapping_sub(3);
        self.regs.p.insert(StatusFlags::INTERRUPT_DISABLE);
        self.regs.pc = mem.load_word(RESET_VECTOR);
    }

    pub fn push(&mut self, mem: &mut Memory, value: u8) {
        mem.store(STACK_BASE + self.regs.sp as u16, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    pub fn pull(&mut self, mem: &Memory) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        mem.load(STACK_BASE + self.regs.sp as u16)
    }

    pub fn state(&self) -> CpuState {
        CpuState {
            pc: self.regs.pc,
            sp: self.regs.sp,
            a: self.regs.a,
            x: self.regs.x,
            y: self.regs.y,
            p: self.regs.p.bits(),
            cycles: self.clock.cycles,
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot carried by pause events and printed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub pc: u16,
    pub sp: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub cycles: u64,
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC:${:04X} A:{:02X} X:{:02X} Y:{:02X} SP:{:02X} P:{:02X} [{}{}-{}{}{}{}{}] CYC:{}",
            self.pc,
            self.a,
            self.x,
            self.y,
            self.sp,
            self.p,
            if self.p & 0x80 != 0 { 'N' } else { '-' },
            if self.p & 0x40 != 0 { 'V' } else { '-' },
            if self.p & 0x10 != 0 { 'B' } else { '-' },
            if self.p & 0x08 != 0 { 'D' } else { '-' },
            if self.p & 0x04 != 0 { 'I' } else { '-' },
            if self.p & 0x02 != 0 { 'Z' } else { '-' },
            if self.p & 0x01 != 0 { 'C' } else { '-' },
            self.cycles,
        )
    }
}
