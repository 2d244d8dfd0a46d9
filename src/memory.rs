//! Flat 64 KiB CPU address space with the NES mirror windows, little-endian
//! word helpers, and the page-cross predicates the cycle accounting needs.

use crate::cpu::addressing::AddressingMode;
use crate::cpu::Registers;

pub const RAM_SIZE: u16 = 0x0800;
pub const RAM_MIRRORS_END: u16 = 0x1FFF;
pub const PPU_REGISTERS_START: u16 = 0x2000;
pub const PPU_REGISTERS_SIZE: u16 = 0x0008;
pub const PPU_MIRRORS_END: u16 = 0x3FFF;

pub const PRG_ROM_START: u16 = 0x8000;
pub const STACK_BASE: u16 = 0x0100;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Last store observed, recorded only while `debug` is on. This is the only
/// channel the debugger has into "what changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastWrite {
    pub address: u16,
    pub value: u8,
}

pub struct Memory {
    bytes: Box<[u8; 0x10000]>,
    /// Explicit debug-mode switch; set by the emulator when a debugger is
    /// attached so this module never has to know about the debugger itself.
    pub debug: bool,
    last_write: Option<LastWrite>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            bytes: Box::new([0; 0x10000]),
            debug: false,
            last_write: None,
        }
    }

    /// Internal RAM repeats every 0x800 bytes up to 0x2000, the PPU register
    /// window every 8 bytes up to 0x4000. Everything else is addressed
    /// directly.
    fn resolve(addr: u16) -> u16 {
        match addr {
            0x0000..=RAM_MIRRORS_END => addr & (RAM_SIZE - 1),
            PPU_REGISTERS_START..=PPU_MIRRORS_END => {
                PPU_REGISTERS_START | (addr & (PPU_REGISTERS_SIZE - 1))
            }
            _ => addr,
        }
    }

    pub fn load(&self, addr: u16) -> u8 {
        self.bytes[Self::resolve(addr) as usize]
    }

    pub fn store(&mut self, addr: u16, value: u8) {
        self.bytes[Self::resolve(addr) as usize] = value;
        if self.debug {
            self.last_write = Some(LastWrite {
                address: addr,
                value,
            });
        }
    }

    pub fn load_word(&self, addr: u16) -> u16 {
        let lo = self.load(addr) as u16;
        let hi = self.load(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub fn store_word(&mut self, addr: u16, value: u16) {
        self.store(addr, (value & 0xFF) as u8);
        self.store(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// 16-bit fetch reproducing the 6502 indirect-JMP bug: when the pointer's
    /// low byte is 0xFF the high byte is fetched from the start of the same
    /// page instead of crossing into the next one.
    pub fn load_word_page_wrapped(&self, addr: u16) -> u16 {
        let lo = self.load(addr) as u16;
        let hi_addr = (addr & 0xFF00) | ((addr.wrapping_add(1)) & 0x00FF);
        let hi = self.load(hi_addr) as u16;
        (hi << 8) | lo
    }

    /// Zero-page pointer dereference; the second byte wraps within page zero.
    pub fn load_word_zero_page(&self, ptr: u8) -> u16 {
        let lo = self.load(ptr as u16) as u16;
        let hi = self.load(ptr.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    /// Bulk PRG injection; the ROM component hands us a concatenated bank
    /// image and we lay it down verbatim.
    pub fn copy(&mut self, buffer: &[u8], offset: u16) {
        for (i, &byte) in buffer.iter().enumerate() {
            let addr = offset.wrapping_add(i as u16);
            self.bytes[addr as usize] = byte;
        }
    }

    pub fn last_write(&self) -> Option<LastWrite> {
        self.last_write
    }

    pub fn has_crossed_page(a: u16, b: u16) -> bool {
        (a & 0xFF00) != (b & 0xFF00)
    }

    /// Effective address for the address-producing modes. Callers pass the
    /// raw operand exactly as fetched.
    pub fn address_for(&self, mode: AddressingMode, operand: u16, regs: &Registers) -> u16 {
        match mode {
            AddressingMode::ZeroPage => operand & 0x00FF,
            AddressingMode::ZeroPageX => (operand.wrapping_add(regs.x as u16)) & 0x00FF,
            AddressingMode::ZeroPageY => (operand.wrapping_add(regs.y as u16)) & 0x00FF,
            AddressingMode::Absolute => operand,
            AddressingMode::AbsoluteX => operand.wrapping_add(regs.x as u16),
            AddressingMode::AbsoluteY => operand.wrapping_add(regs.y as u16),
            AddressingMode::Indirect => self.load_word_page_wrapped(operand),
            AddressingMode::IndexedIndirect => {
                let ptr = (operand as u8).wrapping_add(regs.x);
                self.load_word_zero_page(ptr)
            }
            AddressingMode::IndirectIndexed => {
                let base = self.load_word_zero_page(operand as u8);
                base.wrapping_add(regs.y as u16)
            }
            // Accumulator, Immediate, Relative and Implied never produce an
            // address.
            _ => 0,
        }
    }

    /// True when an indexed mode crosses a page for this operand, which is
    /// what charges the +1 cycle on the cycle-sensitive read instructions.
    pub fn has_extra_cycle(&self, mode: AddressingMode, operand: u16, regs: &Registers) -> bool {
        match mode {
            AddressingMode::AbsoluteX => {
                Self::has_crossed_page(operand, operand.wrapping_add(regs.x as u16))
            }
            AddressingMode::AbsoluteY => {
                Self::has_crossed_page(operand, operand.wrapping_add(regs.y as u16))
            }
            AddressingMode::IndirectIndexed => {
                let base = self.load_word_zero_page(operand as u8);
                Self::has_crossed_page(base, base.wrapping_add(regs.y as u16))
            }
            _ => false,
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_is_mirrored_every_0x800_bytes() {
        let mut mem = Memory::new();
        for addr in [0x0000u16, 0x0042, 0x07FF] {
            mem.store(addr, 0xAB);
            assert_eq!(mem.load(addr), 0xAB);
            assert_eq!(mem.load(addr + 0x0800), 0xAB);
            assert_eq!(mem.load(addr + 0x1000), 0xAB);
            assert_eq!(mem.load(addr + 0x1800), 0xAB);

            // Writing through a mirror lands in the same backing byte
            mem.store(addr + 0x1800, 0xCD);
            assert_eq!(mem.load(addr), 0xCD);
        }
    }

    #[test]
    fn ppu_registers_are_mirrored_every_8_bytes() {
        let mut mem = Memory::new();
        mem.store(0x2002, 0x55);
        assert_eq!(mem.load(0x200A), 0x55);
        assert_eq!(mem.load(0x3FFA), 0x55);

        mem.store(0x3456, 0x99); // mirrors 0x2006
        assert_eq!(mem.load(0x2006), 0x99);
    }

    #[test]
    fn words_are_little_endian() {
        let mut mem = Memory::new();
        mem.store_word(0x8000, 0x2A3F);
        assert_eq!(mem.load(0x8000), 0x3F);
        assert_eq!(mem.load(0x8001), 0x2A);
        assert_eq!(mem.load_word(0x8000), 0x2A3F);
    }

    #[test]
    fn indirect_fetch_wraps_within_page() {
        let mut mem = Memory::new();
        mem.store(0x80FF, 0x34);
        mem.store(0x8100, 0xFF); // would be the high byte without the bug
        mem.store(0x8000, 0x12);
        assert_eq!(mem.load_word_page_wrapped(0x80FF), 0x1234);
    }

    #[test]
    fn zero_page_pointer_wraps() {
        let mut mem = Memory::new();
        mem.store(0x00FF, 0x34);
        mem.store(0x0000, 0x12);
        assert_eq!(mem.load_word_zero_page(0xFF), 0x1234);
    }

    #[test]
    fn last_write_only_recorded_in_debug_mode() {
        let mut mem = Memory::new();
        mem.store(0x0200, 0x42);
        assert_eq!(mem.last_write(), None);

        mem.debug = true;
        mem.store(0x0200, 0x43);
        assert_eq!(
            mem.last_write(),
            Some(LastWrite {
                address: 0x0200,
                value: 0x43
            })
        );
    }

    #[test]
    fn page_cross_predicate() {
        assert!(Memory::has_crossed_page(0x10FF, 0x1100));
        assert!(!Memory::has_crossed_page(0x1000, 0x10FF));
    }
}
