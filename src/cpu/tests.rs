use super::*;
use crate::cpu::instructions::OPCODES;
use crate::disasm::Disassembler;
use crate::memory::{Memory, IRQ_VECTOR, RESET_VECTOR};
use crate::scheduler;

#[path = "addressing_tests.rs"]
mod addressing_mode_tests;

fn setup() -> (Cpu, Memory) {
    let mut mem = Memory::new();
    // Reset vector -> 0x8000
    mem.store_word(RESET_VECTOR, 0x8000);
    let mut cpu = Cpu::new();
    cpu.power_up(&mem);
    (cpu, mem)
}

fn load_program(mem: &mut Memory, program: &[u8], start: u16) {
    mem.copy(program, start);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_up_defaults() {
        let (cpu, _mem) = setup();
        assert_eq!(cpu.regs.pc, 0x8000);
        assert_eq!(cpu.regs.sp, 0xFD);
        assert_eq!(cpu.regs.a, 0);
        assert_eq!(cpu.regs.x, 0);
        assert_eq!(cpu.regs.y, 0);
        assert_eq!(cpu.regs.p.bits(), 0x34);
    }

    #[test]
    fn test_reset_drops_sp_and_sets_interrupt_disable() {
        let (mut cpu, mem) = setup();
        cpu.regs.sp = 0xFD;
        cpu.regs.a = 0x42;
        cpu.regs.p.remove(StatusFlags::INTERRUPT_DISABLE);

        cpu.reset(&mem);

        assert_eq!(cpu.regs.sp, 0xFA);
        assert_eq!(cpu.regs.a, 0x42); // registers survive a reset
        assert!(cpu.regs.p.contains(StatusFlags::INTERRUPT_DISABLE));
        assert_eq!(cpu.regs.pc, 0x8000);
    }

    #[test]
    fn test_lda_immediate() {
        let (mut cpu, mut mem) = setup();

        // LDA #$42
        load_program(&mut mem, &[0xA9, 0x42], 0x8000);

        let cycles = scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0x42);
        assert_eq!(cpu.regs.pc, 0x8002);
        assert_eq!(cycles, 2);
        assert!(!cpu.regs.p.contains(StatusFlags::ZERO));
        assert!(!cpu.regs.p.contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn test_lda_zero_flag() {
        let (mut cpu, mut mem) = setup();

        // LDA #$00
        load_program(&mut mem, &[0xA9, 0x00], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.contains(StatusFlags::ZERO));
        assert!(!cpu.regs.p.contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn test_lda_negative_flag() {
        let (mut cpu, mut mem) = setup();

        // LDA #$80
        load_program(&mut mem, &[0xA9, 0x80], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0x80);
        assert!(!cpu.regs.p.contains(StatusFlags::ZERO));
        assert!(cpu.regs.p.contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn test_sta_zero_page() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x42;

        // STA $10
        load_program(&mut mem, &[0x85, 0x10], 0x8000);
        let cycles = scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(mem.load(0x0010), 0x42);
        assert_eq!(cpu.regs.pc, 0x8002);
        assert_eq!(cycles, 3);
    }

    #[test]
    fn test_adc_no_carry() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x10;
        cpu.regs.p.remove(StatusFlags::CARRY);

        // ADC #$20
        load_program(&mut mem, &[0x69, 0x20], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0x30);
        assert!(!cpu.regs.p.contains(StatusFlags::CARRY));
        assert!(!cpu.regs.p.contains(StatusFlags::OVERFLOW));
    }

    #[test]
    fn test_adc_with_carry_out() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0xFF;
        cpu.regs.p.remove(StatusFlags::CARRY);

        // ADC #$01
        load_program(&mut mem, &[0x69, 0x01], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));
        assert!(cpu.regs.p.contains(StatusFlags::ZERO));
    }

    #[test]
    fn test_adc_signed_overflow_with_carry_in() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x90;
        cpu.regs.p.insert(StatusFlags::CARRY);

        // ADC #$83: 0x90 + 0x83 + 1 = 0x114
        load_program(&mut mem, &[0x69, 0x83], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0x14);
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));
        assert!(cpu.regs.p.contains(StatusFlags::OVERFLOW));
        assert!(!cpu.regs.p.contains(StatusFlags::ZERO));
        assert!(!cpu.regs.p.contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn test_sbc() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x50;
        cpu.regs.p.insert(StatusFlags::CARRY); // no borrow

        // SBC #$20
        load_program(&mut mem, &[0xE9, 0x20], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0x30);
        assert!(cpu.regs.p.contains(StatusFlags::CARRY)); // no borrow occurred
    }

    #[test]
    fn test_sbc_with_borrow() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x10;
        cpu.regs.p.insert(StatusFlags::CARRY);

        // SBC #$20: result wraps, carry cleared
        load_program(&mut mem, &[0xE9, 0x20], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0xF0);
        assert!(!cpu.regs.p.contains(StatusFlags::CARRY));
        assert!(cpu.regs.p.contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn test_and_all_ones_with_zero_accumulator() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x00;

        // AND #$FF
        load_program(&mut mem, &[0x29, 0xFF], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.contains(StatusFlags::ZERO));
        assert!(!cpu.regs.p.contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn test_ora_eor() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x0F;

        // ORA #$F0; EOR #$FF
        load_program(&mut mem, &[0x09, 0xF0, 0x49, 0xFF], 0x8000);

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.a, 0xFF);

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.contains(StatusFlags::ZERO));
    }

    #[test]
    fn test_cmp_equal_sets_carry_and_zero() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x30;

        // CMP #$30
        load_program(&mut mem, &[0xC9, 0x30], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert!(cpu.regs.p.contains(StatusFlags::CARRY));
        assert!(cpu.regs.p.contains(StatusFlags::ZERO));
        assert!(!cpu.regs.p.contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn test_cmp_less_than_clears_carry() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x10;

        // CMP #$20
        load_program(&mut mem, &[0xC9, 0x20], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert!(!cpu.regs.p.contains(StatusFlags::CARRY));
        assert!(!cpu.regs.p.contains(StatusFlags::ZERO));
    }

    #[test]
    fn test_bit_instruction() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x0F;
        mem.store(0x10, 0xF0);

        // BIT $10
        load_program(&mut mem, &[0x24, 0x10], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert!(cpu.regs.p.contains(StatusFlags::ZERO));
        assert!(cpu.regs.p.contains(StatusFlags::NEGATIVE));
        assert!(cpu.regs.p.contains(StatusFlags::OVERFLOW));
    }

    #[test]
    fn test_inx_wraparound() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.x = 0xFF;

        // INX
        load_program(&mut mem, &[0xE8], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.x, 0x00);
        assert!(cpu.regs.p.contains(StatusFlags::ZERO));
    }

    #[test]
    fn test_inc_dec_memory() {
        let (mut cpu, mut mem) = setup();
        mem.store(0x20, 0x7F);

        // INC $20; DEC $20
        load_program(&mut mem, &[0xE6, 0x20, 0xC6, 0x20], 0x8000);

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(mem.load(0x20), 0x80);
        assert!(cpu.regs.p.contains(StatusFlags::NEGATIVE));

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(mem.load(0x20), 0x7F);
        assert!(!cpu.regs.p.contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn test_shift_operations() {
        let (mut cpu, mut mem) = setup();

        // ASL A; LSR A; ROL A; ROR A
        load_program(&mut mem, &[0x0A, 0x4A, 0x2A, 0x6A], 0x8000);

        cpu.regs.a = 0x81;
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.a, 0x02);
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));

        cpu.regs.a = 0x81;
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.a, 0x40);
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));

        cpu.regs.a = 0x80;
        cpu.regs.p.insert(StatusFlags::CARRY);
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.a, 0x01);
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));

        cpu.regs.a = 0x01;
        cpu.regs.p.insert(StatusFlags::CARRY);
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));
    }

    #[test]
    fn test_transfers() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x99;

        // TAX; TXS; TSX
        load_program(&mut mem, &[0xAA, 0x9A, 0xBA], 0x8000);

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.x, 0x99);
        assert!(cpu.regs.p.contains(StatusFlags::NEGATIVE));

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.sp, 0x99);

        cpu.regs.x = 0;
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.x, 0x99);
    }

    #[test]
    fn test_jmp_absolute() {
        let (mut cpu, mut mem) = setup();

        // JMP $1234
        load_program(&mut mem, &[0x4C, 0x34, 0x12], 0x8000);
        let cycles = scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.pc, 0x1234);
        assert_eq!(cycles, 3);
    }

    #[test]
    fn test_jmp_indirect_page_wrap_bug() {
        let (mut cpu, mut mem) = setup();
        mem.store(0x10FF, 0x34);
        mem.store(0x1000, 0x12); // fetched instead of 0x1100

        // JMP ($10FF)
        load_program(&mut mem, &[0x6C, 0xFF, 0x10], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.pc, 0x1234);
    }

    #[test]
    fn test_jsr_rts() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.sp = 0xFF;

        // JSR $9000 ... RTS at $9000
        load_program(&mut mem, &[0x20, 0x00, 0x90], 0x8000);
        load_program(&mut mem, &[0x60], 0x9000);

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.pc, 0x9000);
        assert_eq!(cpu.regs.sp, 0xFD);
        assert_eq!(mem.load(0x01FF), 0x80); // return address high
        assert_eq!(mem.load(0x01FE), 0x02); // return address low

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.pc, 0x8003);
        assert_eq!(cpu.regs.sp, 0xFF);
    }

    #[test]
    fn test_stack_push_pull() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.a = 0x42;
        cpu.regs.sp = 0xFF;

        // PHA; PLA
        load_program(&mut mem, &[0x48, 0x68], 0x8000);

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.sp, 0xFE);
        assert_eq!(mem.load(0x01FF), 0x42);

        cpu.regs.a = 0x00;
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.a, 0x42);
        assert_eq!(cpu.regs.sp, 0xFF);
    }

    #[test]
    fn test_php_sets_break_in_pushed_copy() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.p = StatusFlags::from_bits_truncate(0x21);
        cpu.regs.sp = 0xFF;

        // PHP; PLP
        load_program(&mut mem, &[0x08, 0x28], 0x8000);

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(mem.load(0x01FF), 0x31); // BREAK set in the pushed copy

        scheduler::step(&mut cpu, &mut mem).unwrap();
        // BREAK does not come back on a pull
        assert!(!cpu.regs.p.contains(StatusFlags::BREAK));
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));
    }

    #[test]
    fn test_brk_stack_layout_and_vector() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.p = StatusFlags::from_bits_truncate(0b1010_0011);
        cpu.regs.sp = 0xFF;
        cpu.regs.pc = 0x4023;
        mem.store_word(IRQ_VECTOR, 0x2A3F);
        mem.store(0x4023, 0x00); // BRK

        let cycles = scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cycles, 7);
        assert_eq!(cpu.regs.sp, 0xFD);
        assert_eq!(cpu.regs.pc, 0x2A3F);
        assert!(cpu.regs.p.contains(StatusFlags::BREAK));
        assert_eq!(mem.load(0x01FF), 0x25); // PCL of PC+2
        assert_eq!(mem.load(0x01FE), 0x40); // PCH
        assert_eq!(mem.load(0x01FD), 0b1011_0011); // P with BREAK set
    }

    #[test]
    fn test_brk_stack_slots_wrap_within_page_one() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.sp = 0x01;
        cpu.regs.pc = 0x4023;
        mem.store_word(IRQ_VECTOR, 0x2A3F);
        mem.store(0x4023, 0x00); // BRK

        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.sp, 0xFF);
        assert_eq!(mem.load(0x0101), 0x25); // PCL of PC+2
        assert_eq!(mem.load(0x0100), 0x40); // PCH
        assert_eq!(mem.load(0x01FF), 0x34); // P|BREAK stays in page 1
    }

    #[test]
    fn test_rti_restores_status_and_pc() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.sp = 0xFC;
        mem.store(0x01FD, 0b1000_0001); // status
        mem.store(0x01FE, 0x34); // PCL
        mem.store(0x01FF, 0x12); // PCH

        // RTI
        load_program(&mut mem, &[0x40], 0x8000);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.pc, 0x1234);
        assert_eq!(cpu.regs.sp, 0xFF);
        assert!(cpu.regs.p.contains(StatusFlags::NEGATIVE));
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));
        assert!(!cpu.regs.p.contains(StatusFlags::BREAK));
    }

    #[test]
    fn test_branch_not_taken_costs_nothing_extra() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.p.remove(StatusFlags::ZERO);

        // BEQ $10
        load_program(&mut mem, &[0xF0, 0x10], 0x8000);
        let cycles = scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.pc, 0x8002);
        assert_eq!(cycles, 2);
        assert_eq!(cpu.clock.last_extra_cycles, 0);
    }

    #[test]
    fn test_branch_taken_same_page_costs_one_extra() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.p.insert(StatusFlags::ZERO);

        // BEQ $10
        load_program(&mut mem, &[0xF0, 0x10], 0x8000);
        let cycles = scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.pc, 0x8012);
        assert_eq!(cycles, 3);
        assert_eq!(cpu.clock.last_extra_cycles, 1);
    }

    #[test]
    fn test_branch_taken_across_page_costs_two_extra() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.p.insert(StatusFlags::ZERO);
        cpu.regs.pc = 0x80F0;

        // BEQ $20: next is $80F2, target $8112
        load_program(&mut mem, &[0xF0, 0x20], 0x80F0);
        let cycles = scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.pc, 0x8112);
        assert_eq!(cycles, 4);
        assert_eq!(cpu.clock.last_extra_cycles, 2);
    }

    #[test]
    fn test_branch_backwards() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.p.insert(StatusFlags::ZERO);
        cpu.regs.pc = 0x8010;

        // BEQ -4 (0xFC): next is $8012, target $800E
        load_program(&mut mem, &[0xF0, 0xFC], 0x8010);
        scheduler::step(&mut cpu, &mut mem).unwrap();

        assert_eq!(cpu.regs.pc, 0x800E);
    }

    #[test]
    fn test_pc_wraps_at_address_space_end() {
        let (mut cpu, mut mem) = setup();
        cpu.regs.pc = 0xFFFF;
        mem.store(0xFFFF, 0xEA); // NOP

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert_eq!(cpu.regs.pc, 0x0000);
    }

    #[test]
    fn test_unknown_opcode_is_a_hard_error() {
        let (mut cpu, mut mem) = setup();
        mem.store(0x8000, 0xFF);

        let err = scheduler::step(&mut cpu, &mut mem).unwrap_err();
        assert_eq!(
            err,
            crate::errors::Error::UnknownOpcode {
                opcode: 0xFF,
                pc: 0x8000
            }
        );
    }

    #[test]
    fn test_flag_set_clear_instructions() {
        let (mut cpu, mut mem) = setup();

        // SEC; SED; CLC; CLD; CLV
        load_program(&mut mem, &[0x38, 0xF8, 0x18, 0xD8, 0xB8], 0x8000);

        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert!(cpu.regs.p.contains(StatusFlags::CARRY));
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert!(cpu.regs.p.contains(StatusFlags::DECIMAL));
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert!(!cpu.regs.p.contains(StatusFlags::CARRY));
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert!(!cpu.regs.p.contains(StatusFlags::DECIMAL));
        cpu.regs.p.insert(StatusFlags::OVERFLOW);
        scheduler::step(&mut cpu, &mut mem).unwrap();
        assert!(!cpu.regs.p.contains(StatusFlags::OVERFLOW));
    }

    #[test]
    fn test_decode_width_matches_execution_width() {
        // Every documented opcode must occupy the same byte count in the
        // disassembler as the engine advances by when executing it.
        for (opcode, entry) in OPCODES.iter().enumerate() {
            let Some(inst) = entry else { continue };
            let size = inst.mode.instruction_size() as usize;

            let buffer = [opcode as u8, 0x00, 0x00];
            let mut disassembler = Disassembler::new();
            disassembler.parse(&buffer[..size], 0x8000);
            let code = disassembler.code().unwrap();
            assert_eq!(code.num_lines(), 1, "opcode {opcode:#04X}");
            let line = code.line(0).unwrap();
            assert!(line.supported, "opcode {opcode:#04X}");
            assert_eq!(line.bytes.len(), size, "opcode {opcode:#04X}");
        }
    }

    #[test]
    fn test_opcode_table_has_all_documented_entries() {
        let count = OPCODES.iter().filter(|e| e.is_some()).count();
        assert_eq!(count, 151);
    }
}
