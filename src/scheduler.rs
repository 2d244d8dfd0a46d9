//! Cooperative execution scheduler. One call to `run_tick` executes at most
//! one cycle-budget's worth of instructions and then returns, so the host
//! event loop (or a test) owns re-invocation and pause requests stay
//! responsive between ticks. Instructions themselves are atomic; pausing is
//! only observed at the top of the loop, before the next fetch.

use log::trace;

use crate::cpu::instructions::{self, OPCODES};
use crate::cpu::Cpu;
use crate::debugger::Debugger;
use crate::errors::Error;
use crate::memory::Memory;

/// What one scheduling tick accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub cycles: u64,
    pub instructions: u64,
    pub paused: bool,
}

/// Fetch and execute exactly one instruction, rolling its full cost
/// (base + extras) into the clock.
pub fn step(cpu: &mut Cpu, mem: &mut Memory) -> Result<u8, Error> {
    let pc = cpu.regs.pc;
    let opcode = mem.load(pc);
    let inst = OPCODES[opcode as usize].ok_or(Error::UnknownOpcode { opcode, pc })?;

    let operand = match inst.mode.instruction_size() {
        1 => 0,
        2 => mem.load(pc.wrapping_add(1)) as u16,
        _ => mem.load_word(pc.wrapping_add(1)),
    };

    cpu.clock.last_extra_cycles = 0;
    let base = instructions::execute(cpu, mem, opcode, operand)?;
    let total = base + cpu.clock.last_extra_cycles;
    cpu.clock.last_instruction_cycles = total;
    cpu.clock.cycles += total as u64;
    Ok(total)
}

/// Run one tick's cycle budget. With a debugger, `validate()` runs before
/// every instruction, so a breakpoint on PC X fires before X has any effect.
pub fn run_tick(
    cpu: &mut Cpu,
    mem: &mut Memory,
    mut debugger: Option<&mut Debugger>,
) -> Result<Tick, Error> {
    let start_cycles = cpu.clock.cycles;
    let next_tick_cycles = start_cycles + cpu.clock.frequency as u64;
    let mut instructions = 0u64;
    let mut paused = false;

    while cpu.clock.cycles < next_tick_cycles {
        if let Some(d) = debugger.as_deref_mut() {
            d.validate(cpu, mem);
            if !d.is_running() {
                paused = true;
                break;
            }
        }

        step(cpu, mem)?;
        instructions += 1;

        if let Some(d) = debugger.as_deref_mut() {
            d.note_instruction();
        }
    }

    let tick = Tick {
        cycles: cpu.clock.cycles - start_cycles,
        instructions,
        paused,
    };
    trace!(
        "tick: {} instructions, {} cycles{}",
        tick.instructions,
        tick.cycles,
        if tick.paused { ", paused" } else { "" }
    );
    Ok(tick)
}
