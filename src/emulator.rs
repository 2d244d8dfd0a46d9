//! Owning context: one CPU, one memory image, at most one debugger. Every
//! subsystem borrows from here; nothing lives in globals.

use log::debug;

use crate::cpu::Cpu;
use crate::debugger::Debugger;
use crate::errors::Error;
use crate::memory::{Memory, PRG_ROM_START};
use crate::scheduler::{self, Tick};

pub struct Emulator {
    pub cpu: Cpu,
    pub memory: Memory,
    debugger: Option<Debugger>,
}

impl Emulator {
    pub fn new() -> Self {
        Emulator {
            cpu: Cpu::new(),
            memory: Memory::new(),
            debugger: None,
        }
    }

    /// Lay a concatenated PRG image down at 0x8000. Bank layout is the ROM
    /// component's problem; this just copies bytes.
    pub fn load_prg(&mut self, prg: &[u8]) {
        debug!("loading {} PRG bytes at ${:04X}", prg.len(), PRG_ROM_START);
        self.memory.copy(prg, PRG_ROM_START);
    }

    pub fn power_up(&mut self) {
        self.cpu.power_up(&self.memory);
        debug!("power-up, PC=${:04X}", self.cpu.regs.pc);
    }

    pub fn reset(&mut self) {
        self.cpu.reset(&self.memory);
        debug!("reset, PC=${:04X}", self.cpu.regs.pc);
    }

    /// Attaching a debugger turns on write tracking; that flag is what lets
    /// memory breakpoints see stores.
    pub fn attach_debugger(&mut self, debugger: Debugger) {
        self.memory.debug = true;
        self.debugger = Some(debugger);
    }

    pub fn debugger(&self) -> Result<&Debugger, Error> {
        self.debugger.as_ref().ok_or(Error::NoDebugger)
    }

    pub fn debugger_mut(&mut self) -> Result<&mut Debugger, Error> {
        self.debugger.as_mut().ok_or(Error::NoDebugger)
    }

    /// One cooperative tick. Pause events queued during the tick are
    /// delivered after the loop unwinds, before this returns.
    pub fn run_tick(&mut self) -> Result<Tick, Error> {
        let tick = scheduler::run_tick(&mut self.cpu, &mut self.memory, self.debugger.as_mut())?;
        if let Some(d) = self.debugger.as_mut() {
            d.drain_events();
        }
        Ok(tick)
    }

    /// Execute exactly one instruction. Break conditions are not evaluated
    /// here; an attached debugger only has the instruction counted.
    pub fn step(&mut self) -> Result<u8, Error> {
        let cycles = scheduler::step(&mut self.cpu, &mut self.memory)?;
        if let Some(d) = self.debugger.as_mut() {
            d.note_instruction();
        }
        Ok(cycles)
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn prg_image(reset_target: u16) -> Vec<u8> {
        let mut image = vec![0xEA; 0x8000]; // NOP fill
        image[0x7FFC] = (reset_target & 0xFF) as u8;
        image[0x7FFD] = (reset_target >> 8) as u8;
        image
    }

    #[test]
    fn power_up_reads_the_vector_from_the_loaded_image() {
        let mut emulator = Emulator::new();
        emulator.load_prg(&prg_image(0x8000));
        emulator.power_up();

        assert_eq!(emulator.cpu.regs.pc, 0x8000);
        let cycles = emulator.step().unwrap();
        assert_eq!(cycles, 2);
        assert_eq!(emulator.cpu.regs.pc, 0x8001);
    }

    #[test]
    fn debugger_access_without_one_attached_is_an_error() {
        let mut emulator = Emulator::new();
        assert_eq!(emulator.debugger().unwrap_err(), Error::NoDebugger);
        assert_eq!(emulator.debugger_mut().unwrap_err(), Error::NoDebugger);
    }

    #[test]
    fn attaching_a_debugger_turns_on_write_tracking() {
        let mut emulator = Emulator::new();
        assert!(!emulator.memory.debug);

        emulator.attach_debugger(Debugger::new());
        assert!(emulator.memory.debug);
        assert!(emulator.debugger().is_ok());
    }

    #[test]
    fn step_executes_past_break_conditions_but_counts() {
        let mut emulator = Emulator::new();
        emulator.load_prg(&prg_image(0x8000));
        emulator.power_up();

        let mut debugger = Debugger::new();
        debugger.add_breakpoint(0x8000); // right on the current PC
        emulator.attach_debugger(debugger);

        emulator.step().unwrap();

        assert_eq!(emulator.cpu.regs.pc, 0x8001);
        let debugger = emulator.debugger().unwrap();
        assert!(debugger.is_running());
        assert_eq!(debugger.instructions_executed(), 1);
    }

    #[test]
    fn pause_listeners_fire_by_the_time_run_tick_returns() {
        let hits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&hits);

        let mut emulator = Emulator::new();
        emulator.load_prg(&prg_image(0x8000));
        emulator.power_up();

        let mut debugger = Debugger::new();
        debugger.add_breakpoint(0x8003);
        debugger.on_pause(move |e| sink.borrow_mut().push(e.pc));
        emulator.attach_debugger(debugger);

        let tick = emulator.run_tick().unwrap();

        assert!(tick.paused);
        assert_eq!(*hits.borrow(), vec![0x8003]);
    }
}
