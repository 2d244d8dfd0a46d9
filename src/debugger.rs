//! Break-condition engine. Conditions are appended, never removed, and all
//! of them are evaluated once per instruction in a fixed priority order:
//! reset-vector trap, instruction count, PC breakpoints, memory watches.
//! The first one that fires pauses execution; pause listeners are notified
//! deferred, after the scheduler's tick loop unwinds, never inline.

use log::info;

use crate::cpu::{Cpu, CpuState};
use crate::memory::{Memory, RESET_VECTOR};

/// Watch on a memory cell. The comparison fields are OR'ed: any satisfied
/// one pauses.
#[derive(Debug, Clone, Copy)]
pub struct MemoryBreakpoint {
    pub address: u16,
    pub on_write: bool,
    pub equals_to: Option<u8>,
    pub greater_than_or_equals: Option<u8>,
    pub less_than_or_equals: Option<u8>,
}

#[derive(Debug, Default)]
struct BreakConditions {
    ins_executed: Option<u64>,
    at_reset_vector: bool,
    breakpoints: Vec<u16>,
    memory: Vec<MemoryBreakpoint>,
}

/// Delivered to pause listeners with the state at the moment of the pause.
#[derive(Debug, Clone, Copy)]
pub struct PauseEvent {
    pub pc: u16,
    pub cpu_state: CpuState,
}

type PauseCallback = Box<dyn FnMut(&PauseEvent)>;

pub struct Debugger {
    conditions: BreakConditions,
    is_running: bool,
    ins_executed: u64,
    listeners: Vec<PauseCallback>,
    pending: Vec<PauseEvent>,
}

impl std::fmt::Debug for Debugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debugger")
            .field("conditions", &self.conditions)
            .field("is_running", &self.is_running)
            .field("ins_executed", &self.ins_executed)
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending)
            .finish()
    }
}

impl Debugger {
    pub fn new() -> Self {
        Debugger {
            conditions: BreakConditions::default(),
            is_running: true,
            ins_executed: 0,
            listeners: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn add_breakpoint(&mut self, address: u16) {
        info!("breakpoint added at ${:04X}", address);
        self.conditions.breakpoints.push(address);
    }

    pub fn add_memory_breakpoint(&mut self, breakpoint: MemoryBreakpoint) {
        info!("memory breakpoint added at ${:04X}", breakpoint.address);
        self.conditions.memory.push(breakpoint);
    }

    /// Pause once this many instructions have executed.
    pub fn break_after(&mut self, instructions: u64) {
        self.conditions.ins_executed = Some(instructions);
    }

    /// Pause when PC lands on the address stored at the reset vector.
    pub fn break_at_reset_vector(&mut self) {
        self.conditions.at_reset_vector = true;
    }

    pub fn on_pause(&mut self, callback: impl FnMut(&PauseEvent) + 'static) {
        self.listeners.push(Box::new(callback));
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn resume(&mut self) {
        self.is_running = true;
    }

    /// Instructions seen so far; bumped by the scheduler after each one.
    pub fn instructions_executed(&self) -> u64 {
        self.ins_executed
    }

    pub fn note_instruction(&mut self) {
        self.ins_executed += 1;
    }

    /// Called once per instruction, before it executes. No-op unless the
    /// CPU is currently running.
    pub fn validate(&mut self, cpu: &Cpu, mem: &Memory) {
        if !self.is_running {
            return;
        }

        if self.conditions.at_reset_vector && cpu.regs.pc == mem.load_word(RESET_VECTOR) {
            info!("reset vector reached at ${:04X}", cpu.regs.pc);
            self.pause(cpu);
            return;
        }

        if self.conditions.ins_executed == Some(self.ins_executed) {
            info!("instruction count reached: {}", self.ins_executed);
            self.pause(cpu);
            return;
        }

        if self.conditions.breakpoints.iter().any(|&b| b == cpu.regs.pc) {
            info!("breakpoint hit at ${:04X}", cpu.regs.pc);
            self.pause(cpu);
            return;
        }

        if let Some(write) = mem.last_write() {
            for watch in &self.conditions.memory {
                if watch.address != write.address || !watch.on_write {
                    continue;
                }
                let hit = watch.equals_to.is_some_and(|v| write.value == v)
                    || watch
                        .greater_than_or_equals
                        .is_some_and(|v| write.value >= v)
                    || watch.less_than_or_equals.is_some_and(|v| write.value <= v);
                if hit {
                    info!(
                        "memory breakpoint hit at ${:04X} (value {:#04X})",
                        write.address, write.value
                    );
                    self.pause(cpu);
                    return;
                }
            }
        }
    }

    /// Flip the running flag and queue the pause notification. The event is
    /// delivered when `drain_events` runs, after the current tick unwinds.
    pub fn pause(&mut self, cpu: &Cpu) {
        self.is_running = false;
        self.pending.push(PauseEvent {
            pc: cpu.regs.pc,
            cpu_state: cpu.state(),
        });
    }

    /// Deliver queued pause events to every listener, in order.
    pub fn drain_events(&mut self) {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            for listener in &mut self.listeners {
                listener(event);
            }
        }
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new()
    }
}
