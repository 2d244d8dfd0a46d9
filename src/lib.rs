//! Instruction- and cycle-level 6502 core for a NES ROM debugger:
//! register/flag model, mirrored memory, the documented opcode set with
//! per-instruction cycle accounting, a cooperative scheduler a host can
//! tick, break conditions, and an offline disassembler.

pub mod cpu;
pub mod debug_flags;
pub mod debugger;
pub mod disasm;
pub mod emulator;
pub mod errors;
pub mod memory;
pub mod rom;
pub mod scheduler;

pub use cpu::{Cpu, CpuState, StatusFlags};
pub use debugger::{Debugger, MemoryBreakpoint, PauseEvent};
pub use disasm::{Disassembler, Line, ReadRange};
pub use emulator::Emulator;
pub use errors::Error;
pub use memory::Memory;
pub use rom::{Rom, RomHeader};
pub use scheduler::Tick;
