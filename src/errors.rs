use thiserror::Error;

/// Failures the core can surface. All of them are local and synchronous;
/// there is nothing transient to retry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Opcode not present in the instruction table. Continuing would
    /// desynchronize emulated state, so this is fatal to the fetch/execute
    /// step rather than being treated as a NOP.
    #[error("unknown opcode {opcode:#04X} at {pc:#06X}")]
    UnknownOpcode { opcode: u8, pc: u16 },

    /// Disassembly was queried before `parse()` ran.
    #[error("disassembly not available: parse() has not been called")]
    NotParsed,

    /// A disassembly lookup referenced an address or line outside the
    /// parsed image.
    #[error("address or line number outside the disassembled range")]
    OutOfRange,

    /// A debugger operation was requested but no debugger is attached.
    #[error("no debugger attached")]
    NoDebugger,
}
