//! Static disassembler. Decodes a PRG image with the same opcode metadata
//! the instruction engine executes from, so decode width can never drift
//! from execution width. Lines are indexed both by address and by line
//! number; callers can page through the listing from an address, a line, or
//! wherever the previous read stopped.

use std::collections::HashMap;

use crate::cpu::instructions::OPCODES;
use crate::errors::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub asm: String,
    pub address: u16,
    pub bytes: Vec<u8>,
    pub line_number: usize,
    pub opcode: u8,
    pub supported: bool,
    pub operand: Option<u16>,
}

/// Decoded program index: every line, addressable by start address or by
/// sequential line number. Rebuilt from scratch on every parse.
#[derive(Debug, Default)]
pub struct Code {
    lines: Vec<Line>,
    by_address: HashMap<u16, usize>,
}

impl Code {
    fn clear(&mut self) {
        self.lines.clear();
        self.by_address.clear();
    }

    fn push(&mut self, line: Line) {
        self.by_address.insert(line.address, self.lines.len());
        self.lines.push(line);
    }

    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn line_at_address(&self, address: u16) -> Option<&Line> {
        self.by_address.get(&address).map(|&i| &self.lines[i])
    }

    pub fn line(&self, line_number: usize) -> Option<&Line> {
        self.lines.get(line_number)
    }
}

/// Where a `read` starts. With neither field set it continues from the last
/// line the previous read returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadRange {
    pub from_address: Option<u16>,
    pub from_line_number: Option<usize>,
    pub num_of_lines: usize,
}

pub struct Disassembler {
    code: Code,
    parsed: bool,
    cursor: usize,
}

impl Disassembler {
    pub fn new() -> Self {
        Disassembler {
            code: Code::default(),
            parsed: false,
            cursor: 0,
        }
    }

    /// Walk the whole buffer from `base`, one instruction at a time.
    /// Unknown opcodes become a one-byte `"??"` line; the walk still makes
    /// progress. A truncated operand at the end of the buffer is treated
    /// the same way.
    pub fn parse(&mut self, prg: &[u8], base: u16) {
        self.code.clear();
        self.parsed = true;
        self.cursor = 0;

        let mut offset = 0usize;
        let mut line_number = 0usize;
        while offset < prg.len() {
            let address = base.wrapping_add(offset as u16);
            let opcode = prg[offset];
            let decoded = OPCODES[opcode as usize]
                .filter(|inst| offset + inst.mode.instruction_size() as usize <= prg.len());

            let line = match decoded {
                Some(inst) => {
                    let size = inst.mode.instruction_size() as usize;
                    let operand = match size {
                        1 => None,
                        2 => Some(prg[offset + 1] as u16),
                        _ => Some((prg[offset + 2] as u16) << 8 | prg[offset + 1] as u16),
                    };
                    let rendered = inst
                        .mode
                        .format_operand(operand.unwrap_or(0), address);
                    let asm = if rendered.is_empty() {
                        inst.name.to_string()
                    } else {
                        format!("{} {}", inst.name, rendered)
                    };
                    offset += size;
                    Line {
                        asm,
                        address,
                        bytes: prg[offset - size..offset].to_vec(),
                        line_number,
                        opcode,
                        supported: true,
                        operand,
                    }
                }
                None => {
                    offset += 1;
                    Line {
                        asm: "??".to_string(),
                        address,
                        bytes: vec![opcode],
                        line_number,
                        opcode,
                        supported: false,
                        operand: None,
                    }
                }
            };
            self.code.push(line);
            line_number += 1;
        }
    }

    pub fn code(&self) -> Result<&Code, Error> {
        if !self.parsed {
            return Err(Error::NotParsed);
        }
        Ok(&self.code)
    }

    /// Ordered slice of decoded lines. Clamps at the end of the listing;
    /// asking past it (or for an address nothing starts at) is an error.
    pub fn read(&mut self, range: ReadRange) -> Result<Vec<Line>, Error> {
        if !self.parsed {
            return Err(Error::NotParsed);
        }

        let start = if let Some(address) = range.from_address {
            self.code
                .line_at_address(address)
                .map(|l| l.line_number)
                .ok_or(Error::OutOfRange)?
        } else if let Some(line_number) = range.from_line_number {
            line_number
        } else {
            self.cursor
        };

        if start > self.code.num_lines() {
            return Err(Error::OutOfRange);
        }

        let end = (start + range.num_of_lines).min(self.code.num_lines());
        self.cursor = end;
        Ok(self.code.lines[start..end].to_vec())
    }
}

impl Default for Disassembler {
    fn default() -> Self {
        Self::new()
    }
}
