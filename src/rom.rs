//! Thin iNES container probe. The core only consumes a flat PRG buffer;
//! real mapper logic lives elsewhere. A malformed signature yields a `None`
//! header rather than an error, and asking an invalid ROM for PRG bytes
//! yields an empty buffer, so downstream code checks instead of unwinding.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use log::info;

const MAGIC: &[u8; 4] = b"NES\x1a";
const HEADER_SIZE: usize = 16;
const PRG_BANK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomHeader {
    pub prg_banks: u8,
    pub chr_banks: u8,
    pub mapper_code: u8,
}

impl RomHeader {
    /// `None` when the magic bytes do not match or the buffer is shorter
    /// than a header.
    pub fn parse(data: &[u8]) -> Option<RomHeader> {
        if data.len() < HEADER_SIZE || &data[0..4] != MAGIC {
            return None;
        }
        let flags6 = data[6];
        let flags7 = data[7];
        Some(RomHeader {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper_code: (flags7 & 0xF0) | (flags6 >> 4),
        })
    }
}

pub struct Rom {
    data: Vec<u8>,
    header: Option<RomHeader>,
}

impl Rom {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let header = RomHeader::parse(&data);
        if let Some(h) = header {
            info!(
                "ROM loaded: mapper {}, {} PRG bank(s), {} CHR bank(s)",
                h.mapper_code, h.prg_banks, h.chr_banks
            );
        }
        Rom { data, header }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Self::from_bytes(data))
    }

    pub fn header(&self) -> Option<RomHeader> {
        self.header
    }

    /// Raw PRG bytes as stored in the container; empty for an invalid ROM.
    pub fn prg_bytes(&self) -> &[u8] {
        let Some(header) = self.header else {
            return &[];
        };
        let len = header.prg_banks as usize * PRG_BANK_SIZE;
        let end = (HEADER_SIZE + len).min(self.data.len());
        &self.data[HEADER_SIZE..end]
    }

    /// PRG laid out as the CPU sees it from 0x8000: a single 16 KiB bank is
    /// repeated into the upper half so the vectors land at 0xFFFA-0xFFFF.
    pub fn prg_image(&self) -> Vec<u8> {
        let prg = self.prg_bytes();
        if prg.len() == PRG_BANK_SIZE {
            let mut image = prg.to_vec();
            image.extend_from_slice(prg);
            image
        } else {
            prg.to_vec()
        }
    }
}
