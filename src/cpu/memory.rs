//! CHIP-8 memory subsystem.
//!
//! 4 KiB of byte-addressed RAM. The built-in hex font lives at the bottom
//! of memory and programs are loaded at 0x200.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of addressable bytes.
pub const MEMORY_SIZE: usize = 4096;

/// Every address is reduced to 12 bits before it touches memory.
pub const ADDR_MASK: u16 = 0x0FFF;

/// Where program images are installed, and where execution starts.
pub const PROGRAM_START: u16 = 0x200;

/// Where the font table is installed.
pub const FONT_ADDR: u16 = 0x000;

/// Bytes per font glyph.
pub const FONT_GLYPH_SIZE: u16 = 5;

/// Hex digit sprites 0-F, five rows each.
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// CHIP-8 memory: 4096 bytes with the font preinstalled.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Create zeroed memory with the font table installed.
    pub fn new() -> Self {
        let mut mem = Self {
            bytes: vec![0; MEMORY_SIZE],
        };
        mem.install_font();
        mem
    }

    fn install_font(&mut self) {
        let start = FONT_ADDR as usize;
        self.bytes[start..start + FONT.len()].copy_from_slice(&FONT);
    }

    /// Read a byte. The address is masked to 12 bits.
    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[(addr & ADDR_MASK) as usize]
    }

    /// Write a byte. The address is masked to 12 bits.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        self.bytes[(addr & ADDR_MASK) as usize] = value;
    }

    /// Fetch a big-endian instruction word starting at `addr`.
    pub fn read_word(&self, addr: u16) -> u16 {
        let hi = self.read(addr) as u16;
        let lo = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Copy `len` bytes starting at `addr`, wrapping at the top of memory.
    pub fn read_range(&self, addr: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|offset| self.read(addr.wrapping_add(offset as u16)))
            .collect()
    }

    /// Install a program image at [`PROGRAM_START`].
    ///
    /// Oversized images are rejected without touching memory.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        let start = PROGRAM_START as usize;
        let available = MEMORY_SIZE - start;
        if program.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }

        self.bytes[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Zero everything and reinstall the font.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.install_font();
    }

    /// Raw view of all 4096 bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count the program area; the font is always there
        let used = self.bytes[PROGRAM_START as usize..]
            .iter()
            .filter(|b| **b != 0)
            .count();

        f.debug_struct("Memory")
            .field("non_zero_program_bytes", &used)
            .field("total_bytes", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Program image does not fit between 0x200 and the top of memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
