//! CHIP-8 address space.
//!
//! 4096 bytes addressed with 12 bits, split into three regions:
//! - 0x000-0x1FF: interpreter area (the hex font lives in the first 80 bytes)
//! - 0x200-0xE9F: program and work RAM
//! - 0xEA0-0xEFF: call stack

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Total addressable memory in bytes.
pub const MEMORY_SIZE: usize = 4096;

/// Every address is masked with this before it touches storage.
pub const ADDR_MASK: u16 = 0x0FFF;

/// Address where ROMs are loaded and execution starts.
pub const PROGRAM_START: u16 = 0x200;

/// Highest address usable by a program.
pub const PROGRAM_END: u16 = 0xE9F;

/// Number of bytes a ROM may occupy.
pub const PROGRAM_CAPACITY: usize = (PROGRAM_END - PROGRAM_START) as usize;

/// First byte of the reserved call-stack region.
pub const STACK_START: u16 = 0xEA0;

/// Last byte of the reserved call-stack region.
pub const STACK_END: u16 = 0xEFF;

/// Address of the glyph for digit 0.
pub const FONT_START: u16 = 0x000;

/// Bytes per font glyph.
pub const GLYPH_SIZE: u16 = 5;

/// 4x5 sprites for the hexadecimal digits 0-F.
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

/// The machine's byte store.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Create zeroed memory with the font installed.
    pub fn new() -> Self {
        let mut mem = Self {
            bytes: vec![0; MEMORY_SIZE],
        };
        mem.install_font();
        mem
    }

    /// Read a byte. The address wraps at 12 bits.
    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[(addr & ADDR_MASK) as usize]
    }

    /// Write a byte. The address wraps at 12 bits.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        self.bytes[(addr & ADDR_MASK) as usize] = value;
    }

    /// Read two consecutive bytes as a big-endian word.
    pub fn read_word(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    /// Write a word as two consecutive big-endian bytes.
    pub fn write_word(&mut self, addr: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.write(addr, hi);
        self.write(addr.wrapping_add(1), lo);
    }

    /// Copy `block` into the program area starting at `origin`.
    ///
    /// Nothing is written if `origin` lies outside the program area or the
    /// block does not fit below `PROGRAM_END`.
    pub fn load_block(&mut self, origin: u16, block: &[u8]) -> Result<(), MemoryError> {
        let origin = origin & ADDR_MASK;
        if !(PROGRAM_START..PROGRAM_END).contains(&origin) {
            return Err(MemoryError::OriginOutsideProgram(origin));
        }
        let capacity = (PROGRAM_END as usize).saturating_sub(origin as usize);
        if block.len() > capacity {
            return Err(MemoryError::RomTooLarge {
                size: block.len(),
                capacity,
            });
        }

        let start = origin as usize;
        self.bytes[start..start + block.len()].copy_from_slice(block);
        Ok(())
    }

    /// Zero everything and reinstall the font.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.install_font();
    }

    /// Dump a range of memory (for inspection from a host).
    pub fn dump(&self, start: u16, count: usize) -> Vec<(u16, u8)> {
        let start = (start & ADDR_MASK) as usize;
        let end = (start + count).min(MEMORY_SIZE);
        (start..end)
            .map(|a| (a as u16, self.bytes[a]))
            .collect()
    }

    /// Whether `addr` falls in the interpreter/font area.
    pub fn is_reserved(addr: u16) -> bool {
        (addr & ADDR_MASK) < PROGRAM_START
    }

    fn install_font(&mut self) {
        let start = FONT_START as usize;
        self.bytes[start..start + FONT.len()].copy_from_slice(&FONT);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let program_bytes = self.bytes[PROGRAM_START as usize..=PROGRAM_END as usize]
            .iter()
            .filter(|b| **b != 0)
            .count();

        f.debug_struct("Memory")
            .field("non_zero_program_bytes", &program_bytes)
            .field("total_bytes", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("ROM size {size} exceeds program area capacity {capacity}")]
    RomTooLarge { size: usize, capacity: usize },

    #[error("load origin {0:#05X} outside program area")]
    OriginOutsideProgram(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut mem = Memory::new();
        mem.write(0x300, 0xAB);
        assert_eq!(mem.read(0x300), 0xAB);
    }

    #[test]
    fn test_addresses_wrap_at_12_bits() {
        let mut mem = Memory::new();
        mem.write(0x1300, 0x42);
        assert_eq!(mem.read(0x300), 0x42);
        assert_eq!(mem.read(0xF300), 0x42);
    }

    #[test]
    fn test_font_installed() {
        let mem = Memory::new();
        assert_eq!(mem.read(0x000), 0xF0);
        assert_eq!(mem.read(0x005), 0x20);
        assert_eq!(mem.read(0x04F), 0x80);
        assert_eq!(mem.read(0x050), 0x00);
    }

    #[test]
    fn test_read_word_is_big_endian() {
        let mut mem = Memory::new();
        mem.write(0x200, 0x12);
        mem.write(0x201, 0x34);
        assert_eq!(mem.read_word(0x200), 0x1234);

        mem.write_word(0x300, 0xBEEF);
        assert_eq!(mem.read(0x300), 0xBE);
        assert_eq!(mem.read(0x301), 0xEF);
    }

    #[test]
    fn test_load_block() {
        let mut mem = Memory::new();
        mem.load_block(PROGRAM_START, &[1, 2, 3]).unwrap();

        assert_eq!(mem.read(0x200), 1);
        assert_eq!(mem.read(0x201), 2);
        assert_eq!(mem.read(0x202), 3);
    }

    #[test]
    fn test_load_block_capacity() {
        let mut mem = Memory::new();
        let exact = vec![0xAA; PROGRAM_CAPACITY];
        assert!(mem.load_block(PROGRAM_START, &exact).is_ok());

        let mut fresh = Memory::new();
        let too_big = vec![0xAA; PROGRAM_CAPACITY + 1];
        let err = fresh.load_block(PROGRAM_START, &too_big).unwrap_err();
        assert_eq!(
            err,
            MemoryError::RomTooLarge { size: PROGRAM_CAPACITY + 1, capacity: PROGRAM_CAPACITY }
        );
        assert_eq!(fresh.read(PROGRAM_START), 0);
    }

    #[test]
    fn test_clear_keeps_font() {
        let mut mem = Memory::new();
        mem.write(0x000, 0x00);
        mem.write(0x400, 0x99);
        mem.clear();
        assert_eq!(mem.read(0x000), 0xF0);
        assert_eq!(mem.read(0x400), 0x00);
    }

    #[test]
    fn test_load_block_rejects_reserved_origin() {
        let mut mem = Memory::new();

        assert_eq!(mem.load_block(0x000, &[0u8; 80]), Err(MemoryError::OriginOutsideProgram(0x000)));
        assert_eq!(mem.load_block(0x1FF, &[0u8; 2]), Err(MemoryError::OriginOutsideProgram(0x1FF)));
        assert_eq!(mem.load_block(STACK_START, &[0u8; 2]), Err(MemoryError::OriginOutsideProgram(STACK_START)));
        assert_eq!(mem.dump(FONT_START, FONT.len()).iter().map(|&(_, b)| b).collect::<Vec<_>>(), FONT.to_vec());
        assert_eq!(mem.read(STACK_START), 0);
    }
}
