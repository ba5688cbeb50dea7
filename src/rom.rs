//! ROM image loading.
//!
//! A CHIP-8 ROM is a raw binary: no header, no checksum. The bytes are
//! copied verbatim to the program origin, so the only checks are that the
//! file is readable, not empty, and fits in the program area.

use crate::cpu::memory::PROGRAM_CAPACITY;
use std::path::Path;
use thiserror::Error;

/// A ROM image read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    /// Raw program bytes.
    pub bytes: Vec<u8>,
    /// Where it came from (for messages).
    pub name: String,
}

impl Rom {
    /// Validate an in-memory image.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self, RomError> {
        if bytes.is_empty() {
            return Err(RomError::Empty);
        }
        if bytes.len() > PROGRAM_CAPACITY {
            return Err(RomError::TooLarge {
                size: bytes.len(),
                capacity: PROGRAM_CAPACITY,
            });
        }
        Ok(Self {
            bytes,
            name: name.to_string(),
        })
    }

    /// Number of bytes in the image.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of whole instructions the image contains.
    pub fn instruction_count(&self) -> usize {
        self.bytes.len() / 2
    }
}

/// Load a ROM file from disk.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<Rom, RomError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| RomError::Io(format!("{}: {}", path.display(), e)))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Rom::from_bytes(&name, bytes)
}

/// Errors that can occur while loading a ROM.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("ROM is empty")]
    Empty,

    #[error("ROM size {size} exceeds program area capacity {capacity}")]
    TooLarge { size: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let rom = Rom::from_bytes("test", vec![0x00, 0xE0, 0x12]).unwrap();
        assert_eq!(rom.len(), 3);
        assert_eq!(rom.instruction_count(), 1);
        assert_eq!(rom.name, "test");
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Rom::from_bytes("empty", vec![]), Err(RomError::Empty));
    }

    #[test]
    fn test_capacity_boundary() {
        assert!(Rom::from_bytes("full", vec![0; PROGRAM_CAPACITY]).is_ok());
        assert_eq!(
            Rom::from_bytes("big", vec![0; PROGRAM_CAPACITY + 1]),
            Err(RomError::TooLarge { size: PROGRAM_CAPACITY + 1, capacity: PROGRAM_CAPACITY })
        );
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("chip8-rom-test-{}.ch8", std::process::id()));
        std::fs::write(&path, [0x12, 0x00]).unwrap();

        let rom = load_rom(&path).unwrap();
        assert_eq!(rom.bytes, vec![0x12, 0x00]);
        assert!(rom.name.ends_with(".ch8"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = load_rom("/definitely/not/a/rom.ch8").unwrap_err();
        assert!(matches!(err, RomError::Io(_)));
    }
}
