//! Call stack kept in the reserved 0xEA0-0xEFF memory region.
//!
//! Return addresses are stored as big-endian words, so the 96-byte region
//! holds 48 entries.

use crate::cpu::memory::{Memory, STACK_END, STACK_START};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Maximum number of nested calls.
pub const STACK_CAPACITY: usize = ((STACK_END - STACK_START + 1) / 2) as usize;

/// Stack pointer into the memory-backed stack region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStack {
    depth: usize,
}

impl CallStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Number of addresses currently on the stack.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.depth = 0;
    }

    /// Push a return address.
    pub fn push(&mut self, mem: &mut Memory, addr: u16) -> Result<(), StackError> {
        if self.depth == STACK_CAPACITY {
            return Err(StackError::Overflow);
        }
        mem.write_word(Self::slot(self.depth), addr);
        self.depth += 1;
        Ok(())
    }

    /// Pop the most recent return address.
    pub fn pop(&mut self, mem: &Memory) -> Result<u16, StackError> {
        if self.depth == 0 {
            return Err(StackError::Underflow);
        }
        self.depth -= 1;
        Ok(mem.read_word(Self::slot(self.depth)))
    }

    /// Return addresses from the bottom of the stack up.
    pub fn frames(&self, mem: &Memory) -> Vec<u16> {
        (0..self.depth).map(|d| mem.read_word(Self::slot(d))).collect()
    }

    fn slot(depth: usize) -> u16 {
        STACK_START + (depth as u16) * 2
    }
}

/// Errors from stack operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("call stack overflow (capacity {})", STACK_CAPACITY)]
    Overflow,

    #[error("return with empty call stack")]
    Underflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        assert_eq!(STACK_CAPACITY, 48);
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut mem = Memory::new();
        let mut stack = CallStack::new();

        stack.push(&mut mem, 0x202).unwrap();
        stack.push(&mut mem, 0x404).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.frames(&mem), vec![0x202, 0x404]);

        assert_eq!(stack.pop(&mem).unwrap(), 0x404);
        assert_eq!(stack.pop(&mem).unwrap(), 0x202);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_entries_live_in_stack_region() {
        let mut mem = Memory::new();
        let mut stack = CallStack::new();

        stack.push(&mut mem, 0x0ABC).unwrap();
        assert_eq!(mem.read(STACK_START), 0x0A);
        assert_eq!(mem.read(STACK_START + 1), 0xBC);
    }

    #[test]
    fn test_overflow() {
        let mut mem = Memory::new();
        let mut stack = CallStack::new();

        for n in 0..STACK_CAPACITY {
            stack.push(&mut mem, n as u16).unwrap();
        }
        assert_eq!(stack.push(&mut mem, 0x200), Err(StackError::Overflow));
        assert_eq!(stack.depth(), STACK_CAPACITY);

        // The last slot must not spill past the region
        assert_eq!(mem.read_word(STACK_END - 1), (STACK_CAPACITY - 1) as u16);
        assert_eq!(mem.read(STACK_END + 1), 0);
    }

    #[test]
    fn test_underflow() {
        let mem = Memory::new();
        let mut stack = CallStack::new();
        assert_eq!(stack.pop(&mem), Err(StackError::Underflow));
    }
}
