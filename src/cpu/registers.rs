//! CHIP-8 register file.
//!
//! - V0..VF: 8-bit general purpose registers (VF doubles as the flag register)
//! - I: index register, 12 significant bits
//! - PC: address of the next instruction
//! - DT/ST: delay and sound timers, counting down toward zero

use crate::cpu::memory::{ADDR_MASK, PROGRAM_START};
use serde::{Serialize, Deserialize};

/// Number of general purpose registers.
pub const NUM_REGISTERS: usize = 16;

/// Index of the flag register VF.
pub const FLAG: usize = 0xF;

/// Width of one instruction in bytes.
pub const INSTRUCTION_WIDTH: u16 = 2;

/// The CHIP-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// V0..VF
    v: [u8; NUM_REGISTERS],

    /// I: memory pointer used by draw and block transfer instructions
    i: u16,

    /// PC: address of the next instruction to fetch
    pub pc: u16,

    /// DT: delay timer
    pub delay: u8,

    /// ST: sound timer, a tone plays while non-zero
    pub sound: u8,
}

impl Registers {
    /// Create a register file with everything zeroed and PC at the program origin.
    pub fn new() -> Self {
        Self {
            v: [0; NUM_REGISTERS],
            i: 0,
            pc: PROGRAM_START,
            delay: 0,
            sound: 0,
        }
    }

    /// Reset all registers.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read V[index].
    ///
    /// # Panics
    /// Panics if index is not in 0..16.
    #[inline]
    pub fn reg(&self, index: usize) -> u8 {
        assert!(index < NUM_REGISTERS, "Register V{} out of range (0-F)", index);
        self.v[index]
    }

    /// Write V[index].
    ///
    /// # Panics
    /// Panics if index is not in 0..16.
    #[inline]
    pub fn set_reg(&mut self, index: usize, value: u8) {
        assert!(index < NUM_REGISTERS, "Register V{} out of range (0-F)", index);
        self.v[index] = value;
    }

    /// Write VF.
    #[inline]
    pub fn set_flag(&mut self, set: bool) {
        self.v[FLAG] = set as u8;
    }

    /// All general purpose registers.
    pub fn all(&self) -> &[u8; NUM_REGISTERS] {
        &self.v
    }

    /// Read I.
    #[inline]
    pub fn i(&self) -> u16 {
        self.i
    }

    /// Write I, keeping the low 12 bits.
    #[inline]
    pub fn set_i(&mut self, value: u16) {
        self.i = value & ADDR_MASK;
    }

    /// Move PC past one instruction. Returns the old value.
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(INSTRUCTION_WIDTH);
        old
    }

    /// Skip the next instruction.
    pub fn skip(&mut self) {
        self.advance_pc();
    }

    /// Set PC to an absolute address.
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr & ADDR_MASK;
    }

    /// Count both timers down by one, stopping at zero.
    pub fn tick_timers(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_read_write() {
        let mut regs = Registers::new();
        regs.set_reg(3, 0x42);
        assert_eq!(regs.reg(3), 0x42);
        assert_eq!(regs.all()[3], 0x42);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_reg_out_of_range() {
        let regs = Registers::new();
        regs.reg(16);
    }

    #[test]
    fn test_index_masked() {
        let mut regs = Registers::new();
        regs.set_i(0xFFFF);
        assert_eq!(regs.i(), 0x0FFF);
        regs.set_i(0x1234);
        assert_eq!(regs.i(), 0x0234);
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        assert_eq!(regs.pc, 0x200);

        let old = regs.advance_pc();
        assert_eq!(old, 0x200);
        assert_eq!(regs.pc, 0x202);

        regs.skip();
        assert_eq!(regs.pc, 0x204);
    }

    #[test]
    fn test_timers_stop_at_zero() {
        let mut regs = Registers::new();
        regs.delay = 2;
        regs.sound = 1;

        regs.tick_timers();
        assert_eq!((regs.delay, regs.sound), (1, 0));

        regs.tick_timers();
        regs.tick_timers();
        assert_eq!((regs.delay, regs.sound), (0, 0));
    }

    #[test]
    fn test_flag() {
        let mut regs = Registers::new();
        regs.set_flag(true);
        assert_eq!(regs.reg(FLAG), 1);
        regs.set_flag(false);
        assert_eq!(regs.reg(FLAG), 0);
    }
}
