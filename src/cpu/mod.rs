//! CPU emulation for the CHIP-8 virtual machine.
//!
//! This module implements the complete CHIP-8 architecture:
//! - 4 KiB of byte-addressed memory with 12-bit addresses
//! - 16 general purpose registers, an index register, PC and two timers
//! - A 48-entry call stack kept in reserved memory
//! - A 64x32 monochrome framebuffer
//! - The 34-instruction base instruction set

pub mod memory;
pub mod registers;
pub mod stack;
pub mod display;
pub mod io;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::Registers;
pub use stack::{CallStack, StackError};
pub use display::Display;
pub use io::{Keypad, KeyState, NullKeypad, RandomSource, StdRandom};
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Cpu, CpuError, CpuState, MachineSnapshot, Step};
