//! # CHIP-8 Virtual Machine
//!
//! An interpreter for the CHIP-8 instruction set: sixteen 8-bit registers,
//! a 12-bit address space, a bounded call stack and two 60 Hz timers.
//!
//! The core never touches a terminal or a clock. A host loads a ROM, calls
//! [`Cpu::step`] at its chosen instruction rate, calls [`Cpu::tick_timers`]
//! at 60 Hz, renders [`Cpu::display`] and feeds key presses back in.

pub mod cpu;
pub mod rom;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, CpuState, Step, Memory, Registers, Display, Instruction};
pub use cpu::{Keypad, KeyState, RandomSource, StdRandom};
pub use rom::{Rom, RomError, load_rom};

#[cfg(feature = "tui")]
pub use tui::run_player;
