//! Terminal front-end for the CHIP-8 machine.
//!
//! Provides the host side of the machine:
//! - A run loop stepping the CPU and ticking timers at 60 Hz
//! - A renderer for the 64x32 framebuffer using half-block characters
//! - A keypad collaborator mapped onto the left of a QWERTY keyboard

mod app;
mod ui;

pub use app::{PlayerApp, map_key, run_player};
pub use ui::screen_lines;
