//! WebAssembly bindings for the CHIP-8 machine.
//!
//! The JavaScript host owns the run loop: it calls `run_frame` from
//! `requestAnimationFrame`, draws `framebuffer()` onto a canvas and forwards
//! key events with `key_down`/`key_up`.

use wasm_bindgen::prelude::*;
use crate::cpu::execute::TIMER_HZ;
use crate::cpu::io::{KeyState, StdRandom};
use crate::cpu::display::{HEIGHT, WIDTH};
use crate::{Cpu, CpuState, Step};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    cpu: Cpu,
    rom: Vec<u8>,
    keys: KeyState,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a new machine seeded from `Math.random`.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
        let mut cpu = Cpu::new();
        cpu.set_random(Box::new(StdRandom::seeded(seed)));
        Self {
            cpu,
            rom: Vec::new(),
            keys: KeyState::new(),
        }
    }

    /// Load a ROM image. Returns its size in bytes.
    #[wasm_bindgen]
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<usize, JsError> {
        self.cpu.load_rom(bytes)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.rom = bytes.to_vec();
        Ok(bytes.len())
    }

    /// Execute one instruction. Returns false while waiting for a key.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<bool, JsError> {
        self.cpu.set_keypad(Box::new(self.keys));
        match self.cpu.step() {
            Ok(Step::Executed(_)) => Ok(true),
            Ok(Step::AwaitingKey { .. }) => Ok(false),
            Err(e) => Err(JsError::new(&format!("{}", e))),
        }
    }

    /// Run one 1/60 s frame at `hz` instructions per second, then tick the
    /// timers. Returns the number of instructions executed.
    #[wasm_bindgen]
    pub fn run_frame(&mut self, hz: u32) -> Result<u32, JsError> {
        self.cpu.set_keypad(Box::new(self.keys));
        let per_frame = (hz / TIMER_HZ).max(1) as u64;
        let executed = self.cpu.run_limited(per_frame)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.cpu.tick_timers();
        Ok(executed as u32)
    }

    /// Decrement both timers.
    #[wasm_bindgen]
    pub fn tick_timers(&mut self) {
        self.cpu.tick_timers();
    }

    /// Mark a hex key as held. Also resumes a pending key wait.
    #[wasm_bindgen]
    pub fn key_down(&mut self, key: u8) {
        self.keys.set(key, true);
        self.cpu.press_key(key);
    }

    /// Mark a hex key as released.
    #[wasm_bindgen]
    pub fn key_up(&mut self, key: u8) {
        self.keys.set(key, false);
    }

    /// Reset and reload the current ROM.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.keys.release_all();
        if self.rom.is_empty() {
            self.cpu.reset();
            return Ok(());
        }
        self.cpu.load_rom(&self.rom)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Framebuffer as WIDTH*HEIGHT bytes, 1 for lit pixels.
    #[wasm_bindgen]
    pub fn framebuffer(&self) -> Vec<u8> {
        self.cpu.display.as_slice().iter().map(|&p| p as u8).collect()
    }

    #[wasm_bindgen]
    pub fn width(&self) -> usize {
        WIDTH
    }

    #[wasm_bindgen]
    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// Whether the beeper should sound.
    #[wasm_bindgen]
    pub fn sound_active(&self) -> bool {
        self.cpu.sound_active()
    }

    /// Check if the machine is waiting for a key.
    #[wasm_bindgen]
    pub fn is_waiting(&self) -> bool {
        matches!(self.cpu.state(), CpuState::AwaitingKey(_))
    }

    /// Check if the machine is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.cpu.regs.pc
    }

    /// Machine state as a JSON string.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.snapshot())
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}
