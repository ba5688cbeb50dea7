//! Collaborator seams: keyboard state and the random byte source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of keys on the hex keypad.
pub const NUM_KEYS: u8 = 16;

/// Keyboard state as seen by the skip-if-key instructions.
pub trait Keypad {
    /// Whether hex key `key` (0-F) is currently held down.
    fn is_key_down(&self, key: u8) -> bool;
}

/// A keypad with nothing pressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullKeypad;

impl Keypad for NullKeypad {
    fn is_key_down(&self, _key: u8) -> bool {
        false
    }
}

/// A keypad whose state is set directly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyState {
    down: u16,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as held or released. Keys outside 0-F are ignored.
    pub fn set(&mut self, key: u8, down: bool) {
        if key >= NUM_KEYS {
            return;
        }
        if down {
            self.down |= 1 << key;
        } else {
            self.down &= !(1 << key);
        }
    }

    pub fn release_all(&mut self) {
        self.down = 0;
    }
}

impl Keypad for KeyState {
    fn is_key_down(&self, key: u8) -> bool {
        key < NUM_KEYS && self.down & (1 << key) != 0
    }
}

/// Source of bytes for the random instruction.
pub trait RandomSource {
    fn next_byte(&mut self) -> u8;
}

/// Random bytes from a seedable `rand` generator.
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Seed from operating system entropy.
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for StdRandom {
    fn next_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}

/// Always returns the same byte.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub u8);

impl RandomSource for FixedRandom {
    fn next_byte(&mut self) -> u8 {
        self.0
    }
}

/// Returns 0, 1, 2, ... wrapping at 256.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingRandom {
    next: u8,
}

impl RandomSource for CountingRandom {
    fn next_byte(&mut self) -> u8 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }
}
