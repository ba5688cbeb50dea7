//! Monochrome 64x32 framebuffer.
//!
//! Only the clear and draw instructions mutate it; renderers get a
//! read-only view.

use serde::{Serialize, Deserialize};

/// Framebuffer width in pixels.
pub const WIDTH: usize = 64;

/// Framebuffer height in pixels.
pub const HEIGHT: usize = 32;

/// The CHIP-8 framebuffer, stored row-major.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pixels: Vec<bool>,
}

impl Display {
    /// Create a blank framebuffer.
    pub fn new() -> Self {
        Self {
            pixels: vec![false; WIDTH * HEIGHT],
        }
    }

    /// Unset every pixel.
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Whether the pixel at (x, y) is set. Coordinates wrap.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % HEIGHT) * WIDTH + (x % WIDTH)]
    }

    /// XOR an 8-pixel-wide sprite onto the screen at (x, y).
    ///
    /// Each byte of `sprite` is one row, most significant bit leftmost.
    /// Pixels past the right or bottom edge wrap around.
    /// Returns true if any set pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x0 = x as usize % WIDTH;
        let y0 = y as usize % HEIGHT;
        let mut collision = false;

        for (row, bits) in sprite.iter().enumerate() {
            let py = (y0 + row) % HEIGHT;
            for col in 0..8 {
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let px = (x0 + col) % WIDTH;
                let cell = &mut self.pixels[py * WIDTH + px];
                collision |= *cell;
                *cell = !*cell;
            }
        }

        collision
    }

    /// Row-major snapshot of the screen.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.pixels.chunks(WIDTH)
    }

    /// Flat row-major pixel slice.
    pub fn as_slice(&self) -> &[bool] {
        &self.pixels
    }

    /// Number of set pixels.
    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }

    /// Render rows as text, `#` for set pixels and `.` for unset.
    pub fn to_strings(&self) -> Vec<String> {
        self.rows()
            .map(|row| row.iter().map(|&p| if p { '#' } else { '.' }).collect())
            .collect()
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("lit", &self.lit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank() {
        let display = Display::new();
        assert_eq!(display.lit(), 0);
        assert_eq!(display.rows().count(), HEIGHT);
        assert!(display.rows().all(|r| r.len() == WIDTH));
    }

    #[test]
    fn test_draw_and_collision() {
        let mut display = Display::new();

        assert!(!display.draw_sprite(0, 0, &[0b1100_0000]));
        assert!(display.pixel(0, 0));
        assert!(display.pixel(1, 0));
        assert!(!display.pixel(2, 0));

        // Drawing the same sprite again erases it and reports a collision
        assert!(display.draw_sprite(0, 0, &[0b1100_0000]));
        assert_eq!(display.lit(), 0);
    }

    #[test]
    fn test_no_collision_on_disjoint_pixels() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0b1000_0000]);
        assert!(!display.draw_sprite(0, 0, &[0b0100_0000]));
        assert_eq!(display.lit(), 2);
    }

    #[test]
    fn test_wraps_around_edges() {
        let mut display = Display::new();
        display.draw_sprite(62, 31, &[0xF0, 0x80]);

        assert!(display.pixel(62, 31));
        assert!(display.pixel(63, 31));
        assert!(display.pixel(0, 31));
        assert!(display.pixel(1, 31));
        assert!(display.pixel(62, 0));
        assert_eq!(display.lit(), 5);
    }

    #[test]
    fn test_start_coordinates_wrap() {
        let mut display = Display::new();
        display.draw_sprite(64 + 3, 32 + 2, &[0x80]);
        assert!(display.pixel(3, 2));
    }

    #[test]
    fn test_clear() {
        let mut display = Display::new();
        display.draw_sprite(10, 10, &[0xFF; 4]);
        display.clear();
        assert_eq!(display.lit(), 0);
    }

    #[test]
    fn test_to_strings() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0xA0]);
        let text = display.to_strings();
        assert!(text[0].starts_with("#.#."));
        assert_eq!(text[1], ".".repeat(WIDTH));
    }
}
