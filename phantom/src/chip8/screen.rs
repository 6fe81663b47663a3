use serde::{Deserialize, Serialize};
use serde_with::serde_as;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// The 64x32 monochrome display. Every pixel is one byte, either `0` or `1`, stored row major.
#[serde_as]
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    #[serde_as(as = "serde_with::Bytes")]
    pixels: [u8; SCREEN_WIDTH * SCREEN_HEIGHT],
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            pixels: [0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }
}

impl Screen {
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Coordinates wrap around both axes.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[Self::index(x, y)] != 0
    }

    /// XORs a sprite onto the screen with its top left corner at `(x, y)`. Each byte of the
    /// sprite is one row, most significant bit leftmost. Pixels that fall off an edge wrap around
    /// to the other side. Returns if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, byte) in sprite.iter().enumerate() {
            for col in 0..8 {
                if byte & (0x80 >> col) == 0 {
                    continue;
                }
                let pixel = &mut self.pixels[Self::index(x + col, y + row)];
                collision |= *pixel == 1;
                *pixel ^= 1;
            }
        }
        collision
    }

    const fn index(x: usize, y: usize) -> usize {
        (y % SCREEN_HEIGHT) * SCREEN_WIDTH + (x % SCREEN_WIDTH)
    }
}
