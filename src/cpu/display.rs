//! Monochrome 64x32 framebuffer.
//!
//! Cells are stored row-major. Only clear-screen and sprite draws mutate it;
//! renderers read it through [`Framebuffer::pixel`] or [`Framebuffer::rows`].

use serde::{Serialize, Deserialize};

/// Framebuffer width in pixels.
pub const WIDTH: usize = 64;

/// Framebuffer height in pixels.
pub const HEIGHT: usize = 32;

/// 64x32 grid of on/off cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framebuffer {
    cells: Vec<bool>,
}

impl Framebuffer {
    /// Create a cleared framebuffer.
    pub fn new() -> Self {
        Self {
            cells: vec![false; WIDTH * HEIGHT],
        }
    }

    /// Turn every cell off.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Read one cell. Coordinates wrap on both axes.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.cells[Self::index(x, y)]
    }

    #[inline]
    fn index(x: usize, y: usize) -> usize {
        (y % HEIGHT) * WIDTH + (x % WIDTH)
    }

    /// XOR a sprite onto the screen with its top-left corner at (x, y).
    ///
    /// Each row is 8 pixels wide, most significant bit leftmost. Columns
    /// wrap modulo 64 and rows wrap modulo 32, independently. Returns true
    /// if any lit cell was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut collision = false;

        for (dy, row) in rows.iter().enumerate() {
            for dx in 0..8 {
                if row & (0x80 >> dx) == 0 {
                    continue;
                }
                let idx = Self::index(x + dx, y + dy);
                if self.cells[idx] {
                    collision = true;
                }
                self.cells[idx] ^= true;
            }
        }

        collision
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(WIDTH)
    }

    /// All cells, row-major.
    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// Number of lit cells.
    pub fn lit(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|on| if *on { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("lit", &self.lit())
            .field("size", &(WIDTH, HEIGHT))
            .finish()
    }
}
