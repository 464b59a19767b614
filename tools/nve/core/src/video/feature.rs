use crate::palette::{ScreenWidth, MEMORY_WIDTH, SCREEN_HEIGHT};
use crate::raster::{PixelGrid, TRANSPARENT};
use crate::video::sprite::SaveTable;

/// Inclusive clipping rectangle in API coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClipRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl ClipRect {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn screen(width: ScreenWidth) -> Self {
        Self::new(0, 0, width.max_x(), SCREEN_HEIGHT as i32 - 1)
    }

    pub fn memory() -> Self {
        Self::new(0, 0, MEMORY_WIDTH as i32 - 1, SCREEN_HEIGHT as i32 - 1)
    }

    #[inline(always)]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// How grid cells turn into colours.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ink {
    /// Cells are logical colours; -1 is transparent.
    Explicit,
    /// Cells equal to 1 paint this colour; everything else is transparent.
    Mono(u8),
}

/// A pixel grid placed with its bottom-left corner at (x, y).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub grid: PixelGrid,
    pub x: i32,
    pub y: i32,
    pub ink: Ink,
    pub xor: bool,
}

impl Layer {
    pub fn new(grid: PixelGrid, x: i32, y: i32, ink: Ink, xor: bool) -> Self {
        Self { grid, x, y, ink, xor }
    }

    /// Source colour of a cell, or `None` where the layer is transparent.
    #[inline(always)]
    pub fn source(&self, col: usize, row: usize) -> Option<u8> {
        let cell = self.grid.get(col, row);
        match self.ink {
            Ink::Explicit if cell > TRANSPARENT => Some(cell as u8),
            Ink::Mono(colour) if cell == 1 => Some(colour),
            _ => None,
        }
    }

    /// Every cell with its API coordinates, row by row from the top.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, i32, i32)> + '_ {
        let (w, h) = (self.grid.width, self.grid.height);
        (0..h).flat_map(move |row| {
            (0..w).map(move |col| (col, row, self.x.saturating_add(col as i32), self.y.saturating_add((h - 1 - row) as i32)))
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpriteAction {
    /// Capture what is underneath, then draw.
    Draw,
    /// Restore the previous capture, capture at the new place, then draw.
    Move,
}

#[derive(Clone, Debug)]
pub enum Feature {
    Plain { layer: Layer, clip: ClipRect },
    Sprite { layer: Layer, clip: ClipRect, save_table: SaveTable, action: SpriteAction },
    SpriteErase { save_table: SaveTable },
    /// Console output; ignores user clipping areas.
    ConsoleGlyph(Layer),
}

impl Feature {
    pub fn plain(layer: Layer, clip: ClipRect) -> Self {
        Feature::Plain { layer, clip }
    }
}
