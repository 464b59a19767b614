//! Character cells and the built-in asset provider.

use embedded_graphics::{
    mono_font::{ascii, iso_8859_1, MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use once_cell::sync::Lazy;

use crate::raster::PixelGrid;

pub const GLYPH_WIDTH: usize = 8;
pub const GLYPH_HEIGHT: usize = 10;
pub const CHARSETS: usize = 2;

/// An 8x10 character cell, rows top first, 1 where the character is set.
pub type Glyph = [[u8; GLYPH_WIDTH]; GLYPH_HEIGHT];

/// Supplies character sets and the logo.
pub trait AssetProvider: Send + Sync {
    fn glyph(&self, charset: u8, code: u8) -> Glyph;

    fn logo(&self) -> Option<PixelGrid> {
        None
    }
}

struct GlyphCell(Glyph);

impl DrawTarget for GlyphCell {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 || x >= GLYPH_WIDTH as i32 || y >= GLYPH_HEIGHT as i32 {
                continue;
            }
            self.0[y as usize][x as usize] = color.is_on() as u8;
        }
        Ok(())
    }
}

impl OriginDimensions for GlyphCell {
    fn size(&self) -> Size {
        Size::new(GLYPH_WIDTH as u32, GLYPH_HEIGHT as u32)
    }
}

fn rasterize(font: &MonoFont<'static>, code: u8) -> Glyph {
    let mut cell = GlyphCell([[0; GLYPH_WIDTH]; GLYPH_HEIGHT]);
    if code < 0x20 || code == 0x7F {
        return cell.0;
    }
    let mut buf = [0u8; 4];
    let s = char::from(code).encode_utf8(&mut buf);
    let style = MonoTextStyle::new(font, BinaryColor::On);
    Text::with_baseline(s, Point::new(1, 0), style, Baseline::Top).draw(&mut cell).ok();
    cell.0
}

static BUILTIN_GLYPHS: Lazy<[Vec<Glyph>; CHARSETS]> = Lazy::new(|| {
    [
        (0..=255u8).map(|c| rasterize(&ascii::FONT_6X10, c)).collect(),
        (0..=255u8).map(|c| rasterize(&iso_8859_1::FONT_6X10, c)).collect(),
    ]
});

/// Character sets rendered from the embedded-graphics 6x10 fonts: set 0 is
/// ASCII, set 1 adds the Latin-1 upper half. No logo.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuiltinAssets;

impl AssetProvider for BuiltinAssets {
    fn glyph(&self, charset: u8, code: u8) -> Glyph {
        BUILTIN_GLYPHS[charset as usize % CHARSETS][code as usize]
    }
}

/// A glyph as a grid: `pen` where set, `paper` elsewhere, with an optional
/// underline on the second row from the bottom.
pub fn glyph_grid(glyph: &Glyph, pen: i16, paper: i16, underline: bool) -> PixelGrid {
    let mut grid = PixelGrid::new(GLYPH_WIDTH, GLYPH_HEIGHT, paper);
    for (row, bits) in glyph.iter().enumerate() {
        for (col, &bit) in bits.iter().enumerate() {
            if bit == 1 || (underline && row == GLYPH_HEIGHT - 2) {
                grid.set(col, row, pen);
            }
        }
    }
    grid
}
