//! Stateless rasterizers producing pixel grids for the draw pipeline.
//!
//! Grids are row-major with row 0 at the top. The `plot`/`get_xy` helpers
//! take local coordinates with y growing upwards from the bottom row, which
//! is how every caller in this crate thinks about geometry.

pub mod circle;
pub mod fill;
pub mod flood;
pub mod line;

use crate::palette::{MEMORY_WIDTH, SCREEN_HEIGHT};
use crate::patterns::PatternTables;

pub const TRANSPARENT: i16 = -1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<i16>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, fill: i16) -> Self {
        Self { width, height, cells: vec![fill; width * height] }
    }

    pub fn transparent(width: usize, height: usize) -> Self {
        Self::new(width, height, TRANSPARENT)
    }

    /// Builds a grid from rows listed top first. Short rows are padded
    /// with transparent cells.
    pub fn from_rows<R: AsRef<[i16]>>(rows: &[R]) -> Self {
        let width = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        let mut grid = Self::transparent(width, rows.len());
        for (row, line) in rows.iter().enumerate() {
            for (col, &v) in line.as_ref().iter().enumerate() {
                grid.set(col, row, v);
            }
        }
        grid
    }

    #[inline(always)]
    pub fn get(&self, col: usize, row: usize) -> i16 {
        self.cells[row * self.width + col]
    }

    #[inline(always)]
    pub fn set(&mut self, col: usize, row: usize, value: i16) {
        self.cells[row * self.width + col] = value;
    }

    #[inline(always)]
    pub fn contains_xy(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Row index of local y (y up).
    #[inline(always)]
    pub fn row_of(&self, y: i32) -> usize {
        self.height - 1 - y as usize
    }

    /// Writes at local (x, y) with y up; out-of-grid writes are dropped.
    #[inline(always)]
    pub fn plot(&mut self, x: i32, y: i32, value: i16) {
        if self.contains_xy(x, y) {
            let row = self.row_of(y);
            self.set(x as usize, row, value);
        }
    }

    #[inline(always)]
    pub fn get_xy(&self, x: i32, y: i32) -> i16 {
        self.get(x as usize, self.row_of(y))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i16]> {
        self.cells.chunks(self.width.max(1))
    }

    /// Nearest-neighbour resample to `width` x `height`.
    pub fn resize(&self, width: usize, height: usize) -> PixelGrid {
        let mut out = PixelGrid::transparent(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        let x_scale = self.width as f64 / width as f64;
        let y_scale = self.height as f64 / height as f64;
        for row in 0..height {
            let src_row = (((row as f64 + 0.5) * y_scale) as usize).min(self.height - 1);
            for col in 0..width {
                let src_col = (((col as f64 + 0.5) * x_scale) as usize).min(self.width - 1);
                out.set(col, row, self.get(src_col, src_row));
            }
        }
        out
    }

    /// Rotates a quarter turn anticlockwise by transposition.
    pub fn rotate_ccw(&self) -> PixelGrid {
        let mut out = PixelGrid::transparent(self.height, self.width);
        for row in 0..self.height {
            for col in 0..self.width {
                out.set(row, self.width - 1 - col, self.get(col, row));
            }
        }
        out
    }

    pub fn rotate_ccw_times(&self, quarter_turns: u8) -> PixelGrid {
        let mut out = self.clone();
        for _ in 0..quarter_turns % 4 {
            out = out.rotate_ccw();
        }
        out
    }
}

/// How an area fill chooses colours.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillPaint {
    Solid(u8),
    Dither(usize),
    Hatch { id: usize, primary: u8, secondary: Option<u8> },
}

impl FillPaint {
    /// Colour at grid coordinates; hatch gaps may be transparent.
    #[inline(always)]
    pub fn colour_at(&self, patterns: &PatternTables, col: i32, row: i32) -> i16 {
        match *self {
            FillPaint::Solid(c) => c as i16,
            FillPaint::Dither(id) => patterns.dither_at(id, col, row) as i16,
            FillPaint::Hatch { id, primary, secondary } => {
                if patterns.hatched_at(id, col, row) {
                    primary as i16
                } else {
                    secondary.map_or(TRANSPARENT, |c| c as i16)
                }
            }
        }
    }
}

/// How a line chooses colours as it walks its style mask.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinePaint {
    Dither(usize),
    Styled { mask: [u8; 16], primary: u8, secondary: Option<u8> },
}

impl LinePaint {
    pub fn solid(colour: u8) -> Self {
        LinePaint::Styled { mask: [1; 16], primary: colour, secondary: None }
    }

    #[inline(always)]
    pub fn colour_at(&self, patterns: &PatternTables, counter: usize, col: i32, row: i32) -> i16 {
        match *self {
            LinePaint::Dither(id) => patterns.dither_at(id, col, row) as i16,
            LinePaint::Styled { mask, primary, secondary } => {
                if mask[counter & 15] == 1 {
                    primary as i16
                } else {
                    secondary.map_or(TRANSPARENT, |c| c as i16)
                }
            }
        }
    }
}

/// Where a shape may leave marks: video memory plus a one-pixel margin, so
/// edge correction next to the screen border sees the same neighbours it
/// would on an unclipped grid.
pub const RASTER_WINDOW: (i32, i32, i32, i32) = (-1, -1, MEMORY_WIDTH as i32, SCREEN_HEIGHT as i32);

/// The visible part of a shape's bounding box, and how its cells map back
/// onto the whole box for pattern lookups.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// API position of the grid's bottom-left cell.
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
    col_offset: i32,
    row_offset: i32,
}

impl Placement {
    /// Intersects `bounds` with the raster window. `None` when nothing of
    /// the shape can be seen.
    pub fn new(bounds: (i32, i32, i32, i32)) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = bounds;
        let (wx0, wy0, wx1, wy1) = RASTER_WINDOW;
        let (x0, y0) = (min_x.max(wx0), min_y.max(wy0));
        let (x1, y1) = (max_x.min(wx1), max_y.min(wy1));
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some(Self {
            x: x0,
            y: y0,
            width: (x1 - x0 + 1) as usize,
            height: (y1 - y0 + 1) as usize,
            col_offset: (x0 as i64 - min_x as i64).rem_euclid(MEMORY_WIDTH as i64) as i32,
            row_offset: (max_y as i64 - y1 as i64).rem_euclid(SCREEN_HEIGHT as i64) as i32,
        })
    }

    /// Grid column and row as seen from the whole bounding box, reduced
    /// to the period of the pattern lookup tables.
    #[inline(always)]
    pub fn pattern_position(&self, col: i32, row: i32) -> (i32, i32) {
        (col + self.col_offset, row + self.row_offset)
    }

    pub fn max_x(&self) -> i32 {
        self.x + self.width as i32 - 1
    }

    pub fn max_y(&self) -> i32 {
        self.y + self.height as i32 - 1
    }

    /// Clips the segment `a`-`b` (API coordinates) to this placement and
    /// returns it in local coordinates, together with how many steps along
    /// the major axis were cut from the front, modulo 16.
    pub fn clip_segment(&self, a: (i32, i32), b: (i32, i32)) -> Option<((i32, i32), (i32, i32), usize)> {
        let (ax, ay) = (a.0 as f64, a.1 as f64);
        let (dx, dy) = (b.0 as f64 - ax, b.1 as f64 - ay);
        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        let edges = [
            (-dx, ax - self.x as f64),
            (dx, self.max_x() as f64 - ax),
            (-dy, ay - self.y as f64),
            (dy, self.max_y() as f64 - ay),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        let at = |t: f64| {
            let x = ((ax + t * dx).round() as i64).clamp(self.x as i64, self.max_x() as i64);
            let y = ((ay + t * dy).round() as i64).clamp(self.y as i64, self.max_y() as i64);
            (x, y)
        };
        let (start, end) = (at(t0), at(t1));
        let skipped = ((start.0 - a.0 as i64).abs().max((start.1 - a.1 as i64).abs()) % 16) as usize;
        let local = |(x, y): (i64, i64)| ((x - self.x as i64) as i32, (y - self.y as i64) as i32);
        Some((local(start), local(end), skipped))
    }
}

/// Bounding box of a point list as (min_x, min_y, max_x, max_y).
pub fn bounds(points: &[(i32, i32)]) -> Option<(i32, i32, i32, i32)> {
    let first = points.first()?;
    Some(points.iter().fold((first.0, first.1, first.0, first.1), |(a, b, c, d), &(x, y)| {
        (a.min(x), b.min(y), c.max(x), d.max(y))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PixelGrid {
        PixelGrid::from_rows(&[[1i16, 2, 3], [4, 5, 6]])
    }

    #[test]
    fn test_plot_uses_bottom_left_origin() {
        let mut grid = PixelGrid::transparent(3, 2);
        grid.plot(0, 0, 7);
        grid.plot(2, 1, 9);
        grid.plot(3, 0, 1);
        assert_eq!(grid.get(0, 1), 7);
        assert_eq!(grid.get(2, 0), 9);
        assert_eq!(grid.cells.iter().filter(|&&c| c != TRANSPARENT).count(), 2);
    }

    #[test]
    fn test_rotate_ccw() {
        let rotated = sample().rotate_ccw();
        assert_eq!(rotated, PixelGrid::from_rows(&[[3i16, 6], [2, 5], [1, 4]]));
        assert_eq!(sample().rotate_ccw_times(4), sample());
    }

    #[test]
    fn test_resize_doubles_exactly() {
        let big = sample().resize(6, 4);
        assert_eq!(big.get(0, 0), 1);
        assert_eq!(big.get(1, 1), 1);
        assert_eq!(big.get(5, 3), 6);
        assert_eq!(big.get(2, 2), 5);
        assert_eq!(big.resize(3, 2), sample());
    }

    #[test]
    fn test_bounds() {
        assert_eq!(bounds(&[(3, 4), (-1, 9), (5, 0)]), Some((-1, 0, 5, 9)));
        assert_eq!(bounds(&[]), None);
    }

    #[test]
    fn test_placement_inside_window_is_whole_box() {
        let place = Placement::new((10, 20, 30, 25)).unwrap();
        assert_eq!((place.x, place.y, place.width, place.height), (10, 20, 21, 6));
        assert_eq!(place.pattern_position(3, 4), (3, 4));
        assert_eq!(place.clip_segment((10, 20), (30, 25)), Some(((0, 0), (20, 5), 0)));
    }

    #[test]
    fn test_placement_off_window_is_none() {
        assert_eq!(Placement::new((700, 0, 900, 10)), None);
        assert_eq!(Placement::new((0, -50, 10, -2)), None);
        assert_eq!(Placement::new((i32::MIN, i32::MIN, i32::MIN + 5, 0)), None);
    }

    #[test]
    fn test_placement_of_huge_box_is_window_sized() {
        let place = Placement::new((-2_000_000_000, 0, 2_000_000_000, 100)).unwrap();
        assert_eq!((place.x, place.y), (-1, 0));
        assert_eq!((place.width, place.height), (MEMORY_WIDTH + 2, 101));
        let skipped_cols = (-1i64 + 2_000_000_000).rem_euclid(MEMORY_WIDTH as i64) as i32;
        assert_eq!(place.pattern_position(0, 0), (skipped_cols, 0));
    }

    #[test]
    fn test_clip_segment_trims_to_window() {
        let place = Placement::new((-2_000_000_000, 0, 2_000_000_000, 0)).unwrap();
        let (from, to, _) = place.clip_segment((-2_000_000_000, 0), (2_000_000_000, 0)).unwrap();
        assert_eq!(from, (0, 0));
        assert_eq!(to, (MEMORY_WIDTH as i32 + 1, 0));

        let place = Placement::new((0, 0, 100, 100)).unwrap();
        assert_eq!(place.clip_segment((-20, 5), (-10, 5)), None);
        let (from, to, skipped) = place.clip_segment((-20, 5), (10, 5)).unwrap();
        assert_eq!((from, to, skipped), ((0, 5), (10, 5), 4));
    }
}
