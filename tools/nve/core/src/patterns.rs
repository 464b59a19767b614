use crate::palette::{ScreenWidth, MEMORY_WIDTH, SCREEN_HEIGHT};

pub const DITHER_SLOTS: usize = 16;
pub const PRESET_DITHERS: usize = 8;
pub const HATCHING_SLOTS: usize = 6;
pub const LINE_STYLES: usize = 7;
pub const USER_LINE_STYLE: usize = 6;
pub const MARKER_STYLES: usize = 5;

/// Marker vector sentinels.
pub const PEN_UP: (i32, i32) = (-128, 0);
pub const MARKER_END: (i32, i32) = (-128, -128);

pub type DitherPattern = [[u8; 4]; 4];
pub type HatchingPattern = [[u8; 16]; 16];
pub type LineStyle = [u8; 16];

const fn checker(a: u8, b: u8) -> DitherPattern {
    [[a, b, a, b], [b, a, b, a], [a, b, a, b], [b, a, b, a]]
}

const fn solid(a: u8) -> DitherPattern {
    [[a; 4]; 4]
}

const fn sparse(back: u8, dot: u8) -> DitherPattern {
    [[dot, back, back, back], [back, back, back, back], [back, back, dot, back], [back, back, back, back]]
}

pub fn default_dithers(width: ScreenWidth) -> [DitherPattern; DITHER_SLOTS] {
    let mut out = [solid(0); DITHER_SLOTS];
    match width {
        ScreenWidth::Low => {
            for i in 0..PRESET_DITHERS {
                out[i] = checker(i as u8, i as u8 + 8);
            }
            for i in PRESET_DITHERS..DITHER_SLOTS {
                out[i] = solid(i as u8);
            }
        }
        ScreenWidth::High => {
            out[..PRESET_DITHERS].copy_from_slice(&[
                solid(0),
                sparse(0, 1),
                checker(0, 1),
                solid(1),
                checker(1, 2),
                checker(1, 3),
                checker(2, 3),
                solid(3),
            ]);
            for i in PRESET_DITHERS..DITHER_SLOTS {
                out[i] = solid((i % 4) as u8);
            }
        }
    }
    out
}

pub fn default_hatchings() -> [HatchingPattern; HATCHING_SLOTS] {
    let mut out = [[[0u8; 16]; 16]; HATCHING_SLOTS];
    for y in 0..16 {
        for x in 0..16 {
            out[0][y][x] = (y % 4 == 0) as u8;
            out[1][y][x] = (x % 4 == 0) as u8;
            out[2][y][x] = ((x + y) % 4 == 0) as u8;
            out[3][y][x] = ((x + 16 - y) % 4 == 0) as u8;
            out[4][y][x] = (x % 4 == 0 || y % 4 == 0) as u8;
            out[5][y][x] = ((x + y) % 4 == 0 || (x + 16 - y) % 4 == 0) as u8;
        }
    }
    out
}

pub const DEFAULT_LINE_STYLES: [LineStyle; LINE_STYLES] = [
    [1; 16], // dithered, colour comes from the dither pattern
    [1; 16],
    [1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0],
    [1, 1, 1, 1, 1, 1, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 1, 1, 0, 0],
    [1; 16],
];

pub fn default_markers() -> Vec<Vec<(i32, i32)>> {
    vec![
        // plus
        vec![(-2, 0), (2, 0), PEN_UP, (0, -2), (0, 2), MARKER_END],
        // asterisk
        vec![
            (-2, 0), (2, 0), PEN_UP, (0, -2), (0, 2), PEN_UP,
            (-2, -2), (2, 2), PEN_UP, (-2, 2), (2, -2), MARKER_END,
        ],
        // circle
        vec![
            (-1, 2), (1, 2), (2, 1), (2, -1), (1, -2),
            (-1, -2), (-2, -1), (-2, 1), (-1, 2), MARKER_END,
        ],
        // cross
        vec![(-2, -2), (2, 2), PEN_UP, (-2, 2), (2, -2), MARKER_END],
        // square
        vec![(-2, -2), (-2, 2), (2, 2), (2, -2), (-2, -2), MARKER_END],
    ]
}

/// A pattern expanded across the whole of video memory so a per-pixel
/// lookup is a single index.
#[derive(Clone)]
pub struct Lookup(Vec<u8>);

impl Lookup {
    fn expand<const N: usize>(tile: &[[u8; N]; N]) -> Self {
        let mut cells = vec![0u8; MEMORY_WIDTH * SCREEN_HEIGHT];
        for (row, line) in cells.chunks_exact_mut(MEMORY_WIDTH).enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                *cell = tile[row % N][col % N];
            }
        }
        Lookup(cells)
    }

    /// Looks up the value at grid coordinates (column, row from top).
    #[inline(always)]
    pub fn at(&self, col: i32, row: i32) -> u8 {
        let col = col.rem_euclid(MEMORY_WIDTH as i32) as usize;
        let row = row.rem_euclid(SCREEN_HEIGHT as i32) as usize;
        self.0[row * MEMORY_WIDTH + col]
    }
}

pub struct PatternTables {
    pub dithers: [DitherPattern; DITHER_SLOTS],
    pub hatchings: [HatchingPattern; HATCHING_SLOTS],
    pub line_styles: [LineStyle; LINE_STYLES],
    pub markers: Vec<Vec<(i32, i32)>>,
    dither_lookup: Vec<Lookup>,
    hatching_lookup: Vec<Lookup>,
}

impl PatternTables {
    pub fn new(width: ScreenWidth) -> Self {
        let mut tables = Self {
            dithers: default_dithers(width),
            hatchings: default_hatchings(),
            line_styles: DEFAULT_LINE_STYLES,
            markers: default_markers(),
            dither_lookup: Vec::new(),
            hatching_lookup: Vec::new(),
        };
        tables.rebuild();
        tables
    }

    /// Restores every table to its default for `width`.
    pub fn reset(&mut self, width: ScreenWidth) {
        *self = Self::new(width);
    }

    /// Resets the presets and user dithers for a new width, keeping hatchings.
    pub fn reset_dithers(&mut self, width: ScreenWidth) {
        self.dithers = default_dithers(width);
        self.dither_lookup = self.dithers.iter().map(|p| Lookup::expand(p)).collect();
    }

    pub fn rebuild(&mut self) {
        self.dither_lookup = self.dithers.iter().map(|p| Lookup::expand(p)).collect();
        self.hatching_lookup = self.hatchings.iter().map(|p| Lookup::expand(p)).collect();
    }

    pub fn set_dither(&mut self, id: usize, pattern: DitherPattern) {
        self.dithers[id] = pattern;
        self.dither_lookup[id] = Lookup::expand(&pattern);
    }

    pub fn set_hatching(&mut self, id: usize, pattern: HatchingPattern) {
        self.hatchings[id] = pattern;
        self.hatching_lookup[id] = Lookup::expand(&pattern);
    }

    #[inline(always)]
    pub fn dither_at(&self, id: usize, col: i32, row: i32) -> u8 {
        self.dither_lookup[id].at(col, row)
    }

    #[inline(always)]
    pub fn hatched_at(&self, id: usize, col: i32, row: i32) -> bool {
        self.hatching_lookup[id].at(col, row) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_tiles_pattern() {
        let tables = PatternTables::new(ScreenWidth::Low);
        let tile = tables.dithers[3];
        for (col, row) in [(0i32, 0i32), (5, 7), (639, 249), (-1, -1), (700, 300)] {
            let c = col.rem_euclid(640) as usize % 4;
            let r = row.rem_euclid(250) as usize % 4;
            assert_eq!(tables.dither_at(3, col, row), tile[r][c], "at ({}, {})", col, row);
        }
    }

    #[test]
    fn test_set_dither_rebuilds_lookup() {
        let mut tables = PatternTables::new(ScreenWidth::High);
        tables.set_dither(9, [[3, 2, 1, 0]; 4]);
        assert_eq!(tables.dither_at(9, 0, 0), 3);
        assert_eq!(tables.dither_at(9, 3, 2), 0);
        assert_eq!(tables.dither_at(9, 6, 1), 1);
    }

    #[test]
    fn test_default_dithers_fit_width() {
        for width in [ScreenWidth::Low, ScreenWidth::High] {
            let max = width.max_colour() as u8;
            assert!(default_dithers(width).iter().flatten().flatten().all(|&c| c <= max));
        }
    }

    #[test]
    fn test_markers_are_terminated() {
        for marker in default_markers() {
            assert_eq!(marker.last(), Some(&MARKER_END));
        }
    }
}
