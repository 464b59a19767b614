use crate::palette::{MEMORY_WIDTH, SCREEN_HEIGHT};

/// Memory row holding API y (y counts up from the bottom of the screen).
#[inline(always)]
pub fn row_of(y: i32) -> usize {
    (SCREEN_HEIGHT as i32 - 1 - y) as usize
}

#[inline(always)]
pub fn on_screen(x: i32, y: i32) -> bool {
    (0..MEMORY_WIDTH as i32).contains(&x) && (0..SCREEN_HEIGHT as i32).contains(&y)
}

pub type Frame = [[u8; MEMORY_WIDTH]; SCREEN_HEIGHT];

/// 250 rows of 640 logical colours, top row first.
#[derive(Clone)]
pub struct VideoMemory {
    pub cells: Box<Frame>,
}

impl Default for VideoMemory {
    fn default() -> Self {
        Self { cells: Box::new([[0; MEMORY_WIDTH]; SCREEN_HEIGHT]) }
    }
}

impl VideoMemory {
    /// Reads API (x, y); off-screen reads give colour 0.
    #[inline(always)]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if on_screen(x, y) {
            self.cells[row_of(y)][x as usize]
        } else {
            0
        }
    }

    #[inline(always)]
    pub fn set(&mut self, x: i32, y: i32, colour: u8) {
        if on_screen(x, y) {
            self.cells[row_of(y)][x as usize] = colour;
        }
    }

    #[inline(always)]
    pub fn xor(&mut self, x: i32, y: i32, colour: u8) {
        if on_screen(x, y) {
            self.cells[row_of(y)][x as usize] ^= colour;
        }
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|row| row.fill(0));
    }

    pub fn copy_from(&mut self, other: &VideoMemory) {
        self.cells.copy_from_slice(&other.cells[..]);
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells[..])
    }
}

impl core::fmt::Debug for VideoMemory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let used = self.as_bytes().iter().filter(|&&c| c != 0).count();
        f.debug_struct("VideoMemory").field("non_zero", &used).finish()
    }
}
