use std::sync::{Arc, Mutex, MutexGuard};

use crate::raster::PixelGrid;

/// A pixel that was underneath a sprite, in API coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SavedPixel {
    pub x: i32,
    pub y: i32,
    pub colour: u8,
}

/// What a sprite covered last time it was drawn. Cloning yields another
/// handle on the same table.
#[derive(Clone, Debug, Default)]
pub struct SaveTable(Arc<Mutex<Vec<SavedPixel>>>);

impl SaveTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<SavedPixel>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    /// Offset from the sprite's bottom-left corner to the point it is
    /// positioned by.
    pub hotspot: (i32, i32),
    /// Explicit-colour grids, -1 transparent.
    pub poses: Vec<PixelGrid>,
}

impl Sprite {
    pub fn new(poses: Vec<PixelGrid>) -> Self {
        Self { hotspot: (0, 0), poses }
    }

    pub fn with_hotspot(mut self, x: i32, y: i32) -> Self {
        self.hotspot = (x, y);
        self
    }
}
