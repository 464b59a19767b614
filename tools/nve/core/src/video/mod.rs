pub mod clipping;
pub mod feature;
pub mod memory;
pub mod pipeline;
pub mod sprite;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};

use crate::charset::Glyph;
use crate::palette::{default_clt, CltElement, ScreenWidth, FLASH_PHASES};
use crate::patterns::PatternTables;
use crate::render::{render_frame, RgbaFrame};
use crate::video::clipping::ClippingTable;
use crate::video::memory::VideoMemory;
use crate::video::pipeline::{lock, DrawPipeline};

/// Mutable configuration shared by the graphics surface and the console.
pub struct VideoState {
    pub on: bool,
    pub width: ScreenWidth,
    pub clt: Vec<CltElement>,
    pub patterns: PatternTables,
    pub clipping: ClippingTable,
    pub border: u8,
}

impl VideoState {
    pub fn new(width: ScreenWidth) -> Self {
        Self {
            on: false,
            width,
            clt: default_clt(width),
            patterns: PatternTables::new(width),
            clipping: ClippingTable::new(width),
            border: 0,
        }
    }
}

/// The console cursor as drawn into the overlay, never into memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CursorOverlay {
    pub x: i32,
    pub y: i32,
    pub glyph: Glyph,
    pub colour: u8,
    pub flashing: bool,
}

/// Video memory, its draw pipeline and the overlay the renderer reads.
///
/// Lock order: state, overlay, queue, memory. The cursor lock is a leaf.
pub struct Video {
    pub pipeline: DrawPipeline,
    overlay: Mutex<VideoMemory>,
    cursor: Mutex<Option<CursorOverlay>>,
    flash_phase: AtomicU8,
    state: Mutex<VideoState>,
}

impl Video {
    pub fn new(width: ScreenWidth) -> Self {
        Self {
            pipeline: DrawPipeline::new(),
            overlay: Mutex::new(VideoMemory::default()),
            cursor: Mutex::new(None),
            flash_phase: AtomicU8::new(0),
            state: Mutex::new(VideoState::new(width)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, VideoState> {
        lock(&self.state)
    }

    #[inline(always)]
    pub fn width(&self) -> ScreenWidth {
        self.state().width
    }

    #[inline(always)]
    pub fn flash_phase(&self) -> u8 {
        self.flash_phase.load(Ordering::Relaxed)
    }

    pub fn advance_flash(&self) {
        let next = (self.flash_phase() + 1) % FLASH_PHASES;
        self.flash_phase.store(next, Ordering::Relaxed);
    }

    pub fn set_cursor(&self, cursor: Option<CursorOverlay>) {
        *lock(&self.cursor) = cursor;
    }

    pub fn cursor(&self) -> Option<CursorOverlay> {
        *lock(&self.cursor)
    }

    /// Switches width: waits for the queue, wipes memory and rebuilds the
    /// width-dependent tables. `clt` replaces the colour table.
    pub fn change_width(&self, width: ScreenWidth, clt: Vec<CltElement>) {
        let mut state = self.state();
        self.pipeline.clear_memory();
        state.width = width;
        state.clt = clt;
        state.patterns.reset_dithers(width);
        state.clipping.reset(width);
        info!("screen width now {} columns", width.columns());
    }

    /// Applies everything queued, snapshots memory into the overlay and
    /// blends the cursor on top.
    pub fn compose(&self) -> usize {
        let applied = self.pipeline.compose();
        let mut overlay = lock(&self.overlay);
        self.pipeline.copy_into(&mut overlay);

        let phase = self.flash_phase();
        if let Some(cursor) = *lock(&self.cursor) {
            if !cursor.flashing || phase < 2 {
                for (row, bits) in cursor.glyph.iter().enumerate() {
                    for (col, &bit) in bits.iter().enumerate() {
                        if bit == 1 {
                            overlay.xor(cursor.x + col as i32, cursor.y + (9 - row) as i32, cursor.colour);
                        }
                    }
                }
            }
        }
        if applied > 0 {
            debug!(target: "pipeline", "composed {} features", applied);
        }
        applied
    }

    pub fn overlay_snapshot(&self) -> VideoMemory {
        lock(&self.overlay).clone()
    }

    /// Composes and renders one frame.
    pub fn frame(&self) -> RgbaFrame {
        self.compose();
        let (clt, width, border) = {
            let state = self.state();
            (state.clt.clone(), state.width, state.border)
        };
        let overlay = lock(&self.overlay);
        render_frame(&overlay, &clt, width, self.flash_phase(), border)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PixelGrid;
    use crate::video::feature::{ClipRect, Feature, Ink, Layer};

    fn glyph_with_bar() -> Glyph {
        let mut glyph = [[0u8; 8]; 10];
        glyph[9] = [1; 8];
        glyph
    }

    #[test]
    fn test_cursor_goes_to_overlay_only() {
        let video = Video::new(ScreenWidth::High);
        video.set_cursor(Some(CursorOverlay { x: 8, y: 0, glyph: glyph_with_bar(), colour: 3, flashing: false }));
        video.compose();
        let overlay = video.overlay_snapshot();
        assert_eq!(overlay.get(8, 0), 3);
        assert_eq!(overlay.get(15, 0), 3);
        assert_eq!(overlay.get(8, 1), 0);
        assert_eq!(video.pipeline.read(|m| m.get(8, 0)), 0);
    }

    #[test]
    fn test_flashing_cursor_hidden_late_in_cycle() {
        let video = Video::new(ScreenWidth::High);
        video.set_cursor(Some(CursorOverlay { x: 0, y: 0, glyph: glyph_with_bar(), colour: 1, flashing: true }));
        video.advance_flash();
        video.advance_flash();
        assert_eq!(video.flash_phase(), 2);
        video.compose();
        assert_eq!(video.overlay_snapshot().get(0, 0), 0);
        for _ in 0..3 {
            video.advance_flash();
        }
        assert_eq!(video.flash_phase(), 0);
        video.compose();
        assert_eq!(video.overlay_snapshot().get(0, 0), 1);
    }

    #[test]
    fn test_change_width_wipes_memory() {
        let video = Video::new(ScreenWidth::High);
        let layer = Layer::new(PixelGrid::new(4, 4, 2), 0, 0, Ink::Explicit, false);
        video.pipeline.submit(Feature::plain(layer, ClipRect::memory()));
        video.change_width(ScreenWidth::Low, default_clt(ScreenWidth::Low));
        assert_eq!(video.pipeline.queue_len(), 0);
        assert_eq!(video.pipeline.read(|m| m.get(0, 0)), 0);
        assert_eq!(video.state().clipping.current_rect(), ClipRect::screen(ScreenWidth::Low));
        assert_eq!(video.state().clt.len(), 16);
    }
}
