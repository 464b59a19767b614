use crate::palette::{rgba, CltElement, ScreenWidth, MEMORY_WIDTH, SCREEN_HEIGHT};
use crate::video::memory::VideoMemory;

pub const FRAME_WIDTH: usize = MEMORY_WIDTH;
pub const FRAME_HEIGHT: usize = SCREEN_HEIGHT * 2;

/// A displayable frame: 640x500 RGBA plus the border colour around it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 4]>,
    pub border: [u8; 4],
}

impl RgbaFrame {
    #[inline(always)]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        self.pixels[y * self.width + x]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Receives every composed frame.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &RgbaFrame);
}

impl<F: FnMut(&RgbaFrame) + Send> FrameSink for F {
    fn present(&mut self, frame: &RgbaFrame) {
        self(frame)
    }
}

/// Resolves logical colours through the CLT at the given flash phase.
/// Low-resolution pixels are doubled both ways, high-resolution pixels
/// only vertically.
pub fn render_frame(memory: &VideoMemory, clt: &[CltElement], width: ScreenWidth, phase: u8, border: u8) -> RgbaFrame {
    let mut lut = [[0u8; 4]; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let element = clt.get(i).or_else(|| clt.get(i % clt.len().max(1)));
        *entry = element.map_or(rgba(0), |e| rgba(e.physical(phase)));
    }

    let mut pixels = vec![[0u8; 4]; FRAME_WIDTH * FRAME_HEIGHT];
    for (y, out_row) in pixels.chunks_exact_mut(FRAME_WIDTH).enumerate() {
        let src = &memory.cells[y / 2];
        match width {
            ScreenWidth::Low => {
                for (x, px) in out_row.iter_mut().enumerate() {
                    *px = lut[src[x / 2] as usize];
                }
            }
            ScreenWidth::High => {
                for (px, &c) in out_row.iter_mut().zip(src.iter()) {
                    *px = lut[c as usize];
                }
            }
        }
    }

    RgbaFrame { width: FRAME_WIDTH, height: FRAME_HEIGHT, pixels, border: rgba(border) }
}
