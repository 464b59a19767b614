//! Writing composed frames out as images.

use std::path::Path;

use anyhow::{anyhow, Context};
use image::{imageops, Rgba, RgbaImage};

use nve_core::render::RgbaFrame;

/// Width of the border drawn around the picture, in frame pixels.
pub const BORDER: u32 = 16;

/// The frame centred on a canvas filled with its border colour.
pub fn bordered_image(frame: &RgbaFrame) -> anyhow::Result<RgbaImage> {
    let (width, height) = (frame.width as u32, frame.height as u32);
    let picture = RgbaImage::from_raw(width, height, frame.as_bytes().to_vec())
        .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", width, height))?;
    let mut canvas = RgbaImage::from_pixel(width + 2 * BORDER, height + 2 * BORDER, Rgba(frame.border));
    imageops::overlay(&mut canvas, &picture, BORDER as i64, BORDER as i64);
    Ok(canvas)
}

pub fn write_png(frame: &RgbaFrame, path: &Path) -> anyhow::Result<()> {
    bordered_image(frame)?.save(path).with_context(|| format!("writing {}", path.display()))
}
