//! Host-side assets: the built-in character sets plus an optional logo
//! loaded from an image file.

use std::path::Path;

use anyhow::Context;
use image::{GenericImageView, Pixel};
use tracing::info;

use nve_core::charset::{AssetProvider, BuiltinAssets, Glyph};
use nve_core::raster::{PixelGrid, TRANSPARENT};

#[derive(Default)]
pub struct HostAssets {
    logo: Option<PixelGrid>,
}

impl HostAssets {
    pub fn with_logo(path: &Path) -> anyhow::Result<Self> {
        let image = image::open(path).with_context(|| format!("loading logo {}", path.display()))?;
        let (width, height) = image.dimensions();
        let mut logo = PixelGrid::transparent(width as usize, height as usize);
        for (x, y, pixel) in image.pixels() {
            logo.set(x as usize, y as usize, logo_colour(pixel.0));
        }
        info!("loaded {}x{} logo from {}", width, height, path.display());
        Ok(Self { logo: Some(logo) })
    }
}

/// Mostly transparent pixels stay transparent, the rest are quantised by
/// brightness to the four colours every width can show.
fn logo_colour(rgba: [u8; 4]) -> i16 {
    if rgba[3] < 128 {
        return TRANSPARENT;
    }
    let luma = image::Rgba(rgba).to_luma().0[0];
    (luma / 64) as i16
}

impl AssetProvider for HostAssets {
    fn glyph(&self, charset: u8, code: u8) -> Glyph {
        BuiltinAssets.glyph(charset, code)
    }

    fn logo(&self) -> Option<PixelGrid> {
        self.logo.clone()
    }
}
