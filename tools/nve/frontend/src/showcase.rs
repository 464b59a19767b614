//! A screenful of every graphics primitive, for eyeballing the renderer.

use nve_core::graphics::GraphicsOutput;
use nve_core::patterns::{MARKER_END, PEN_UP};
use nve_core::raster::PixelGrid;
use nve_core::video::sprite::{SaveTable, Sprite};
use nve_core::Result;
use tracing::debug;

const ARROW: [(i32, i32); 7] = [(0, -3), (0, 3), PEN_UP, (-2, 1), (0, 3), (2, 1), MARKER_END];

fn rect(x1: i32, y1: i32, x2: i32, y2: i32) -> [(i32, i32); 4] {
    [(x1, y1), (x2, y1), (x2, y2), (x1, y2)]
}

pub fn draw(g: &GraphicsOutput) -> Result<()> {
    g.set_border_colour(1)?;

    // fill styles across the top
    g.fill_area(1, 0, 1, 0, 0, &rect(10, 190, 90, 240))?;
    g.fill_area(2, 3, 2, 0, 0, &rect(100, 190, 180, 240))?;
    for hatch in 0..6 {
        let x = 190 + hatch * 70;
        g.fill_area(3, hatch, 3, 1, 0, &rect(x, 190, x + 60, 240))?;
    }
    g.fill_area(0, 0, 3, 0, 0, &[(20, 110), (80, 180), (140, 110)])?;

    // every line style
    for style in 1..6 {
        let y = 170 - style * 8;
        g.poly_line(style, &[], 2, 0, 1, &[(160, y), (300, y)])?;
    }
    g.poly_line(6, &[1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0], 3, 1, 0, &[(160, 120), (300, 120)])?;

    g.pie_slice(380, 140, 40, 0, 0, 2)?;
    g.pie_slice(480, 140, 40, 500, 2500, 3)?;

    for style in 1..=5 {
        g.poly_marker(style, 2, 2, 1, &[], &[(540 + style * 15, 160)])?;
    }
    g.poly_marker(6, 3, 3, 3, &ARROW, &[(600, 120)])?;

    // a closed box flooded from inside
    g.fill_area(0, 0, 1, 0, 0, &rect(20, 20, 120, 90))?;
    g.fill_area(1, 0, 2, 0, 0, &rect(50, 40, 70, 60))?;
    g.flood_fill_area(2, 5, 3, 0, 0, 1, 1, 30, 30)?;

    for orientation in 0..4 {
        g.plot_character_string(orientation, 2, 1, 3, 0, "Nimbus", 200 + orientation * 90, 60)?;
    }

    let pose = PixelGrid::from_rows(&[
        [-1i16, 3, 3, -1],
        [3, 1, 1, 3],
        [3, 1, 1, 3],
        [-1, 3, 3, -1],
    ]);
    let sprite = Sprite::new(vec![pose.resize(16, 16), pose.resize(8, 8)]);
    let table = SaveTable::new();
    g.draw_sprite(&sprite, &table, 560, 40, 0, false, 0)?;
    g.move_sprite(&sprite, &table, 580, 30, 1, false, 0)?;

    g.plonk_logo(150, 10)?;
    debug!("showcase submitted");
    Ok(())
}
