//! The validated graphics output surface.
//!
//! Every operation checks all of its parameters before touching anything,
//! returns its outcome and also records it in the shared function-error
//! word. Apart from the lifecycle, CLT and border calls, everything fails
//! with `NotInitialized` until the output has been started.

use std::sync::{Arc, MutexGuard};

use log::info;

use crate::charset::{AssetProvider, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::error::{ErrorCode, FunctionError, Result};
use crate::inputs::{Pointer, PointerStatus};
use crate::palette::{default_clt, CltElement, ScreenWidth, SCREEN_HEIGHT};
use crate::patterns::{DITHER_SLOTS, HATCHING_SLOTS, MARKER_END, MARKER_STYLES, PEN_UP, PRESET_DITHERS, USER_LINE_STYLE};
use crate::raster::circle::{pie_slice, FULL_TURN};
use crate::raster::fill::{close, polygon};
use crate::raster::flood::{flood, FloodBounds, FloodRule};
use crate::raster::line::{draw_segment, polyline};
use crate::raster::{bounds, FillPaint, LinePaint, PixelGrid, Placement, TRANSPARENT};
use crate::video::feature::{ClipRect, Feature, Ink, Layer, SpriteAction};
use crate::video::sprite::{SaveTable, Sprite};
use crate::video::{Video, VideoState};

const MAX_MAGNIFICATION: i32 = 50;
/// Marker vectors are signed bytes; -128 is reserved for the sentinels.
const MARKER_REACH: i32 = 127;

#[inline(always)]
fn check(valid: bool) -> Result<()> {
    if valid {
        Ok(())
    } else {
        Err(ErrorCode::InvalidParameter)
    }
}

fn in_range(value: i32, low: i32, high: i32) -> Result<()> {
    check((low..=high).contains(&value))
}

/// Restores every table to its power-on default for the current width.
fn reset_tables(state: &mut VideoState) {
    let width = state.width;
    state.patterns.reset(width);
    state.clt = default_clt(width);
    state.clipping.reset(width);
}

fn fill_paint(style: i32, index: i32, primary: u8, secondary: u8, transparency: i32) -> FillPaint {
    match style {
        2 => FillPaint::Dither(index as usize),
        3 => FillPaint::Hatch {
            id: index as usize,
            primary,
            secondary: (transparency == 0).then_some(secondary),
        },
        _ => FillPaint::Solid(primary),
    }
}

/// Colour argument of a dithered draw: the dither supplies the colours, so
/// XOR is selected by exactly 256.
fn check_dither_colour(width: ScreenWidth, colour: i32) -> Result<(u8, bool)> {
    if colour >= 256 {
        check(colour == 256)?;
        return Ok((0, true));
    }
    Ok((width.check_colour(colour)?, false))
}

fn check_fill_style(style: i32, index: i32, lowest_style: i32) -> Result<()> {
    in_range(style, lowest_style, 3)?;
    match style {
        2 => in_range(index, 0, DITHER_SLOTS as i32 - 1),
        3 => in_range(index, 0, HATCHING_SLOTS as i32 - 1),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct GraphicsOutput {
    video: Arc<Video>,
    assets: Arc<dyn AssetProvider>,
    pointer: Pointer,
    status: Arc<FunctionError>,
}

impl GraphicsOutput {
    pub fn new(video: Arc<Video>, assets: Arc<dyn AssetProvider>, pointer: Pointer, status: Arc<FunctionError>) -> Self {
        Self { video, assets, pointer, status }
    }

    pub fn video(&self) -> &Arc<Video> {
        &self.video
    }

    /// The outcome of the most recent call.
    pub fn function_error(&self) -> ErrorCode {
        self.status.get()
    }

    fn call<T>(&self, op: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.status.record(op, f())
    }

    fn on_state(&self) -> Result<MutexGuard<'_, VideoState>> {
        let state = self.video.state();
        if state.on {
            Ok(state)
        } else {
            Err(ErrorCode::NotInitialized)
        }
    }

    fn submit(&self, grid: PixelGrid, x: i32, y: i32, ink: Ink, xor: bool, clip: ClipRect) {
        let layer = Layer::new(grid, x, y, ink, xor);
        self.video.pipeline.submit(Feature::plain(layer, clip));
    }

    // lifecycle

    pub fn cold_start(&self) -> Result<()> {
        self.call("cold_start", || {
            let mut state = self.video.state();
            if state.on {
                return Err(ErrorCode::AlreadyOn);
            }
            reset_tables(&mut state);
            self.video.pipeline.purge();
            self.video.pipeline.clear_memory();
            state.on = true;
            info!("graphics output cold started at {} columns", state.width.columns());
            Ok(())
        })
    }

    pub fn warm_start(&self) -> Result<()> {
        self.call("warm_start", || {
            let mut state = self.video.state();
            if state.on {
                return Err(ErrorCode::AlreadyOn);
            }
            self.video.pipeline.purge();
            self.video.pipeline.clear_memory();
            state.on = true;
            info!("graphics output warm started");
            Ok(())
        })
    }

    pub fn off(&self) -> Result<()> {
        self.call("off", || {
            self.video.state().on = false;
            Ok(())
        })
    }

    pub fn reinit(&self) -> Result<()> {
        self.call("reinit", || {
            let mut state = self.on_state()?;
            reset_tables(&mut state);
            self.video.pipeline.purge();
            self.video.pipeline.clear_memory();
            Ok(())
        })
    }

    pub fn is_on(&self) -> bool {
        self.video.state().on
    }

    // border and colour lookup table

    pub fn set_border_colour(&self, colour: i32) -> Result<()> {
        self.call("set_border_colour", || {
            in_range(colour, 0, 15)?;
            self.video.state().border = colour as u8;
            Ok(())
        })
    }

    pub fn border_colour(&self) -> Result<u8> {
        self.call("border_colour", || Ok(self.video.state().border))
    }

    pub fn set_clt_element(&self, element: i32, first: i32, flash: i32, second: i32) -> Result<()> {
        self.call("set_clt_element", || {
            let mut state = self.video.state();
            in_range(element, 0, state.width.max_colour())?;
            state.clt[element as usize] = CltElement::from_parts(first, flash, second)?;
            Ok(())
        })
    }

    pub fn clt_element(&self, element: i32) -> Result<CltElement> {
        self.call("clt_element", || {
            let state = self.video.state();
            in_range(element, 0, state.width.max_colour())?;
            Ok(state.clt[element as usize])
        })
    }

    /// The whole table as (first, flash, second) triples.
    pub fn clt_contents(&self) -> Result<Vec<i32>> {
        self.call("clt_contents", || {
            Ok(self
                .video
                .state()
                .clt
                .iter()
                .flat_map(|e| [e.first as i32, e.flash.as_i32(), e.second as i32])
                .collect())
        })
    }

    pub fn set_new_clt(&self, table: &[i32]) -> Result<()> {
        self.call("set_new_clt", || {
            let mut state = self.video.state();
            check(table.len() == state.width.logical_colours() * 3)?;
            let clt = table
                .chunks_exact(3)
                .map(|t| CltElement::from_parts(t[0], t[1], t[2]))
                .collect::<Result<Vec<_>>>()?;
            state.clt = clt;
            Ok(())
        })
    }

    // clipping areas

    pub fn set_clipping_area(&self, id: i32, min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Result<()> {
        self.call("set_clipping_area", || {
            let mut state = self.on_state()?;
            let width = state.width;
            let mut table = state.clipping.clone();
            table.define(id, ClipRect::new(min_x, min_y, max_x, max_y), width)?;
            self.video.pipeline.drain_barrier();
            state.clipping = table;
            Ok(())
        })
    }

    pub fn clipping_area(&self, id: i32) -> Result<ClipRect> {
        self.call("clipping_area", || self.on_state()?.clipping.rect(id))
    }

    pub fn set_current_clipping_area(&self, id: i32) -> Result<()> {
        self.call("set_current_clipping_area", || {
            let mut state = self.on_state()?;
            in_range(id, 0, 9)?;
            self.video.pipeline.drain_barrier();
            state.clipping.select(id)
        })
    }

    pub fn current_clipping_area(&self) -> Result<usize> {
        self.call("current_clipping_area", || Ok(self.on_state()?.clipping.current))
    }

    // patterns

    pub fn set_dither_pattern(&self, id: i32, pattern: [[i32; 4]; 4]) -> Result<()> {
        self.call("set_dither_pattern", || {
            let mut state = self.on_state()?;
            in_range(id, PRESET_DITHERS as i32, DITHER_SLOTS as i32 - 1)?;
            let max = state.width.max_colour();
            check(pattern.iter().flatten().all(|&c| (0..=max).contains(&c)))?;
            state.patterns.set_dither(id as usize, pattern.map(|row| row.map(|c| c as u8)));
            Ok(())
        })
    }

    pub fn dither_pattern(&self, id: i32) -> Result<[[i32; 4]; 4]> {
        self.call("dither_pattern", || {
            let state = self.on_state()?;
            in_range(id, 0, DITHER_SLOTS as i32 - 1)?;
            Ok(state.patterns.dithers[id as usize].map(|row| row.map(i32::from)))
        })
    }

    pub fn set_hatching_pattern(&self, id: i32, pattern: [[i32; 16]; 16]) -> Result<()> {
        self.call("set_hatching_pattern", || {
            let mut state = self.on_state()?;
            in_range(id, 0, HATCHING_SLOTS as i32 - 1)?;
            check(pattern.iter().flatten().all(|&c| c == 0 || c == 1))?;
            state.patterns.set_hatching(id as usize, pattern.map(|row| row.map(|c| c as u8)));
            Ok(())
        })
    }

    pub fn hatching_pattern(&self, id: i32) -> Result<[[i32; 16]; 16]> {
        self.call("hatching_pattern", || {
            let state = self.on_state()?;
            in_range(id, 0, HATCHING_SLOTS as i32 - 1)?;
            Ok(state.patterns.hatchings[id as usize].map(|row| row.map(i32::from)))
        })
    }

    // drawing

    /// Draws connected line segments. Style 0 takes its colours from the
    /// dither named in `style_data[0]` (XOR when `colour1` is 256); style 6
    /// takes a 16-entry on/off mask in `style_data`.
    pub fn poly_line(
        &self,
        style: i32,
        style_data: &[i32],
        colour1: i32,
        colour2: i32,
        transparency: i32,
        points: &[(i32, i32)],
    ) -> Result<()> {
        self.call("poly_line", || {
            let mut state = self.on_state()?;
            let width = state.width;
            in_range(style, 0, 6)?;
            check(!points.is_empty())?;
            if style == 0 {
                check(style_data.len() == 1)?;
                in_range(style_data[0], 0, DITHER_SLOTS as i32 - 1)?;
            }
            if style == USER_LINE_STYLE as i32 {
                check(style_data.len() == 16 && style_data.iter().all(|&b| b == 0 || b == 1))?;
            }
            in_range(transparency, 0, 1)?;
            let (primary, xor) = if style == 0 {
                check_dither_colour(width, colour1)?
            } else {
                width.check_xor_colour(colour1)?
            };
            let secondary = width.check_colour(colour2)?;

            let paint = if style == 0 {
                LinePaint::Dither(style_data[0] as usize)
            } else {
                if style == USER_LINE_STYLE as i32 {
                    for (slot, &bit) in state.patterns.line_styles[USER_LINE_STYLE].iter_mut().zip(style_data) {
                        *slot = bit as u8;
                    }
                }
                LinePaint::Styled {
                    mask: state.patterns.line_styles[style as usize],
                    primary,
                    secondary: (transparency == 0).then_some(secondary),
                }
            };
            if let Some((grid, x, y)) = polyline(points, &state.patterns, &paint) {
                self.submit(grid, x, y, Ink::Explicit, xor, state.clipping.current_rect());
            }
            Ok(())
        })
    }

    /// Fills a polygon. Style 0 is hollow, 1 solid, 2 dithered and 3 hatched.
    pub fn fill_area(
        &self,
        style: i32,
        style_index: i32,
        colour1: i32,
        colour2: i32,
        transparency: i32,
        points: &[(i32, i32)],
    ) -> Result<()> {
        self.call("fill_area", || {
            let state = self.on_state()?;
            let width = state.width;
            check(!points.is_empty())?;
            check_fill_style(style, style_index, 0)?;
            in_range(transparency, 0, 1)?;
            let (primary, xor) = if style == 2 {
                check_dither_colour(width, colour1)?
            } else {
                width.check_xor_colour(colour1)?
            };
            let secondary = width.check_colour(colour2)?;

            let clip = state.clipping.current_rect();
            if style == 0 {
                if let Some((grid, x, y)) = polyline(&close(points), &state.patterns, &LinePaint::solid(primary)) {
                    self.submit(grid, x, y, Ink::Explicit, xor, clip);
                }
                return Ok(());
            }
            let paint = fill_paint(style, style_index, primary, secondary, transparency);
            if let Some((grid, x, y)) = polygon(points, &state.patterns, &paint) {
                self.submit(grid, x, y, Ink::Explicit, xor, clip);
            }
            Ok(())
        })
    }

    /// Floods outwards from (x, y). Boundary specification 0 spreads over
    /// the seed's colour, 1 spreads until `boundary_colour`.
    #[allow(clippy::too_many_arguments)]
    pub fn flood_fill_area(
        &self,
        style: i32,
        style_index: i32,
        colour1: i32,
        colour2: i32,
        transparency: i32,
        boundary_spec: i32,
        boundary_colour: i32,
        x: i32,
        y: i32,
    ) -> Result<()> {
        self.call("flood_fill_area", || {
            let state = self.on_state()?;
            let width = state.width;
            check_fill_style(style, style_index, 0)?;
            in_range(transparency, 0, 1)?;
            let (primary, xor) = if style == 2 {
                check_dither_colour(width, colour1)?
            } else {
                width.check_xor_colour(colour1)?
            };
            let secondary = width.check_colour(colour2)?;
            in_range(boundary_spec, 0, 1)?;
            let boundary = width.check_colour(boundary_colour)?;
            check(ClipRect::screen(width).contains(x, y))?;

            let clip = state.clipping.current_rect();
            let rule = if boundary_spec == 1 { FloodRule::UntilColour(boundary) } else { FloodRule::SeedColour };
            let area = FloodBounds {
                min_x: clip.min_x.max(0),
                min_y: clip.min_y.max(0),
                max_x: clip.max_x.min(width.max_x()),
                max_y: clip.max_y.min(SCREEN_HEIGHT as i32 - 1),
            };

            self.video.pipeline.drain_barrier();
            let snapshot = self.video.pipeline.snapshot();
            let filled = flood((x, y), area, rule, |px, py| snapshot.get(px, py));
            let Some(place) = bounds(&filled).and_then(Placement::new) else {
                return Ok(());
            };

            let paint = fill_paint(style, style_index, primary, secondary, transparency);
            let mut grid = PixelGrid::transparent(place.width, place.height);
            let top = place.max_y();
            for (px, py) in filled {
                let (col, row) = place.pattern_position(px - place.x, top - py);
                grid.plot(px - place.x, py - place.y, paint.colour_at(&state.patterns, col, row));
            }
            self.submit(grid, place.x, place.y, Ink::Explicit, xor, clip);
            Ok(())
        })
    }

    /// Draws a marker centred on each point. Style 6 uses `shape`, a vector
    /// list with pen-up and end sentinels.
    pub fn poly_marker(
        &self,
        style: i32,
        size_x: i32,
        size_y: i32,
        colour: i32,
        shape: &[(i32, i32)],
        points: &[(i32, i32)],
    ) -> Result<()> {
        self.call("poly_marker", || {
            let state = self.on_state()?;
            in_range(style, 1, MARKER_STYLES as i32 + 1)?;
            in_range(size_x, 1, MAX_MAGNIFICATION)?;
            in_range(size_y, 1, MAX_MAGNIFICATION)?;
            let (colour, xor) = state.width.check_xor_colour(colour)?;

            if style == 6 {
                let vector = |&(x, y): &(i32, i32)| (-MARKER_REACH..=MARKER_REACH).contains(&x) && (-MARKER_REACH..=MARKER_REACH).contains(&y);
                check(shape.iter().take_while(|&&p| p != MARKER_END).all(|p| *p == PEN_UP || vector(p)))?;
            }
            let shape: &[(i32, i32)] = if style == 6 { shape } else { &state.patterns.markers[style as usize - 1] };
            let strokes = shape.iter().take_while(|&&p| p != MARKER_END);
            let (reach_x, reach_y) = strokes
                .clone()
                .filter(|&&p| p != PEN_UP)
                .fold((0, 0), |(rx, ry), &(x, y)| (rx.max(x.abs()), ry.max(y.abs())));
            let width = (size_x * 2 * reach_x + 1) as usize;
            let height = (size_y * 2 * reach_y + 1) as usize;
            let (cx, cy) = (width as i32 / 2, height as i32 / 2);

            let mut grid = PixelGrid::transparent(width, height);
            let paint = LinePaint::solid(colour);
            let mut pen: Option<(i32, i32)> = None;
            for &p in strokes {
                if p == PEN_UP {
                    pen = None;
                    continue;
                }
                let to = (cx + size_x * p.0, cy + size_y * p.1);
                if let Some(from) = pen {
                    draw_segment(&mut grid, &state.patterns, &paint, from, to);
                }
                pen = Some(to);
            }

            let clip = state.clipping.current_rect();
            for &(x, y) in points {
                self.submit(grid.clone(), x.saturating_sub(cx), y.saturating_sub(cy), Ink::Explicit, xor, clip);
            }
            Ok(())
        })
    }

    /// Plots text with its bottom-left at (x, y), magnified and turned
    /// anticlockwise `orientation` quarter turns.
    #[allow(clippy::too_many_arguments)]
    pub fn plot_character_string(
        &self,
        orientation: i32,
        y_mag: i32,
        x_mag: i32,
        colour: i32,
        font: i32,
        text: &str,
        x: i32,
        y: i32,
    ) -> Result<()> {
        self.call("plot_character_string", || {
            let state = self.on_state()?;
            in_range(y_mag, 1, MAX_MAGNIFICATION)?;
            in_range(x_mag, 1, MAX_MAGNIFICATION)?;
            in_range(font, 0, 1)?;
            in_range(orientation, 0, 3)?;
            let (colour, xor) = state.width.check_xor_colour(colour)?;

            let codes: Vec<u8> = text.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect();
            if codes.is_empty() {
                return Ok(());
            }
            let mut grid = PixelGrid::new(codes.len() * GLYPH_WIDTH, GLYPH_HEIGHT, 0);
            for (i, &code) in codes.iter().enumerate() {
                let glyph = self.assets.glyph(font as u8, code);
                for (row, bits) in glyph.iter().enumerate() {
                    for (col, &bit) in bits.iter().enumerate() {
                        grid.set(i * GLYPH_WIDTH + col, row, bit as i16);
                    }
                }
            }
            let grid = grid
                .resize(grid.width * x_mag as usize, grid.height * y_mag as usize)
                .rotate_ccw_times(orientation as u8);

            let run = (codes.len() as i32 - 1).saturating_mul(GLYPH_WIDTH as i32);
            let (x, y) = match orientation {
                2 => (x.saturating_sub(run.saturating_mul(x_mag)), y),
                3 => (x, y.saturating_sub(run.saturating_mul(y_mag))),
                _ => (x, y),
            };
            self.submit(grid, x, y, Ink::Mono(colour), xor, state.clipping.current_rect());
            Ok(())
        })
    }

    fn sprite_layer(&self, state: &VideoState, sprite: &Sprite, x: i32, y: i32, pose: i32, xor: bool, clip_id: i32) -> Result<(Layer, ClipRect)> {
        check(pose >= 0 && (pose as usize) < sprite.poses.len())?;
        check(sprite.poses.len() <= state.width.max_sprite_poses())?;
        let clip = state.clipping.rect(clip_id)?;
        let grid = sprite.poses[pose as usize].clone();
        Ok((Layer::new(grid, x.saturating_sub(sprite.hotspot.0), y.saturating_sub(sprite.hotspot.1), Ink::Explicit, xor), clip))
    }

    /// Draws a sprite, remembering what it covers in `save_table`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_sprite(&self, sprite: &Sprite, save_table: &SaveTable, x: i32, y: i32, pose: i32, xor: bool, clip_id: i32) -> Result<()> {
        self.call("draw_sprite", || {
            let state = self.on_state()?;
            let (layer, clip) = self.sprite_layer(&state, sprite, x, y, pose, xor, clip_id)?;
            let save_table = save_table.clone();
            self.video.pipeline.submit(Feature::Sprite { layer, clip, save_table, action: SpriteAction::Draw });
            Ok(())
        })
    }

    /// Restores what the sprite last covered, then draws it at (x, y).
    #[allow(clippy::too_many_arguments)]
    pub fn move_sprite(&self, sprite: &Sprite, save_table: &SaveTable, x: i32, y: i32, pose: i32, xor: bool, clip_id: i32) -> Result<()> {
        self.call("move_sprite", || {
            let state = self.on_state()?;
            let (layer, clip) = self.sprite_layer(&state, sprite, x, y, pose, xor, clip_id)?;
            let save_table = save_table.clone();
            self.video.pipeline.submit(Feature::Sprite { layer, clip, save_table, action: SpriteAction::Move });
            Ok(())
        })
    }

    pub fn erase_sprite(&self, save_table: &SaveTable) -> Result<()> {
        self.call("erase_sprite", || {
            self.on_state()?;
            self.video.pipeline.submit(Feature::SpriteErase { save_table: save_table.clone() });
            Ok(())
        })
    }

    pub fn plonk_logo(&self, x: i32, y: i32) -> Result<()> {
        self.call("plonk_logo", || {
            let state = self.on_state()?;
            if let Some(logo) = self.assets.logo() {
                self.submit(logo, x, y, Ink::Explicit, false, state.clipping.current_rect());
            }
            Ok(())
        })
    }

    /// Pie slice or, with equal bearings, a disc. Bearings are thousandths
    /// of a radian clockwise from straight up. `radius` is vertical; high
    /// resolution doubles the slice horizontally.
    pub fn pie_slice(&self, x_centre: i32, y_centre: i32, radius: i32, theta1: i32, theta2: i32, colour: i32) -> Result<()> {
        self.call("pie_slice", || {
            let state = self.on_state()?;
            in_range(radius, 0, SCREEN_HEIGHT as i32)?;
            in_range(theta1, 0, FULL_TURN)?;
            in_range(theta2, 0, FULL_TURN)?;
            let (colour, xor) = state.width.check_xor_colour(colour)?;

            let grid = pie_slice(radius, theta1, theta2);
            let (grid, x) = match state.width {
                ScreenWidth::High => (grid.resize(grid.width * 2, grid.height), x_centre.saturating_sub(2 * radius)),
                ScreenWidth::Low => (grid, x_centre.saturating_sub(radius)),
            };
            self.submit(grid, x, y_centre.saturating_sub(radius), Ink::Mono(colour), xor, state.clipping.current_rect());
            Ok(())
        })
    }

    pub fn arc_of_ellipse(&self) -> Result<()> {
        self.call("arc_of_ellipse", || Err(ErrorCode::FunctionNotImplemented))
    }

    pub fn get_display_line(&self) -> Result<()> {
        self.call("get_display_line", || Err(ErrorCode::FunctionNotImplemented))
    }

    pub fn read_to_limit(&self) -> Result<()> {
        self.call("read_to_limit", || Err(ErrorCode::FunctionNotImplemented))
    }

    // pixels

    pub fn read_pixel(&self, x: i32, y: i32) -> Result<u8> {
        self.call("read_pixel", || {
            let state = self.on_state()?;
            check(ClipRect::screen(state.width).contains(x, y))?;
            drop(state);
            self.video.pipeline.drain_barrier();
            Ok(self.video.pipeline.read(|memory| memory.get(x, y)))
        })
    }

    /// Captures a rectangle of memory, top row first.
    pub fn read_area_pixel(&self, x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Result<PixelGrid> {
        self.call("read_area_pixel", || {
            let state = self.on_state()?;
            let screen = ClipRect::screen(state.width);
            check(screen.contains(x_min, y_min) && screen.contains(x_max, y_max))?;
            check(x_min <= x_max && y_min <= y_max)?;
            drop(state);
            self.video.pipeline.drain_barrier();
            let mut grid = PixelGrid::transparent((x_max - x_min + 1) as usize, (y_max - y_min + 1) as usize);
            self.video.pipeline.read(|memory| {
                for y in y_min..=y_max {
                    for x in x_min..=x_max {
                        grid.plot(x - x_min, y - y_min, memory.get(x, y) as i16);
                    }
                }
            });
            Ok(grid)
        })
    }

    /// Writes a captured rectangle back with its bottom-left at (x_min,
    /// y_min). Cells of `ignore_colour` are left alone; -1 ignores nothing.
    pub fn write_area_pixel(&self, grid: &PixelGrid, x_min: i32, y_min: i32, xor: bool, ignore_colour: i32) -> Result<()> {
        self.call("write_area_pixel", || {
            let state = self.on_state()?;
            let max = state.width.max_colour() as i16;
            check(grid.cells.iter().all(|&c| (TRANSPARENT..=max).contains(&c)))?;
            check(ignore_colour == -1 || state.width.check_colour(ignore_colour).is_ok())?;

            let mut grid = grid.clone();
            if ignore_colour >= 0 {
                grid.cells.iter_mut().filter(|c| **c == ignore_colour as i16).for_each(|c| *c = TRANSPARENT);
            }
            self.video.pipeline.drain_barrier();
            self.submit(grid, x_min, y_min, Ink::Explicit, xor, state.clipping.current_rect());
            Ok(())
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_area_pixel(&self, x_min: i32, y_min: i32, x_max: i32, y_max: i32, dest_x: i32, dest_y: i32, xor: bool) -> Result<()> {
        let grid = self.read_area_pixel(x_min, y_min, x_max, y_max)?;
        self.write_area_pixel(&grid, dest_x, dest_y, xor, -1)
    }

    // input

    pub fn enquire_position_and_button_status(&self) -> PointerStatus {
        self.status.set(ErrorCode::Ok);
        self.pointer.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::BuiltinAssets;

    fn output(width: ScreenWidth) -> GraphicsOutput {
        let video = Arc::new(Video::new(width));
        let g = GraphicsOutput::new(video, Arc::new(BuiltinAssets), Pointer::default(), Arc::new(FunctionError::default()));
        g.cold_start().unwrap();
        g
    }

    fn pixel(g: &GraphicsOutput, x: i32, y: i32) -> u8 {
        g.read_pixel(x, y).unwrap()
    }

    #[test]
    fn test_not_initialized_until_started() {
        let video = Arc::new(Video::new(ScreenWidth::High));
        let g = GraphicsOutput::new(video, Arc::new(BuiltinAssets), Pointer::default(), Arc::new(FunctionError::default()));
        assert_eq!(g.read_pixel(0, 0), Err(ErrorCode::NotInitialized));
        assert_eq!(g.function_error(), ErrorCode::NotInitialized);
        assert_eq!(g.set_border_colour(4), Ok(()));
        assert_eq!(g.set_clt_element(1, 2, 0, 0), Ok(()));
        assert_eq!(g.function_error(), ErrorCode::Ok);
        g.cold_start().unwrap();
        assert_eq!(g.cold_start(), Err(ErrorCode::AlreadyOn));
        assert_eq!(g.clt_element(1), Ok(CltElement::from_parts(7, 0, 0).unwrap()));
        g.off().unwrap();
        assert_eq!(g.reinit(), Err(ErrorCode::NotInitialized));
        assert_eq!(g.warm_start(), Ok(()));
    }

    #[test]
    fn test_clt_round_trip_for_every_colour() {
        for width in [ScreenWidth::Low, ScreenWidth::High] {
            let g = output(width);
            for c in 0..=width.max_colour() {
                g.set_clt_element(c, (c + 3) % 16, c % 3, 15 - c).unwrap();
                let e = g.clt_element(c).unwrap();
                assert_eq!((e.first as i32, e.flash.as_i32(), e.second as i32), ((c + 3) % 16, c % 3, 15 - c));
            }
            assert_eq!(g.clt_element(width.max_colour() + 1), Err(ErrorCode::InvalidParameter));
        }
    }

    #[test]
    fn test_whole_clt_replace() {
        let g = output(ScreenWidth::High);
        let table = vec![1, 0, 0, 2, 1, 3, 4, 2, 5, 6, 0, 0];
        g.set_new_clt(&table).unwrap();
        assert_eq!(g.clt_contents().unwrap(), table);
        assert_eq!(g.set_new_clt(&table[..9]), Err(ErrorCode::InvalidParameter));
        assert_eq!(g.clt_contents().unwrap(), table);
    }

    #[test]
    fn test_invalid_parameters_have_no_effect() {
        let g = output(ScreenWidth::High);
        assert_eq!(g.poly_line(1, &[], 4, 0, 0, &[(0, 0), (10, 0)]), Err(ErrorCode::InvalidParameter));
        assert_eq!(g.poly_line(7, &[], 1, 0, 0, &[(0, 0), (10, 0)]), Err(ErrorCode::InvalidParameter));
        assert_eq!(g.poly_line(0, &[16], 1, 0, 0, &[(0, 0)]), Err(ErrorCode::InvalidParameter));
        assert_eq!(g.fill_area(3, 6, 1, 0, 0, &[(0, 0), (5, 0), (5, 5)]), Err(ErrorCode::InvalidParameter));
        assert_eq!(g.video().pipeline.queue_len(), 0);
        assert_eq!(pixel(&g, 5, 0), 0);
    }

    #[test]
    fn test_solid_line_and_xor_line() {
        let g = output(ScreenWidth::High);
        g.poly_line(1, &[], 2, 0, 0, &[(10, 10), (20, 10), (20, 15)]).unwrap();
        assert_eq!(pixel(&g, 15, 10), 2);
        assert_eq!(pixel(&g, 20, 13), 2);
        g.poly_line(1, &[], 256 + 3, 0, 0, &[(10, 10), (20, 10)]).unwrap();
        assert_eq!(pixel(&g, 15, 10), 1);
    }

    #[test]
    fn test_user_line_style() {
        let g = output(ScreenWidth::Low);
        let mask = [1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0];
        g.poly_line(6, &mask, 9, 4, 0, &[(0, 0), (7, 0)]).unwrap();
        let row: Vec<u8> = (0..8).map(|x| pixel(&g, x, 0)).collect();
        assert_eq!(row, vec![9, 9, 4, 4, 9, 9, 4, 4]);
    }

    #[test]
    fn test_solid_rectangle_fill_count() {
        let g = output(ScreenWidth::High);
        let (x1, y1, x2, y2) = (30, 40, 60, 55);
        g.fill_area(1, 0, 3, 0, 0, &[(x1, y1), (x2, y1), (x2, y2), (x1, y2)]).unwrap();
        let area = g.read_area_pixel(x1 - 1, y1 - 1, x2 + 1, y2 + 1).unwrap();
        let filled = area.cells.iter().filter(|&&c| c == 3).count();
        assert_eq!(filled as i32, (x2 - x1 + 1) * (y2 - y1 + 1));
        assert_eq!(pixel(&g, x1 - 1, y1), 0);
    }

    #[test]
    fn test_hollow_fill_draws_outline_only() {
        let g = output(ScreenWidth::High);
        g.fill_area(0, 0, 1, 0, 0, &[(10, 10), (20, 10), (20, 20), (10, 20)]).unwrap();
        assert_eq!(pixel(&g, 10, 15), 1);
        assert_eq!(pixel(&g, 15, 20), 1);
        assert_eq!(pixel(&g, 15, 15), 0);
    }

    #[test]
    fn test_flood_fill_respects_boundary() {
        let g = output(ScreenWidth::High);
        g.fill_area(0, 0, 2, 0, 0, &[(10, 10), (30, 10), (30, 30), (10, 30)]).unwrap();
        g.flood_fill_area(1, 0, 3, 0, 0, 1, 2, 20, 20).unwrap();
        assert_eq!(pixel(&g, 11, 11), 3);
        assert_eq!(pixel(&g, 29, 29), 3);
        assert_eq!(pixel(&g, 10, 20), 2);
        assert_eq!(pixel(&g, 9, 20), 0);
        assert_eq!(pixel(&g, 31, 31), 0);
    }

    #[test]
    fn test_clipping_area_limits_drawing() {
        let g = output(ScreenWidth::High);
        g.set_clipping_area(2, 0, 0, 9, 249).unwrap();
        g.set_current_clipping_area(2).unwrap();
        assert_eq!(g.current_clipping_area(), Ok(2));
        g.poly_line(1, &[], 1, 0, 0, &[(0, 5), (20, 5)]).unwrap();
        assert_eq!(pixel(&g, 9, 5), 1);
        assert_eq!(pixel(&g, 10, 5), 0);
        assert_eq!(g.set_clipping_area(0, 0, 0, 9, 9), Err(ErrorCode::InvalidParameter));
        assert_eq!(g.clipping_area(2), Ok(ClipRect::new(0, 0, 9, 249)));
    }

    #[test]
    fn test_plot_string_and_marker() {
        let g = output(ScreenWidth::High);
        g.plot_character_string(0, 1, 1, 3, 0, "H", 100, 100).unwrap();
        let cell = g.read_area_pixel(100, 100, 107, 109).unwrap();
        assert!(cell.cells.iter().any(|&c| c == 3));
        assert!(cell.cells.iter().all(|&c| c == 0 || c == 3));

        g.poly_marker(1, 2, 2, 2, &[], &[(50, 50)]).unwrap();
        assert_eq!(pixel(&g, 50, 50), 2);
        assert_eq!(pixel(&g, 46, 50), 2);
        assert_eq!(pixel(&g, 50, 54), 2);
        assert_eq!(pixel(&g, 52, 52), 0);
    }

    #[test]
    fn test_pie_slice_high_res_is_stretched() {
        let g = output(ScreenWidth::High);
        g.pie_slice(100, 100, 10, 0, 0, 1).unwrap();
        assert_eq!(pixel(&g, 100, 100), 1);
        assert_eq!(pixel(&g, 81, 100), 1);
        assert_eq!(pixel(&g, 118, 100), 1);
        assert_eq!(pixel(&g, 100, 110), 1);
        assert_eq!(pixel(&g, 100, 112), 0);
        assert_eq!(g.pie_slice(100, 100, 10, 0, 7000, 1), Err(ErrorCode::InvalidParameter));
    }

    #[test]
    fn test_area_copy_with_ignored_colour() {
        let g = output(ScreenWidth::High);
        g.poly_line(1, &[], 2, 0, 0, &[(0, 0), (3, 0)]).unwrap();
        g.poly_line(1, &[], 1, 0, 0, &[(0, 1), (3, 1)]).unwrap();
        let area = g.read_area_pixel(0, 0, 3, 1).unwrap();
        assert_eq!(area.get(0, 0), 1);
        assert_eq!(area.get(0, 1), 2);
        g.poly_line(1, &[], 3, 0, 0, &[(10, 0), (13, 1)]).unwrap();
        g.write_area_pixel(&area, 10, 0, false, 1).unwrap();
        assert_eq!(pixel(&g, 10, 0), 2);
        assert_eq!(pixel(&g, 13, 1), 3);
        g.copy_area_pixel(0, 0, 3, 1, 20, 20, false).unwrap();
        assert_eq!(pixel(&g, 20, 21), 1);
    }

    #[test]
    fn test_stubs_report_not_implemented() {
        let g = output(ScreenWidth::High);
        assert_eq!(g.arc_of_ellipse(), Err(ErrorCode::FunctionNotImplemented));
        assert_eq!(g.function_error(), ErrorCode::FunctionNotImplemented);
        assert_eq!(g.read_to_limit(), Err(ErrorCode::FunctionNotImplemented));
    }

    #[test]
    fn test_pattern_get_set() {
        let g = output(ScreenWidth::High);
        let pattern = [[0, 1, 2, 3]; 4];
        assert_eq!(g.set_dither_pattern(3, pattern), Err(ErrorCode::InvalidParameter));
        assert_eq!(g.set_dither_pattern(8, [[4; 4]; 4]), Err(ErrorCode::InvalidParameter));
        g.set_dither_pattern(8, pattern).unwrap();
        assert_eq!(g.dither_pattern(8), Ok(pattern));
        let mut hatch = [[0; 16]; 16];
        hatch[3][3] = 1;
        g.set_hatching_pattern(5, hatch).unwrap();
        assert_eq!(g.hatching_pattern(5), Ok(hatch));
        hatch[0][0] = 2;
        assert_eq!(g.set_hatching_pattern(5, hatch), Err(ErrorCode::InvalidParameter));
    }

    #[test]
    fn test_extreme_line_and_fill_are_clipped() {
        let g = output(ScreenWidth::High);
        g.poly_line(1, &[], 1, 0, 0, &[(-2_000_000_000, 0), (2_000_000_000, 0)]).unwrap();
        assert_eq!(pixel(&g, 0, 0), 1);
        assert_eq!(pixel(&g, 639, 0), 1);
        assert_eq!(pixel(&g, 0, 1), 0);

        g.fill_area(1, 0, 2, 0, 0, &[(-2_000_000_000, 10), (2_000_000_000, 10), (0, 100)]).unwrap();
        assert_eq!(pixel(&g, 0, 10), 2);
        assert_eq!(pixel(&g, 639, 10), 2);
        assert_eq!(pixel(&g, 320, 60), 2);
        assert_eq!(pixel(&g, 320, 101), 0);
        assert_eq!(g.function_error(), ErrorCode::Ok);
    }

    #[test]
    fn test_off_screen_drawing_leaves_memory_alone() {
        let g = output(ScreenWidth::High);
        let before = g.read_area_pixel(0, 0, 639, 249).unwrap();
        g.poly_line(1, &[], 1, 0, 0, &[(i32::MIN, i32::MIN), (i32::MIN + 10, -5)]).unwrap();
        g.fill_area(1, 0, 1, 0, 0, &[(700, 10), (i32::MAX, 10), (i32::MAX, 500)]).unwrap();
        g.poly_marker(1, 2, 2, 3, &[], &[(i32::MAX, i32::MIN)]).unwrap();
        g.plot_character_string(2, 50, 50, 1, 0, "overflow", i32::MIN, i32::MAX).unwrap();
        g.pie_slice(i32::MIN, i32::MIN, 10, 0, 0, 1).unwrap();

        let sprite = Sprite::new(vec![PixelGrid::new(4, 4, 2)]).with_hotspot(-3, 3);
        let saved = SaveTable::new();
        g.draw_sprite(&sprite, &saved, i32::MAX, i32::MIN, 0, false, 0).unwrap();
        g.erase_sprite(&saved).unwrap();
        g.write_area_pixel(&PixelGrid::new(3, 3, 1), i32::MAX - 1, i32::MAX - 1, false, -1).unwrap();

        assert_eq!(g.read_area_pixel(0, 0, 639, 249).unwrap(), before);
        assert_eq!(g.function_error(), ErrorCode::Ok);
    }

    #[test]
    fn test_out_of_range_seed_and_marker_vectors_are_rejected() {
        let g = output(ScreenWidth::High);
        assert_eq!(g.flood_fill_area(1, 0, 3, 0, 0, 0, 0, i32::MAX, i32::MIN), Err(ErrorCode::InvalidParameter));
        assert_eq!(g.function_error(), ErrorCode::InvalidParameter);
        let far = [(0, 0), (1000, 0), MARKER_END];
        assert_eq!(g.poly_marker(6, 1, 1, 1, &far, &[(50, 50)]), Err(ErrorCode::InvalidParameter));
        let edge = [(0, 0), (127, 0), PEN_UP, (-127, -127), (0, 0), MARKER_END];
        g.poly_marker(6, 1, 1, 1, &edge, &[(200, 150)]).unwrap();
        assert_eq!(pixel(&g, 327, 150), 1);
        assert_eq!(pixel(&g, 73, 23), 1);
    }

    #[test]
    fn test_dither_xor_must_be_exactly_256() {
        let g = output(ScreenWidth::High);
        let square = [(10, 10), (20, 10), (20, 20), (10, 20)];
        for colour in 257..=259 {
            assert_eq!(g.poly_line(0, &[3], colour, 0, 0, &[(0, 0), (10, 0)]), Err(ErrorCode::InvalidParameter));
            assert_eq!(g.fill_area(2, 3, colour, 0, 0, &square), Err(ErrorCode::InvalidParameter));
            assert_eq!(g.flood_fill_area(2, 3, colour, 0, 0, 0, 0, 5, 5), Err(ErrorCode::InvalidParameter));
        }
        assert_eq!(g.video().pipeline.queue_len(), 0);

        g.fill_area(2, 3, 256, 0, 0, &square).unwrap();
        assert_eq!(pixel(&g, 15, 15), 1);
        g.fill_area(2, 3, 256, 0, 0, &square).unwrap();
        assert_eq!(pixel(&g, 15, 15), 0);
        g.poly_line(0, &[3], 256, 0, 0, &[(0, 0), (10, 0)]).unwrap();
        assert_eq!(pixel(&g, 4, 0), 1);
    }

    #[test]
    fn test_sprite_is_drawn_at_native_size() {
        let g = output(ScreenWidth::High);
        let sprite = Sprite::new(vec![PixelGrid::new(2, 2, 2)]).with_hotspot(1, 1);
        let saved = SaveTable::new();
        g.draw_sprite(&sprite, &saved, 10, 10, 0, false, 0).unwrap();
        assert_eq!(pixel(&g, 9, 9), 2);
        assert_eq!(pixel(&g, 10, 10), 2);
        assert_eq!(pixel(&g, 11, 10), 0);
        assert_eq!(saved.len(), 4);
        g.erase_sprite(&saved).unwrap();
        assert_eq!(pixel(&g, 9, 9), 0);
    }

    #[test]
    fn test_dither_fill_is_anchored_to_bounding_box() {
        let g = output(ScreenWidth::High);
        let pattern = [[0, 1, 2, 3], [1, 2, 3, 0], [2, 3, 0, 1], [3, 0, 1, 2]];
        g.set_dither_pattern(8, pattern).unwrap();
        let (x0, y0, x1, y1) = (101, 50, 110, 58);
        g.fill_area(2, 8, 0, 0, 0, &[(x0, y0), (x1, y0), (x1, y1), (x0, y1)]).unwrap();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let expected = pattern[((y1 - y) % 4) as usize][((x - x0) % 4) as usize];
                assert_eq!(pixel(&g, x, y) as i32, expected, "({}, {})", x, y);
            }
        }
        assert_eq!(pixel(&g, x0 - 1, y0), 0);
    }
}
