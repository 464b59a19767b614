use core::f64::consts::PI;

use crate::raster::line::trace;
use crate::raster::PixelGrid;

/// Largest angle, in thousandths of a radian.
pub const FULL_TURN: i32 = 6283;

/// Points on the circle of `radius` around the origin, one octant mirrored
/// eight ways, each reported once in the order first reached.
pub fn midpoint_circle(radius: i32) -> Vec<(i32, i32)> {
    if radius < 0 {
        return Vec::new();
    }
    let side = (2 * radius + 1) as usize;
    let mut seen = vec![false; side * side];
    let mut points = Vec::new();
    let (mut x, mut y, mut d) = (radius, 0, 0);
    while x >= y {
        for (px, py) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
            let i = (py + radius) as usize * side + (px + radius) as usize;
            if !seen[i] {
                seen[i] = true;
                points.push((px, py));
            }
        }
        if d <= 0 {
            y += 1;
            d += 2 * y + 1;
        } else {
            x -= 1;
            d += 1 - 2 * x;
        }
    }
    points
}

/// Angle of (dx, dy) from the centre, clockwise from straight up, in
/// thousandths of a radian.
#[inline(always)]
pub fn bearing(dx: i32, dy: i32) -> i32 {
    ((f64::atan2(-dx as f64, -dy as f64) + PI) * 1000.0) as i32
}

fn selected(theta: i32, theta1: i32, theta2: i32) -> bool {
    if theta1 == theta2 {
        return true;
    }
    // straight up quantizes to a full turn
    let candidates = if theta >= FULL_TURN { [theta, 0] } else { [theta, theta] };
    candidates.iter().any(|&t| {
        if theta1 <= theta2 {
            t + 1 >= theta1 && t <= theta2 + 1
        } else {
            t + 1 >= theta1 || t <= theta2 + 1
        }
    })
}

/// A pie slice between two bearings as a 0/1 mask of side `2r + 1`,
/// centred on (r, r). Equal bearings give a whole disc.
pub fn pie_slice(radius: i32, theta1: i32, theta2: i32) -> PixelGrid {
    let side = (2 * radius + 1) as usize;
    let mut grid = PixelGrid::new(side, side, 0);
    grid.plot(radius, radius, 1);
    for (dx, dy) in midpoint_circle(radius) {
        if !selected(bearing(dx, dy), theta1, theta2) {
            continue;
        }
        for (x, y) in trace(radius, radius, radius + dx, radius + dy) {
            grid.plot(x, y, 1);
        }
    }
    grid
}
