use crate::patterns::PatternTables;
use crate::raster::{bounds, LinePaint, PixelGrid, Placement, TRANSPARENT};

/// Every pixel on the line between two points, walked from the endpoint
/// with the smaller x (smaller y for vertical lines).
pub fn trace(x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<(i32, i32)> {
    let ((x1, y1), (x2, y2)) = if (x2, y2) < (x1, y1) { ((x2, y2), (x1, y1)) } else { ((x1, y1), (x2, y2)) };
    let dx = x2 - x1;
    let dy = y2 - y1;

    if dx == 0 && dy == 0 {
        return vec![(x1, y1)];
    }
    if dy == 0 {
        return (x1..=x2).map(|x| (x, y1)).collect();
    }
    if dx == 0 {
        return (y1..=y2).map(|y| (x1, y)).collect();
    }
    if dx == dy.abs() {
        let step = dy.signum();
        return (0..=dx).map(|i| (x1 + i, y1 + i * step)).collect();
    }

    let mut points = Vec::with_capacity(dx.max(dy.abs()) as usize + 1);
    let sy = dy.signum();
    let dy = -dy.abs();
    let mut err = dx + dy;
    let (mut x, mut y) = (x1, y1);
    loop {
        points.push((x, y));
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += 1;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

/// Draws one segment into `grid` using local coordinates. The style counter
/// restarts with every segment.
pub fn draw_segment(
    grid: &mut PixelGrid,
    patterns: &PatternTables,
    paint: &LinePaint,
    from: (i32, i32),
    to: (i32, i32),
) {
    draw_segment_at(grid, patterns, paint, from, to, 0, |col, row| (col, row));
}

fn draw_segment_at(
    grid: &mut PixelGrid,
    patterns: &PatternTables,
    paint: &LinePaint,
    from: (i32, i32),
    to: (i32, i32),
    phase: usize,
    pattern_position: impl Fn(i32, i32) -> (i32, i32),
) {
    for (counter, (x, y)) in trace(from.0, from.1, to.0, to.1).into_iter().enumerate() {
        if !grid.contains_xy(x, y) {
            continue;
        }
        let (col, row) = pattern_position(x, grid.row_of(y) as i32);
        let colour = paint.colour_at(patterns, (phase + counter) % 16, col, row);
        if colour != TRANSPARENT {
            grid.plot(x, y, colour);
        }
    }
}

/// Rasterizes a polyline. Returns the grid and the API position of its
/// bottom-left corner, or `None` when none of it can be seen. Segments are
/// clipped to the raster window first, so any coordinates are accepted.
pub fn polyline(points: &[(i32, i32)], patterns: &PatternTables, paint: &LinePaint) -> Option<(PixelGrid, i32, i32)> {
    let place = Placement::new(bounds(points)?)?;
    let mut grid = PixelGrid::transparent(place.width, place.height);
    let single = [points[0], points[0]];
    let segments = if points.len() == 1 { &single[..] } else { points };

    for pair in segments.windows(2) {
        let (a, b) = if pair[1] < pair[0] { (pair[1], pair[0]) } else { (pair[0], pair[1]) };
        if let Some((from, to, phase)) = place.clip_segment(a, b) {
            draw_segment_at(&mut grid, patterns, paint, from, to, phase, |col, row| place.pattern_position(col, row));
        }
    }
    Some((grid, place.x, place.y))
}
