use crate::patterns::PatternTables;
use crate::raster::line::trace;
use crate::raster::{bounds, FillPaint, PixelGrid, Placement, TRANSPARENT};

/// Marks outline cells while the fill is being corrected.
const OUTLINE: i16 = -255;

/// Closes a polygon by repeating its first vertex when needed.
pub fn close(points: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let mut closed = points.to_vec();
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last {
            closed.push(first);
        }
    }
    closed
}

/// Cells of `place` whose centre lies inside the polygon under the
/// non-zero winding rule. `edges` are closed API coordinates; `inside`
/// receives local coordinates.
fn scan_interior(edges: &[(i32, i32)], place: &Placement, mut inside: impl FnMut(i32, i32)) {
    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for y in 0..place.height as i32 {
        let scan = (place.y + y) as i64;
        crossings.clear();
        for pair in edges.windows(2) {
            let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
            let (ay, by) = (ay as i64, by as i64);
            let winding = if ay <= scan && by > scan {
                1
            } else if by <= scan && ay > scan {
                -1
            } else {
                continue;
            };
            let t = (scan - ay) as f64 / (by - ay) as f64;
            let x = ax as f64 + t * (bx as f64 - ax as f64) - place.x as f64;
            crossings.push((x, winding));
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        for i in 0..crossings.len() {
            winding += crossings[i].1;
            if winding == 0 || i + 1 == crossings.len() {
                continue;
            }
            let start = crossings[i].0.ceil().max(0.0) as i32;
            let end = (crossings[i + 1].0.ceil().min(place.width as f64)) as i32;
            for x in start..end {
                inside(x, y);
            }
        }
    }
}

fn stroke(grid: &mut PixelGrid, edges: &[(i32, i32)], place: &Placement, mut colour: impl FnMut(i32, i32) -> i16) {
    for pair in edges.windows(2) {
        let Some((from, to, _)) = place.clip_segment(pair[0], pair[1]) else { continue };
        for (x, y) in trace(from.0, from.1, to.0, to.1) {
            if grid.contains_xy(x, y) {
                let row = grid.row_of(y) as i32;
                grid.plot(x, y, colour(x, row));
            }
        }
    }
}

/// Fixes single-pixel disagreements between the scanned interior and the
/// stroked outline by looking at the orthogonal neighbours of each cell.
fn correct_edges(grid: &mut PixelGrid, fill_colour: impl Fn(i32, i32) -> i16) {
    if grid.width < 3 || grid.height < 3 {
        return;
    }
    for row in 1..grid.height - 1 {
        for col in 1..grid.width - 1 {
            let f = fill_colour(col as i32, row as i32);
            let neighbours = [
                (grid.get(col - 1, row), grid.get(col + 1, row)),
                (grid.get(col + 1, row), grid.get(col - 1, row)),
                (grid.get(col, row - 1), grid.get(col, row + 1)),
                (grid.get(col, row + 1), grid.get(col, row - 1)),
            ];
            for (near, far) in neighbours {
                let centre = grid.get(col, row);
                if near == OUTLINE && centre == TRANSPARENT && far == f {
                    grid.set(col, row, f);
                } else if near == TRANSPARENT && centre == f && far == OUTLINE {
                    grid.set(col, row, TRANSPARENT);
                }
            }
        }
    }
}

/// Rasterizes a filled polygon. Returns the grid and the API position of
/// its bottom-left corner, or `None` when none of it can be seen. Pattern
/// colours are anchored to the polygon's whole bounding box even when the
/// grid only covers the visible part of it.
pub fn polygon(points: &[(i32, i32)], patterns: &PatternTables, paint: &FillPaint) -> Option<(PixelGrid, i32, i32)> {
    let place = Placement::new(bounds(points)?)?;
    let edges = close(points);
    let fill_colour = |col: i32, row: i32| {
        let (col, row) = place.pattern_position(col, row);
        paint.colour_at(patterns, col, row)
    };

    let mut grid = PixelGrid::transparent(place.width, place.height);
    let top = place.height as i32 - 1;
    scan_interior(&edges, &place, |x, y| grid.plot(x, y, fill_colour(x, top - y)));

    stroke(&mut grid, &edges, &place, |_, _| OUTLINE);
    correct_edges(&mut grid, fill_colour);
    stroke(&mut grid, &edges, &place, fill_colour);

    Some((grid, place.x, place.y))
}
