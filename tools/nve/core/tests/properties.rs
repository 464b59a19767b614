use std::sync::Arc;
use std::thread;

use nve_core::charset::BuiltinAssets;
use nve_core::inputs::{PointerStatus, BUTTON_LEFT, BUTTON_RIGHT};
use nve_core::raster::PixelGrid;
use nve_core::video::feature::{ClipRect, Feature, Ink, Layer};
use nve_core::video::sprite::{SaveTable, Sprite};
use nve_core::{Config, ErrorCode, Subbios};

fn subbios() -> Subbios {
    Subbios::new(Config::default(), Arc::new(BuiltinAssets))
}

fn memory_bytes(subbios: &Subbios) -> Vec<u8> {
    subbios.video.pipeline.drain_barrier();
    subbios.video.pipeline.snapshot().as_bytes().to_vec()
}

/// Scatters some colour about so restores have something to get wrong.
fn busy_background(subbios: &Subbios) {
    let g = &subbios.graphics;
    for i in 0..20 {
        g.poly_line(1, &[], i % 4, 0, 0, &[(i * 7, 0), (i * 3 + 40, 120), (300 - i, 200)]).unwrap();
    }
}

#[test]
fn test_clt_round_trip_in_both_widths() {
    let mut s = subbios();
    for mode in ["\x1b[2h", "\x1b[0h"] {
        s.console.print(mode);
        let max = s.video.width().max_colour();
        for c in 0..=max {
            let written = (15 - c, c % 3, c);
            s.graphics.set_clt_element(c, written.0, written.1, written.2).unwrap();
            let e = s.graphics.clt_element(c).unwrap();
            assert_eq!((e.first as i32, e.flash.as_i32(), e.second as i32), written, "element {}", c);
        }
    }
}

#[test]
fn test_transparent_feature_changes_nothing() {
    let s = subbios();
    busy_background(&s);
    let before = memory_bytes(&s);
    let layer = Layer::new(PixelGrid::transparent(120, 80), 10, 10, Ink::Explicit, false);
    s.video.pipeline.submit(Feature::plain(layer, ClipRect::memory()));
    assert_eq!(memory_bytes(&s), before);
}

#[test]
fn test_xor_twice_is_identity() {
    let s = subbios();
    busy_background(&s);
    let before = memory_bytes(&s);
    let triangle = [(30, 30), (200, 60), (90, 180)];
    for _ in 0..2 {
        s.graphics.fill_area(1, 0, 256 + 3, 0, 0, &triangle).unwrap();
        s.graphics.poly_line(1, &[], 256 + 2, 0, 0, &[(0, 0), (639, 249)]).unwrap();
    }
    assert_eq!(memory_bytes(&s), before);
}

#[test]
fn test_barrier_sees_everything_submitted_before_it() {
    let s = subbios();
    for colour in [1, 2, 3, 1, 2] {
        s.graphics.poly_line(1, &[], colour, 0, 0, &[(5, 5), (50, 5)]).unwrap();
    }
    s.video.pipeline.drain_barrier();
    assert_eq!(s.video.pipeline.queue_len(), 0);
    assert_eq!(s.video.pipeline.read(|m| m.get(20, 5)), 2);
}

#[test]
fn test_flood_fill_stays_inside_boundary() {
    let s = subbios();
    let g = &s.graphics;
    let (x1, y1, x2, y2) = (100, 50, 180, 120);
    g.fill_area(0, 0, 2, 0, 0, &[(x1, y1), (x2, y1), (x2, y2), (x1, y2)]).unwrap();
    g.flood_fill_area(1, 0, 3, 0, 0, 1, 2, 140, 80).unwrap();

    let area = g.read_area_pixel(0, 0, 639, 249).unwrap();
    let painted = area.cells.iter().filter(|&&c| c == 3).count();
    assert_eq!(painted as i32, (x2 - x1 - 1) * (y2 - y1 - 1));
    assert_eq!(g.read_pixel(x1, 80), Ok(2));
    assert_eq!(g.read_pixel(x1 - 1, 80), Ok(0));
}

#[test]
fn test_seed_colour_flood_fills_region() {
    let s = subbios();
    let g = &s.graphics;
    g.fill_area(1, 0, 1, 0, 0, &[(10, 10), (30, 10), (30, 30), (10, 30)]).unwrap();
    g.flood_fill_area(1, 0, 2, 0, 0, 0, 0, 20, 20).unwrap();
    assert_eq!(g.read_pixel(20, 20), Ok(2));
    assert_eq!(g.read_pixel(10, 10), Ok(2));
    assert_eq!(g.read_pixel(31, 31), Ok(0));
}

#[test]
fn test_solid_rectangle_fills_exact_area() {
    let s = subbios();
    let g = &s.graphics;
    for (x1, y1, x2, y2) in [(0, 0, 9, 9), (50, 20, 51, 120), (300, 100, 420, 101)] {
        g.fill_area(1, 0, 1, 0, 0, &[(x1, y1), (x2, y1), (x2, y2), (x1, y2)]).unwrap();
        let area = g.read_area_pixel(x1, y1, x2, y2).unwrap();
        assert!(area.cells.iter().all(|&c| c == 1), "gap in {:?}", (x1, y1, x2, y2));
        g.fill_area(1, 0, 0, 0, 0, &[(x1, y1), (x2, y1), (x2, y2), (x1, y2)]).unwrap();
    }
}

#[test]
fn test_sprite_round_trip_restores_background() {
    let s = subbios();
    busy_background(&s);
    let before = memory_bytes(&s);

    let pose = PixelGrid::from_rows(&[[3i16, -1, 3, 3], [-1, 2, 2, -1], [1, 1, -1, 1]]);
    let sprite = Sprite::new(vec![pose.clone(), pose]).with_hotspot(1, 1);
    let table = SaveTable::new();
    let g = &s.graphics;
    g.draw_sprite(&sprite, &table, 40, 40, 0, false, 0).unwrap();
    for step in 1..10 {
        g.move_sprite(&sprite, &table, 40 + step, 40 + step / 2, step % 2, false, 0).unwrap();
    }
    g.erase_sprite(&table).unwrap();
    assert_eq!(memory_bytes(&s), before);
    assert!(table.is_empty());
}

#[test]
fn test_sprite_validation() {
    let s = subbios();
    let grid = PixelGrid::new(2, 2, 1);
    let sprite = Sprite::new(vec![grid.clone(), grid.clone(), grid]);
    let table = SaveTable::new();
    assert_eq!(s.graphics.draw_sprite(&sprite, &table, 0, 0, 0, false, 0), Err(ErrorCode::InvalidParameter));
    let sprite = Sprite::new(vec![PixelGrid::new(2, 2, 1)]);
    assert_eq!(s.graphics.draw_sprite(&sprite, &table, 0, 0, 1, false, 0), Err(ErrorCode::InvalidParameter));
    assert_eq!(s.graphics.draw_sprite(&sprite, &table, 0, 0, 0, false, 10), Err(ErrorCode::InvalidParameter));
    assert_eq!(s.video.pipeline.queue_len(), 0);
}

#[test]
fn test_console_wraps_without_losing_characters() {
    let mut s = subbios();
    s.console.print("\x1b[1;1;5;10~B");
    s.console.print("abcdefghijklm");
    assert_eq!(s.console.cursor_position(), (2, 4));
    let g = &s.graphics;
    let second_row = g.read_area_pixel(0, 230, 23, 239).unwrap();
    assert!(second_row.cells.iter().any(|&c| c == 1));

    s.console.print("\x1b[7l\x1b[2J");
    s.console.print("abcdefghijklmnop");
    assert_eq!(s.console.cursor_position(), (1, 10));
}

#[test]
fn test_hello_in_wide_mode() {
    let mut s = subbios();
    s.console.print("\x1b[2h\x1b[2J");
    let (row, col) = s.console.cursor_position();
    s.console.print("HELLO");
    assert_eq!(s.console.cursor_position(), (row, col + 5));
}

#[test]
fn test_triangle_scenario() {
    let s = subbios();
    let g = &s.graphics;
    g.fill_area(1, 0, 3, 0, 0, &[(10, 10), (10, 50), (50, 10)]).unwrap();
    for (x, y) in [(11, 11), (20, 20), (12, 45), (45, 12), (29, 29)] {
        assert_eq!(g.read_pixel(x, y), Ok(3), "inside at ({}, {})", x, y);
    }
    for (x, y) in [(0, 0), (45, 45), (9, 30), (60, 10)] {
        assert_eq!(g.read_pixel(x, y), Ok(0), "outside at ({}, {})", x, y);
    }
}

#[test]
fn test_concurrent_lines_drain_cleanly() {
    let s = subbios();
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let g = s.graphics.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let y = worker * 25 + i;
                    g.poly_line(1, &[], 1 + worker % 3, 0, 0, &[(0, y), (300, y)]).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    s.video.pipeline.drain_barrier();
    assert_eq!(s.video.pipeline.queue_len(), 0);
    for y in 0..100 {
        assert_ne!(s.graphics.read_pixel(150, y), Ok(0), "line {} missing", y);
    }
}

#[test]
fn test_pointer_status_follows_host() {
    let mut s = subbios();
    let input = s.take_input().unwrap();
    assert_eq!(s.graphics.enquire_position_and_button_status(), PointerStatus::default());
    input.set_pointer(700, -5, BUTTON_LEFT | BUTTON_RIGHT);
    assert_eq!(
        s.graphics.enquire_position_and_button_status(),
        PointerStatus { x: 639, y: 0, buttons: 3 }
    );
    s.graphics.off().unwrap();
    input.set_pointer(10, 20, BUTTON_RIGHT);
    assert_eq!(s.graphics.enquire_position_and_button_status(), PointerStatus { x: 10, y: 20, buttons: 1 });
    assert_eq!(s.graphics.function_error(), ErrorCode::Ok);
}
