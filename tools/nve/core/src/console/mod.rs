//! The text console: a cursor-addressed grid of 8x10 cells drawn into the
//! same video memory as the graphics surface, driven by a character stream
//! with embedded escape sequences.

pub mod escape;

use std::sync::Arc;

use bitfield::bitfield;
use log::debug;

use crate::charset::{glyph_grid, AssetProvider, Glyph, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::inputs::{Keyboard, KEY_BACKSPACE, KEY_LEFT, KEY_OTHER, KEY_RIGHT};
use crate::palette::{CltElement, FlashSpeed, ScreenWidth, DEFAULT_HIGH_RES_CLT, DEFAULT_LOW_RES_CLT, MEMORY_WIDTH};
use crate::raster::PixelGrid;
use crate::video::feature::{Feature, Ink, Layer};
use crate::video::{CursorOverlay, Video};

use self::escape::{Action, EscapeParser, Sequence, UNSET};

pub const ROWS: i32 = 25;
const CELL_WIDTH: i32 = GLYPH_WIDTH as i32;
const CELL_HEIGHT: i32 = GLYPH_HEIGHT as i32;
const DEFAULT_CURSOR_CHAR: u8 = b'_';
const TAB_STOP: i32 = 4;

bitfield! {
    /// How text is written.
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct TextAttributes(u8);
    impl Debug;
    pub underlined, set_underlined: 0;
    pub xor_writing, set_xor_writing: 1;
    pub word_wrap, set_word_wrap: 2;
    pub print_controls, set_print_controls: 3;
    pub u8, charset, set_charset: 4, 4;
}

bitfield! {
    /// How the cursor looks.
    #[derive(Copy, Clone, PartialEq, Eq, Default)]
    pub struct CursorMode(u8);
    impl Debug;
    pub underlined, set_underlined: 0;
    pub flashing, set_flashing: 1;
    pub displayed, set_displayed: 2;
    pub u8, charset, set_charset: 3, 3;
}

/// A cell position relative to the scrolling area, 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellPos {
    pub row: i32,
    pub col: i32,
}

impl CellPos {
    pub const HOME: CellPos = CellPos { row: 1, col: 1 };
}

/// The scrolling area in absolute 1-based rows and columns, inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScrollingArea {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl ScrollingArea {
    pub fn full(width: ScreenWidth) -> Self {
        Self { top: 1, left: 1, bottom: ROWS, right: width.columns() }
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }
}

fn default_pen(width: ScreenWidth) -> u8 {
    match width {
        ScreenWidth::High => 1,
        ScreenWidth::Low => 7,
    }
}

fn char_code(c: char) -> u8 {
    u8::try_from(c).unwrap_or(b'?')
}

pub struct Console {
    video: Arc<Video>,
    assets: Arc<dyn AssetProvider>,
    keyboard: Keyboard,
    parser: EscapeParser,
    cursor: CellPos,
    saved_cursor: CellPos,
    area: ScrollingArea,
    pen: u8,
    paper: u8,
    attributes: TextAttributes,
    cursor_mode: CursorMode,
    cursor_char: u8,
    low_res_clt: [CltElement; 16],
    high_res_clt: [CltElement; 4],
}

impl Console {
    pub fn new(video: Arc<Video>, assets: Arc<dyn AssetProvider>, keyboard: Keyboard) -> Self {
        let width = video.width();
        let mut attributes = TextAttributes::default();
        attributes.set_word_wrap(true);
        let mut cursor_mode = CursorMode::default();
        cursor_mode.set_underlined(true);
        cursor_mode.set_flashing(true);
        cursor_mode.set_displayed(true);
        Self {
            video,
            assets,
            keyboard,
            parser: EscapeParser::new(),
            cursor: CellPos::HOME,
            saved_cursor: CellPos::HOME,
            area: ScrollingArea::full(width),
            pen: default_pen(width),
            paper: 0,
            attributes,
            cursor_mode,
            cursor_char: DEFAULT_CURSOR_CHAR,
            low_res_clt: DEFAULT_LOW_RES_CLT,
            high_res_clt: DEFAULT_HIGH_RES_CLT,
        }
    }

    pub fn attributes(&self) -> TextAttributes {
        self.attributes
    }

    pub fn cursor_mode(&self) -> CursorMode {
        self.cursor_mode
    }

    pub fn scrolling_area(&self) -> ScrollingArea {
        self.area
    }

    pub fn colours(&self) -> (u8, u8) {
        (self.pen, self.paper)
    }

    // stdio

    /// Writes a character stream. A sequence left open at the end of the
    /// stream is dropped.
    pub fn print(&mut self, text: &str) {
        for c in text.chars() {
            self.feed(c);
        }
        self.parser.finish();
        self.sync_cursor();
    }

    pub fn put_char(&mut self, c: char) {
        self.put_chars(&[c]);
    }

    pub fn put_chars(&mut self, chars: &[char]) {
        for &c in chars {
            self.feed(c);
        }
        self.parser.finish();
        self.sync_cursor();
    }

    /// Cursor (row, col) relative to the scrolling area.
    pub fn cursor_position(&self) -> (i32, i32) {
        (self.cursor.row, self.cursor.col)
    }

    /// Waits for a key.
    pub fn getchar(&mut self) -> char {
        loop {
            let key = self.keyboard.wait_key();
            if key != '\0' {
                return key;
            }
        }
    }

    pub fn getch(&mut self) -> Option<char> {
        self.keyboard.try_key()
    }

    pub fn keyboard_buffer_flush(&mut self) {
        let dropped = self.keyboard.flush();
        if dropped > 0 {
            debug!(target: "console", "flushed {} keys", dropped);
        }
    }

    /// Edits `buffer` in place from the cursor until enter is pressed. The
    /// buffer's current contents are echoed first.
    pub fn read_line(&mut self, buffer: &mut Vec<char>) {
        for &c in buffer.iter() {
            self.emit(c);
        }
        let mut index = buffer.len();
        self.sync_cursor();

        loop {
            match self.getchar() {
                '\n' => return,
                KEY_OTHER => {}
                KEY_LEFT => {
                    if index > 0 {
                        self.cursor_backward(1);
                        index -= 1;
                    }
                }
                KEY_RIGHT => {
                    if index < buffer.len() {
                        self.cursor_forward(1);
                        index += 1;
                    }
                }
                KEY_BACKSPACE => {
                    if index > 0 {
                        self.cursor_backward(1);
                        index -= 1;
                        buffer.remove(index);
                        self.redraw_tail(&buffer[index..], true);
                    }
                }
                key => {
                    buffer.insert(index, key);
                    self.emit(key);
                    index += 1;
                    self.redraw_tail(&buffer[index..], false);
                }
            }
            self.sync_cursor();
        }
    }

    /// Redraws `tail` from the cursor without moving it, optionally
    /// blanking the cell after it.
    fn redraw_tail(&mut self, tail: &[char], clear_after: bool) {
        let home = self.cursor;
        let last = CellPos { row: self.area.height(), col: self.area.width() };
        let mut blocked = false;
        for &c in tail {
            self.plonk(c);
            if self.cursor == last {
                blocked = true;
                break;
            }
            self.cursor_forward(1);
        }
        if clear_after && !blocked {
            self.blank_cell(self.attributes.xor_writing());
        }
        self.cursor = home;
    }

    // character stream

    fn feed(&mut self, c: char) {
        match self.parser.feed(c) {
            Some(Action::Print(c)) => self.emit(c),
            Some(Action::Tab) => self.tab(),
            Some(Action::NewLine) => {
                self.line_feed();
                self.carriage_return();
            }
            Some(Action::Sequence(sequence)) => self.execute(&sequence),
            None => {}
        }
    }

    /// Draws a character at the cursor and advances, scrolling when the
    /// cursor wraps off the bottom row.
    fn emit(&mut self, c: char) {
        let old_row = self.cursor.row;
        self.plonk(c);
        self.cursor_forward(1);
        if self.cursor.row == old_row && self.cursor.col == 1 {
            self.scroll_up(1);
        }
    }

    fn plonk(&self, c: char) {
        let code = match char_code(c) {
            code if code < 0x20 && !self.attributes.print_controls() => b' ',
            code => code,
        };
        let glyph = self.assets.glyph(self.attributes.charset(), code);
        let grid = glyph_grid(&glyph, self.pen as i16, self.paper as i16, self.attributes.underlined());
        self.put_cell(grid, self.cursor, self.attributes.xor_writing());
    }

    fn blank_cell(&self, xor: bool) {
        let grid = PixelGrid::new(GLYPH_WIDTH, GLYPH_HEIGHT, self.paper as i16);
        self.put_cell(grid, self.cursor, xor);
    }

    fn put_cell(&self, grid: PixelGrid, at: CellPos, xor: bool) {
        let (x, y) = self.cell_xy(at);
        self.video.pipeline.submit(Feature::ConsoleGlyph(Layer::new(grid, x, y, Ink::Explicit, xor)));
    }

    /// Bottom-left pixel of a cell.
    #[inline(always)]
    fn cell_xy(&self, at: CellPos) -> (i32, i32) {
        let row = at.row + self.area.top - 1;
        let col = at.col + self.area.left - 1;
        ((col - 1) * CELL_WIDTH, (ROWS - row) * CELL_HEIGHT)
    }

    /// Paints paper over rows `first..=last` and columns `left..=right` of
    /// the scrolling area.
    fn paint_paper(&self, first: i32, left: i32, last: i32, right: i32) {
        if first > last || left > right {
            return;
        }
        let width = ((right - left + 1) * CELL_WIDTH) as usize;
        let height = ((last - first + 1) * CELL_HEIGHT) as usize;
        let grid = PixelGrid::new(width, height, self.paper as i16);
        self.put_cell(grid, CellPos { row: last, col: left }, false);
    }

    fn line_feed(&mut self) {
        self.cursor.row += 1;
        if self.cursor.row > self.area.height() {
            self.scroll_up(1);
            self.cursor.row = self.area.height();
        }
    }

    fn carriage_return(&mut self) {
        self.cursor.col = 1;
    }

    fn tab(&mut self) {
        let col = self.cursor.col;
        let mut next = col + TAB_STOP - col % TAB_STOP;
        if next > self.area.width() {
            next = 1;
        }
        while self.cursor.col != next {
            self.blank_cell(self.attributes.xor_writing());
            let before = self.cursor;
            self.cursor_forward(1);
            if self.cursor == before {
                break;
            }
        }
    }

    fn scroll(&mut self, times: i32, up: bool) {
        let (x, bottom_y) = self.cell_xy(CellPos { row: self.area.height(), col: 1 });
        let width = (self.area.width() * CELL_WIDTH) as usize;
        let height = (self.area.height() * CELL_HEIGHT) as usize;
        let shift = CELL_HEIGHT as usize;

        for _ in 0..times.max(1) {
            self.video.pipeline.drain_barrier();
            let mut grid = PixelGrid::new(width, height, self.paper as i16);
            self.video.pipeline.read(|memory| {
                for row in 0..height {
                    let source = if up { row + shift } else { row.wrapping_sub(shift) };
                    if source >= height {
                        continue;
                    }
                    let y = bottom_y + (height - 1 - source) as i32;
                    for col in 0..width {
                        grid.set(col, row, memory.get(x + col as i32, y) as i16);
                    }
                }
            });
            self.video.pipeline.submit(Feature::ConsoleGlyph(Layer::new(grid, x, bottom_y, Ink::Explicit, false)));
        }
    }

    fn scroll_up(&mut self, times: i32) {
        self.scroll(times, true);
    }

    fn scroll_down(&mut self, times: i32) {
        self.scroll(times, false);
    }

    // escape sequences

    fn execute(&mut self, sequence: &Sequence) {
        let p = |i| sequence.param(i);
        debug!(target: "console", "escape {}{} {:?}", if sequence.tilde { "~" } else { "" }, sequence.letter, sequence.params);
        match (sequence.tilde, sequence.letter) {
            (false, 'H') => self.set_cursor_position(p(0), p(1)),
            (false, 's') => self.saved_cursor = self.cursor,
            (false, 'u') => self.cursor = self.saved_cursor,
            (true, 'B') => self.define_scrolling_area(p(0), p(1), p(2), p(3)),
            (true, 'E') => self.set_character_attributes(p(0), p(1), p(2)),
            (true, 'A') => self.set_cursor_mode(p(0), p(1), p(2), p(3), p(4)),
            (true, 'G') => self.cursor_mode.set_displayed(true),
            (true, 'F') => self.cursor_mode.set_displayed(false),
            (false, 'h') => self.set_mode(p(0)),
            (false, 'l') => self.reset_mode(p(0)),
            (false, 'm') => self.set_graphics_rendition(&sequence.params),
            (true, 'C') => self.set_clt(p(0), p(1), p(2), p(3), p(4)),
            (false, 'c') => self.reset_to_initial_state(),
            (false, 'C') => self.cursor_forward(p(0)),
            (false, 'D') => self.cursor_backward(p(0)),
            (false, 'A') => self.cursor_up(p(0)),
            (false, 'B') => self.cursor_down(p(0)),
            (false, 'S') => self.scroll_up(p(0)),
            (false, 'T') => self.scroll_down(p(0)),
            (false, 'J') => self.erase_in_display(p(0)),
            (false, 'K') => self.erase_in_line(p(0)),
            (true, 'D') => match p(0) {
                0 => self.attributes.set_print_controls(true),
                1 => self.attributes.set_print_controls(false),
                _ => {}
            },
            (tilde, letter) => debug!(target: "console", "unknown escape {}{}", if tilde { "~" } else { "" }, letter),
        }
    }

    pub fn cursor_forward(&mut self, n: i32) {
        let (height, width) = (self.area.height(), self.area.width());
        for _ in 0..n.max(1) {
            self.cursor.col += 1;
            if self.cursor.col > width {
                if self.attributes.word_wrap() {
                    self.cursor.col = 1;
                    self.cursor.row = (self.cursor.row + 1).min(height);
                } else {
                    self.cursor.col = width;
                }
            }
        }
    }

    /// Moves back, onto the end of the previous row at the left edge. The
    /// top row is never left.
    pub fn cursor_backward(&mut self, n: i32) {
        let width = self.area.width();
        for _ in 0..n.max(1) {
            self.cursor.col -= 1;
            if self.cursor.col < 1 {
                self.cursor.row -= 1;
                self.cursor.col = width;
            }
            self.cursor.row = self.cursor.row.max(1);
        }
    }

    pub fn cursor_up(&mut self, n: i32) {
        self.cursor.row = (self.cursor.row - n.max(1)).max(1);
    }

    pub fn cursor_down(&mut self, n: i32) {
        self.cursor.row = (self.cursor.row + n.max(1)).min(self.area.height());
    }

    /// Positions are relative to the scrolling area; an axis outside it
    /// falls back to 1.
    pub fn set_cursor_position(&mut self, row: i32, col: i32) {
        let row_ok = (1..=self.area.height()).contains(&row);
        let col_ok = (1..=self.area.width()).contains(&col);
        self.cursor = CellPos { row: if row_ok { row } else { 1 }, col: if col_ok { col } else { 1 } };
    }

    fn define_scrolling_area(&mut self, top: i32, left: i32, bottom: i32, right: i32) {
        let columns = self.video.width().columns();
        if top < 1 || top > bottom || bottom > ROWS || left < 1 || left > right || right > columns {
            return;
        }
        self.area = ScrollingArea { top, left, bottom, right };
        self.cursor = CellPos::HOME;
    }

    fn set_character_attributes(&mut self, underline: i32, charset: i32, xor: i32) {
        if let 0 | 1 = underline {
            self.attributes.set_underlined(underline == 1);
        }
        if let 0 | 1 = charset {
            self.attributes.set_charset(charset as u8);
        }
        if let 0 | 1 = xor {
            self.attributes.set_xor_writing(xor == 1);
        }
    }

    fn set_cursor_mode(&mut self, underline: i32, charset: i32, flashing: i32, character: i32, hidden: i32) {
        if let 0 | 1 = underline {
            self.cursor_mode.set_underlined(underline == 1);
        }
        if let 0 | 1 = charset {
            self.cursor_mode.set_charset(charset as u8);
        }
        if let 0 | 1 = flashing {
            self.cursor_mode.set_flashing(flashing == 1);
        }
        if let Ok(character) = u8::try_from(character) {
            self.cursor_char = character;
        }
        if let 0 | 1 = hidden {
            self.cursor_mode.set_displayed(hidden == 0);
        }
    }

    fn set_graphics_rendition(&mut self, params: &[i32]) {
        let width = self.video.width();
        let (pens, papers) = match width {
            ScreenWidth::High => (30..=33, 50..=53),
            ScreenWidth::Low => (30..=45, 50..=65),
        };
        for &p in params {
            match p {
                0 => {
                    self.attributes.set_underlined(false);
                    self.attributes.set_charset(0);
                    self.paper = 0;
                    self.pen = default_pen(width);
                }
                4 => self.attributes.set_underlined(true),
                10 => self.attributes.set_charset(0),
                11 => self.attributes.set_charset(1),
                24 => self.attributes.set_underlined(false),
                p if pens.contains(&p) => self.pen = (p - 30) as u8,
                p if papers.contains(&p) => self.paper = (p - 50) as u8,
                _ => {}
            }
        }
    }

    /// Sets one element of the console's table for `columns` and pushes the
    /// active table to the video.
    fn set_clt(&mut self, columns: i32, element: i32, first: i32, flash: i32, second: i32) {
        let Some(width) = ScreenWidth::from_columns(columns) else { return };
        let highest = width.max_colour();
        if !(0..=highest).contains(&element) || !(0..=highest).contains(&second) || !(0..=15).contains(&first) {
            return;
        }
        let Some(flash) = FlashSpeed::from_i32(flash) else { return };
        let entry = CltElement::new(first as u8, second as u8, flash);
        match width {
            ScreenWidth::Low => self.low_res_clt[element as usize] = entry,
            ScreenWidth::High => self.high_res_clt[element as usize] = entry,
        }
        self.sync_clt();
    }

    fn clt_for(&self, width: ScreenWidth) -> Vec<CltElement> {
        match width {
            ScreenWidth::Low => self.low_res_clt.to_vec(),
            ScreenWidth::High => self.high_res_clt.to_vec(),
        }
    }

    fn sync_clt(&self) {
        let mut state = self.video.state();
        state.clt = self.clt_for(state.width);
    }

    fn change_mode(&mut self, width: ScreenWidth) {
        self.video.change_width(width, self.clt_for(width));
        self.area = ScrollingArea::full(width);
        self.cursor = CellPos::HOME;
        if self.pen as i32 > width.max_colour() {
            self.pen = default_pen(width);
        }
        if self.paper as i32 > width.max_colour() {
            self.paper = 0;
        }
    }

    fn set_mode(&mut self, mode: i32) {
        match mode {
            0 => self.change_mode(ScreenWidth::Low),
            2 => self.change_mode(ScreenWidth::High),
            7 => self.attributes.set_word_wrap(true),
            _ => {}
        }
    }

    fn reset_mode(&mut self, mode: i32) {
        match mode {
            0 => self.change_mode(ScreenWidth::Low),
            2 => self.change_mode(ScreenWidth::High),
            7 => self.attributes.set_word_wrap(false),
            _ => {}
        }
    }

    /// Clears the screen and puts every console setting back to its
    /// power-on value in 80 columns.
    pub fn reset_to_initial_state(&mut self) {
        self.low_res_clt = DEFAULT_LOW_RES_CLT;
        self.high_res_clt = DEFAULT_HIGH_RES_CLT;
        self.change_mode(ScreenWidth::High);
        self.pen = default_pen(ScreenWidth::High);
        self.paper = 0;
        self.attributes = TextAttributes::default();
        self.attributes.set_word_wrap(true);
        self.cursor_mode = CursorMode::default();
        self.cursor_mode.set_underlined(true);
        self.cursor_mode.set_flashing(true);
        self.cursor_mode.set_displayed(true);
        self.cursor_char = DEFAULT_CURSOR_CHAR;
        self.saved_cursor = CellPos::HOME;
        self.parser = EscapeParser::new();
        self.keyboard.flush();
        self.sync_cursor();
    }

    fn erase_in_display(&mut self, mode: i32) {
        let (height, width) = (self.area.height(), self.area.width());
        let row = self.cursor.row;
        match mode {
            0 | UNSET => {
                self.erase_in_line(0);
                self.paint_paper(row + 1, 1, height, width);
            }
            1 => {
                self.erase_in_line(1);
                self.paint_paper(1, 1, row - 1, width);
            }
            2 => {
                self.paint_paper(1, 1, height, width);
                self.cursor = CellPos::HOME;
            }
            _ => {}
        }
    }

    fn erase_in_line(&mut self, mode: i32) {
        let CellPos { row, col } = self.cursor;
        let width = self.area.width();
        match mode {
            0 | UNSET => self.paint_paper(row, col, row, width),
            1 => self.paint_paper(row, 1, row, col),
            2 => self.paint_paper(row, 1, row, width),
            _ => {}
        }
    }

    /// Pushes the cursor's look and position to the video overlay.
    fn sync_cursor(&self) {
        let (x, y) = self.cell_xy(self.cursor);
        let visible = self.cursor_mode.displayed() && (0..MEMORY_WIDTH as i32).contains(&x) && y >= 0;
        let overlay = visible.then(|| {
            let mut glyph: Glyph = self.assets.glyph(self.cursor_mode.charset(), self.cursor_char);
            if self.cursor_mode.underlined() {
                glyph[GLYPH_HEIGHT - 2] = [1; GLYPH_WIDTH];
            }
            CursorOverlay { x, y, glyph, colour: self.pen, flashing: self.cursor_mode.flashing() }
        });
        self.video.set_cursor(overlay);
    }
}
