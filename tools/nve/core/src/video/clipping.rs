use crate::error::{ErrorCode, Result};
use crate::palette::{ScreenWidth, SCREEN_HEIGHT};
use crate::video::feature::ClipRect;

pub const CLIPPING_AREAS: usize = 10;

/// Ten clipping rectangles; area 0 always covers the whole screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClippingTable {
    pub areas: [ClipRect; CLIPPING_AREAS],
    pub current: usize,
}

impl ClippingTable {
    pub fn new(width: ScreenWidth) -> Self {
        Self { areas: [ClipRect::screen(width); CLIPPING_AREAS], current: 0 }
    }

    pub fn reset(&mut self, width: ScreenWidth) {
        *self = Self::new(width);
    }

    #[inline(always)]
    pub fn current_rect(&self) -> ClipRect {
        self.areas[self.current]
    }

    pub fn rect(&self, id: i32) -> Result<ClipRect> {
        Self::check_id(id, 0)?;
        Ok(self.areas[id as usize])
    }

    pub fn define(&mut self, id: i32, rect: ClipRect, width: ScreenWidth) -> Result<()> {
        Self::check_id(id, 1)?;
        let valid = rect.min_x >= 0
            && rect.min_y >= 0
            && rect.min_x < rect.max_x
            && rect.min_y < rect.max_y
            && rect.max_x <= width.max_x()
            && rect.max_y < SCREEN_HEIGHT as i32;
        if !valid {
            return Err(ErrorCode::InvalidParameter);
        }
        self.areas[id as usize] = rect;
        Ok(())
    }

    pub fn select(&mut self, id: i32) -> Result<()> {
        Self::check_id(id, 0)?;
        self.current = id as usize;
        Ok(())
    }

    fn check_id(id: i32, lowest: i32) -> Result<()> {
        if (lowest..CLIPPING_AREAS as i32).contains(&id) {
            Ok(())
        } else {
            Err(ErrorCode::InvalidParameter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_zero_is_fixed() {
        let mut table = ClippingTable::new(ScreenWidth::High);
        let rect = ClipRect::new(10, 10, 20, 20);
        assert_eq!(table.define(0, rect, ScreenWidth::High), Err(ErrorCode::InvalidParameter));
        assert_eq!(table.define(3, rect, ScreenWidth::High), Ok(()));
        assert_eq!(table.rect(3), Ok(rect));
        assert_eq!(table.rect(0), Ok(ClipRect::new(0, 0, 639, 249)));
    }

    #[test]
    fn test_define_rejects_bad_rects() {
        let mut table = ClippingTable::new(ScreenWidth::Low);
        for rect in [
            ClipRect::new(5, 5, 5, 10),
            ClipRect::new(5, 10, 8, 2),
            ClipRect::new(-1, 0, 8, 8),
            ClipRect::new(0, 0, 320, 8),
            ClipRect::new(0, 0, 8, 250),
        ] {
            assert_eq!(table.define(1, rect, ScreenWidth::Low), Err(ErrorCode::InvalidParameter), "{:?}", rect);
        }
        assert_eq!(table.areas[1], ClipRect::screen(ScreenWidth::Low));
    }

    #[test]
    fn test_select_current() {
        let mut table = ClippingTable::new(ScreenWidth::High);
        assert_eq!(table.select(10), Err(ErrorCode::InvalidParameter));
        table.define(9, ClipRect::new(1, 2, 3, 4), ScreenWidth::High).unwrap();
        table.select(9).unwrap();
        assert_eq!(table.current_rect(), ClipRect::new(1, 2, 3, 4));
    }
}
