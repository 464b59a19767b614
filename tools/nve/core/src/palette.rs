use crate::error::{ErrorCode, Result};

pub const SCREEN_HEIGHT: usize = 250;
pub const MEMORY_WIDTH: usize = 640;
pub const PHYSICAL_COLOURS: usize = 16;

/// RGB values of the sixteen physical colours. Bit 0 is green, bit 1 blue,
/// bit 2 red and bit 3 intensity.
pub const PHYSICAL_PALETTE: [[u8; 3]; PHYSICAL_COLOURS] = [
    [0x00, 0x00, 0x00], // black
    [0x00, 0xAA, 0x00], // dark green
    [0x00, 0x00, 0xAA], // dark blue
    [0x00, 0xAA, 0xAA], // dark cyan
    [0xAA, 0x00, 0x00], // dark red
    [0xAA, 0x55, 0x00], // brown
    [0xAA, 0x00, 0xAA], // purple
    [0xAA, 0xAA, 0xAA], // light grey
    [0x55, 0x55, 0x55], // dark grey
    [0x55, 0xFF, 0x55], // light green
    [0x55, 0x55, 0xFF], // light blue
    [0x55, 0xFF, 0xFF], // light cyan
    [0xFF, 0x55, 0x55], // light red
    [0xFF, 0xFF, 0x55], // yellow
    [0xFF, 0x55, 0xFF], // light purple
    [0xFF, 0xFF, 0xFF], // white
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScreenWidth {
    /// 40 columns, 320 pixels, 16 logical colours.
    Low,
    /// 80 columns, 640 pixels, 4 logical colours.
    High,
}

impl ScreenWidth {
    pub fn from_columns(columns: i32) -> Option<Self> {
        match columns {
            40 => Some(ScreenWidth::Low),
            80 => Some(ScreenWidth::High),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn columns(self) -> i32 {
        match self {
            ScreenWidth::Low => 40,
            ScreenWidth::High => 80,
        }
    }

    #[inline(always)]
    pub fn pixel_width(self) -> i32 {
        self.columns() * 8
    }

    #[inline(always)]
    pub fn max_x(self) -> i32 {
        self.pixel_width() - 1
    }

    #[inline(always)]
    pub fn max_colour(self) -> i32 {
        match self {
            ScreenWidth::Low => 15,
            ScreenWidth::High => 3,
        }
    }

    #[inline(always)]
    pub fn logical_colours(self) -> usize {
        self.max_colour() as usize + 1
    }

    #[inline(always)]
    pub fn max_sprite_poses(self) -> usize {
        match self {
            ScreenWidth::Low => 4,
            ScreenWidth::High => 2,
        }
    }

    /// Checks a plain logical colour against this width.
    pub fn check_colour(self, colour: i32) -> Result<u8> {
        if (0..=self.max_colour()).contains(&colour) {
            Ok(colour as u8)
        } else {
            Err(ErrorCode::InvalidParameter)
        }
    }

    /// Splits a colour argument into the logical colour and the XOR flag.
    /// Values from 256 upwards select XOR writing of `colour - 256`.
    pub fn check_xor_colour(self, colour: i32) -> Result<(u8, bool)> {
        if colour >= 256 {
            Ok((self.check_colour(colour - 256)?, true))
        } else {
            Ok((self.check_colour(colour)?, false))
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum FlashSpeed {
    #[default]
    Off,
    Slow,
    Fast,
}

impl FlashSpeed {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(FlashSpeed::Off),
            1 => Some(FlashSpeed::Slow),
            2 => Some(FlashSpeed::Fast),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            FlashSpeed::Off => 0,
            FlashSpeed::Slow => 1,
            FlashSpeed::Fast => 2,
        }
    }

    /// Whether the first physical colour shows during `phase` (0..=4).
    #[inline(always)]
    pub fn shows_first(self, phase: u8) -> bool {
        match self {
            FlashSpeed::Off => true,
            FlashSpeed::Slow => phase < 2,
            FlashSpeed::Fast => phase == 0 || phase == 2,
        }
    }
}

pub const FLASH_PHASES: u8 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct CltElement {
    pub first: u8,
    pub second: u8,
    pub flash: FlashSpeed,
}

impl CltElement {
    pub const fn new(first: u8, second: u8, flash: FlashSpeed) -> Self {
        Self { first, second, flash }
    }

    #[inline(always)]
    pub fn physical(&self, phase: u8) -> u8 {
        if self.flash.shows_first(phase) {
            self.first
        } else {
            self.second
        }
    }

    /// Validates a (first, flash, second) triple as supplied by callers.
    pub fn from_parts(first: i32, flash: i32, second: i32) -> Result<Self> {
        let physical = 0..PHYSICAL_COLOURS as i32;
        if !physical.contains(&first) || !physical.contains(&second) {
            return Err(ErrorCode::InvalidParameter);
        }
        let flash = FlashSpeed::from_i32(flash).ok_or(ErrorCode::InvalidParameter)?;
        Ok(Self::new(first as u8, second as u8, flash))
    }
}

const fn steady(first: u8) -> CltElement {
    CltElement::new(first, 0, FlashSpeed::Off)
}

pub const DEFAULT_LOW_RES_CLT: [CltElement; 16] = [
    steady(0), steady(2), steady(4), steady(6),
    steady(1), steady(3), steady(5), steady(7),
    steady(8), steady(10), steady(12), steady(14),
    steady(9), steady(11), steady(13), steady(15),
];

pub const DEFAULT_HIGH_RES_CLT: [CltElement; 4] = [
    steady(0),
    steady(7),
    CltElement::new(15, 0, FlashSpeed::Slow),
    steady(15),
];

pub fn default_clt(width: ScreenWidth) -> Vec<CltElement> {
    match width {
        ScreenWidth::Low => DEFAULT_LOW_RES_CLT.to_vec(),
        ScreenWidth::High => DEFAULT_HIGH_RES_CLT.to_vec(),
    }
}

#[inline(always)]
pub fn rgba(physical: u8) -> [u8; 4] {
    let [r, g, b] = PHYSICAL_PALETTE[physical as usize & 0x0F];
    [r, g, b, 0xFF]
}
