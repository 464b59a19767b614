use core::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

/// Status codes reported by the graphics and console surfaces.
///
/// The numbering follows the legacy function-error word, so `Ok` is zero and
/// the remaining codes keep their historical order.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok = 0,
    TypeDoesntExist,
    DriverDoesntExist,
    FunctionNotImplemented,
    DiffSegs,
    Underflow,
    Overflow,
    NotANumber,
    NotInitialized,
    AlreadyOn,
    InvalidParameter,
}

pub type Result<T> = core::result::Result<T, ErrorCode>;

impl ErrorCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        use ErrorCode::*;
        Some(match value {
            0 => Ok,
            1 => TypeDoesntExist,
            2 => DriverDoesntExist,
            3 => FunctionNotImplemented,
            4 => DiffSegs,
            5 => Underflow,
            6 => Overflow,
            7 => NotANumber,
            8 => NotInitialized,
            9 => AlreadyOn,
            10 => InvalidParameter,
            _ => return None,
        })
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ErrorCode::Ok => "ok",
            ErrorCode::TypeDoesntExist => "type does not exist",
            ErrorCode::DriverDoesntExist => "driver does not exist",
            ErrorCode::FunctionNotImplemented => "function not implemented",
            ErrorCode::DiffSegs => "different segments",
            ErrorCode::Underflow => "underflow",
            ErrorCode::Overflow => "overflow",
            ErrorCode::NotANumber => "not a number",
            ErrorCode::NotInitialized => "graphics output not initialized",
            ErrorCode::AlreadyOn => "graphics output already on",
            ErrorCode::InvalidParameter => "invalid parameter",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for ErrorCode {}

/// The shared "last function error" word.
#[derive(Debug, Default)]
pub struct FunctionError(AtomicU8);

impl FunctionError {
    #[inline(always)]
    pub fn get(&self) -> ErrorCode {
        ErrorCode::from_u8(self.0.load(Ordering::Relaxed)).unwrap_or(ErrorCode::Ok)
    }

    #[inline(always)]
    pub fn set(&self, code: ErrorCode) {
        self.0.store(code as u8, Ordering::Relaxed);
    }

    /// Records the outcome of a call and hands the result back unchanged.
    pub fn record<T>(&self, op: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.set(ErrorCode::Ok),
            Err(code) => {
                log::debug!("{} failed: {}", op, code);
                self.set(*code);
            }
        }
        result
    }
}
