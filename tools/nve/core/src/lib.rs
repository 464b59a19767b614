//! Software model of the RM Nimbus video and console subsystem.

pub mod charset;
pub mod console;
pub mod error;
pub mod graphics;
pub mod inputs;
pub mod palette;
pub mod patterns;
pub mod raster;
pub mod render;
pub mod subbios;
pub mod video;

pub use error::{ErrorCode, Result};
pub use subbios::{Config, Subbios};
