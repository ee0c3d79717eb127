//! Color representations and process-wide conversion tables.

pub mod lut;
pub mod rgb;

pub use lut::{from_linear, ipt, oklab, to_linear};
pub use rgb::{alpha, blue, green, red, rgba, shrink, shrink_channels, stretch, RGB555_SIZE};
