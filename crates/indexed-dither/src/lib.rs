//! indexed-dither: palette quantization and dithering for indexed output.
//!
//! This crate turns 24-bit-truecolor RGBA frames into palette indices. It
//! owns the two hard parts of that job:
//!
//! - **Quantization**: building a palette of up to 256 colors (supplied
//!   exactly, mined by frequency analysis, or median-cut) together with a
//!   32,768-entry RGB555 map that answers nearest-index queries in
//!   constant time, under a pluggable perceptual difference metric.
//! - **Dithering**: nineteen algorithms (ordered, blue-noise,
//!   error-diffusion, pattern) that choose indices so local averages
//!   track the source.
//!
//! # Quick Start
//!
//! ```
//! use indexed_dither::{DitherAlgorithm, DitherOptions, Palette};
//!
//! let mut palette = Palette::exact(&[0x000000FF, 0xFFFFFFFF]);
//! let pixels = vec![0x808080FFu32; 16];
//! let frame = palette.reduce(
//!     DitherAlgorithm::Overboard,
//!     &pixels,
//!     4,
//!     4,
//!     &DitherOptions::default(),
//! );
//! assert_eq!(frame.indices().len(), 16);
//! ```
//!
//! Pixels are `u32` words in `0xRRGGBBAA` order, row-major. Alpha only
//! matters at the 50% threshold: an analyzed source containing any
//! sub-threshold pixel reserves palette slot 0 for transparency.
//!
//! # Shared tables
//!
//! The gamma, Oklab, and IPT lookup tables and the triangular blue-noise
//! grids are process-wide, built once on first use. A `Palette` itself is
//! cheap to clone and not reentrant: its error-diffusion scratch rows are
//! reused across calls, so each thread should own its own palette.

pub mod color;
pub mod difference;
pub mod dither;
pub mod noise;
pub mod palette;


pub use difference::ColorDifference;
pub use dither::{DitherAlgorithm, DitherOptions, IndexedFrame};
pub use palette::{Palette, ALPHA_THRESHOLD, TRANSPARENT};
