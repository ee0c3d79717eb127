//! flipbook: animated GIF and indexed PNG encoding.
//!
//! The heavy lifting (palette quantization, the 32K nearest-color map,
//! and the nineteen ditherers) lives in the `indexed-dither` crate; this
//! crate owns the outward-facing pieces: the [`Pixmap`] container, the
//! streaming [`GifEncoder`], the GIF89a bitstream and LZW writers, and
//! the indexed PNG sibling.
//!
//! # Encoding an animation
//!
//! ```
//! use flipbook::{GifEncoder, Pixmap};
//!
//! let frames = vec![
//!     Pixmap::filled(32, 32, 0xFF0000FF),
//!     Pixmap::filled(32, 32, 0x0000FFFF),
//! ];
//! let mut encoder = GifEncoder::new();
//! let bytes = encoder.write(Vec::new(), &frames, 10.0).unwrap();
//! assert!(bytes.starts_with(b"GIF89a"));
//! assert_eq!(*bytes.last().unwrap(), 0x3B);
//! ```
//!
//! Errors follow a best-effort policy: state misuse drops the offending
//! frame, sink failures abort the stream and return the encoder to idle,
//! and degenerate sizes or unusable palettes fall back with a logged
//! warning instead of failing.

pub mod error;
pub mod gif;
pub mod indexed_png;
pub mod pixmap;

pub use error::EncodeError;
pub use gif::GifEncoder;
pub use pixmap::Pixmap;

// The quantization/dithering core, re-exported for callers that tune it.
pub use indexed_dither::{ColorDifference, DitherAlgorithm, DitherOptions, Palette};
