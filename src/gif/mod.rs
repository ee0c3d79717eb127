//! Animated GIF production.
//!
//! [`GifEncoder`] drives the whole pipeline: per-frame palette selection,
//! dithering through `indexed-dither`, and emission of the GIF89a block
//! sequence with LZW-compressed pixel data.

pub mod encoder;
pub mod lzw;
pub mod stream;

pub use encoder::GifEncoder;
