//! Indexed PNG output, the single-image sibling of the GIF encoder.
//!
//! Pixels go through the same palette/dither pipeline and come out as an
//! 8-bit indexed PNG: `PLTE` carries the palette triples and, when the
//! palette reserves slot 0 for transparency, a one-byte `tRNS` chunk
//! marks it fully transparent.

use std::io::Write;

use indexed_dither::color::{blue, green, red};
use indexed_dither::{DitherAlgorithm, DitherOptions, Palette};

use crate::error::EncodeError;
use crate::pixmap::Pixmap;

/// Write already-indexed pixels as an 8-bit indexed PNG.
pub fn write_indexed<W: Write>(
    sink: W,
    indices: &[u8],
    width: u32,
    height: u32,
    palette: &Palette,
) -> Result<(), EncodeError> {
    let mut encoder = png::Encoder::new(sink, width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);

    let triples: Vec<u8> = palette
        .colors()
        .iter()
        .flat_map(|&c| [red(c), green(c), blue(c)])
        .collect();
    encoder.set_palette(triples);
    if palette.has_transparent_slot() {
        encoder.set_trns(vec![0u8]);
    }

    let mut writer = encoder.write_header()?;
    writer.write_image_data(indices)?;
    Ok(())
}

/// Dither a pixmap against the palette and write it as an indexed PNG.
pub fn encode_pixmap<W: Write>(
    sink: W,
    image: &Pixmap,
    palette: &mut Palette,
    algorithm: DitherAlgorithm,
) -> Result<(), EncodeError> {
    let frame = palette.reduce(
        algorithm,
        image.pixels(),
        image.width(),
        image.height(),
        &DitherOptions::default(),
    );
    write_indexed(
        sink,
        frame.indices(),
        image.width() as u32,
        image.height() as u32,
        palette,
    )
}
