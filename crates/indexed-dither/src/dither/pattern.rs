//! Knoll pattern dithering.
//!
//! For every pixel, build a list of 16 candidate palette entries by
//! repeatedly quantizing the pixel plus its accumulated candidate error,
//! order the candidates by lightness, and pick the one selected by a 4x4
//! threshold matrix. Expensive (16 lookups per pixel) but produces the
//! smoothest static output of the family.

use super::{source_pixel, DitherOptions, IndexedFrame};
use crate::color::{alpha, blue, green, oklab, red, shrink};
use crate::palette::{Palette, ALPHA_THRESHOLD};

/// 4x4 dispersed-dot threshold matrix.
#[rustfmt::skip]
const THRESHOLD16: [usize; 16] = [
     0,  8,  2, 10,
    12,  4, 14,  6,
     3, 11,  1,  9,
    15,  7, 13,  5,
];

const CANDIDATES: usize = 16;

pub(super) fn reduce_knoll(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    let transparent = palette.has_transparent_slot();
    let s = palette.dither_strength() * 0.5;
    let mut frame = IndexedFrame::new(width, height);
    let mut candidates = [(0.0f32, 0u8); CANDIDATES];

    for y in 0..height {
        for x in 0..width {
            let px = source_pixel(pixels, width, height, x, y, opts.flip_y);
            if transparent && alpha(px) < ALPHA_THRESHOLD {
                frame.emit(0);
                continue;
            }
            let (r, g, b) = (red(px) as f32, green(px) as f32, blue(px) as f32);

            let (mut er, mut eg, mut eb) = (0.0f32, 0.0, 0.0);
            for slot in candidates.iter_mut() {
                let rr = (r + er * s).clamp(0.0, 255.0) as u8;
                let gg = (g + eg * s).clamp(0.0, 255.0) as u8;
                let bb = (b + eb * s).clamp(0.0, 255.0) as u8;
                let idx = palette.nearest_index(rr, gg, bb);
                let used = palette.colors()[idx as usize];
                *slot = (oklab(shrink(used))[0], idx);
                er += r - red(used) as f32;
                eg += g - green(used) as f32;
                eb += b - blue(used) as f32;
            }

            candidates.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
            frame.emit(candidates[THRESHOLD16[(x & 3) + ((y & 3) << 2)]].1);
        }
    }
    frame
}
