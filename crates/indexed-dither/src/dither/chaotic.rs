//! Chaotic noise dithering.
//!
//! A 64-bit mixed-congruential state walks over the frame, folding in the
//! RGB of every visited pixel, so the grain depends on pixel order and
//! content. Seeded from the frame sequence number so animation frames at
//! rest still shimmer instead of freezing into a static pattern.

use super::{source_pixel, DitherOptions, IndexedFrame};
use crate::color::{alpha, blue, green, red};
use crate::noise;
use crate::palette::{Palette, ALPHA_THRESHOLD};

const MUL: u64 = 0xD134_2543_DE82_EF95;
const INC: u64 = 0x91E1_0DA5_C79E_7B1D;

/// One LCG step followed by an xorshift output scramble, mapped to
/// [-1, 1).
#[inline]
fn draw(state: &mut u64) -> f32 {
    *state = state.wrapping_mul(MUL).wrapping_add(INC);
    let mut out = *state;
    out ^= out >> 29;
    out = out.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    ((out >> 40) as f32 / 8_388_608.0) - 1.0
}

pub(super) fn reduce_chaotic(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    let transparent = palette.has_transparent_slot();
    let s = palette.dither_strength() * (0.5 + palette.population_bias());
    let mut state = (opts.seq.wrapping_add(1)).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut frame = IndexedFrame::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let px = source_pixel(pixels, width, height, x, y, opts.flip_y);
            if transparent && alpha(px) < ALPHA_THRESHOLD {
                frame.emit(0);
                continue;
            }
            let (r, g, b) = (red(px), green(px), blue(px));

            // Cubed blue noise gates the white noise: most cells get a
            // whisper, the sparse extremes get the full distressed grain.
            let bn = noise::tri_a(x, y) as f32 / 127.0;
            let gain = bn * bn * bn * s * 64.0;

            let rr = super::ordered::add_clamped(r, gain * draw(&mut state));
            let gg = super::ordered::add_clamped(g, gain * draw(&mut state));
            let bb = super::ordered::add_clamped(b, gain * draw(&mut state));
            frame.emit(palette.nearest_index(rr, gg, bb));

            state ^= ((r as u64) << 16) | ((g as u64) << 8) | b as u64;
            state = state.rotate_left(29);
        }
    }
    frame
}
