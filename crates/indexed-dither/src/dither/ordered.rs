//! Stateless ordered ditherers.
//!
//! Each algorithm here perturbs every pixel independently from a fixed
//! grid or low-discrepancy sequence, so identical frames always produce
//! identical output and animations stay rock steady.

use super::{reduce_ordered, DitherOptions, IndexedFrame};
use crate::color::{from_linear, to_linear};
use crate::noise;
use crate::palette::Palette;

/// Plain nearest-color lookup.
pub(super) fn reduce_solid(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    reduce_ordered(palette, pixels, width, height, opts, |_, _, r, g, b| {
        (r, g, b)
    })
}

/// Bayer 8x8 threshold matrix, in dispersed-dot order.
#[rustfmt::skip]
const BAYER8: [f32; 64] = [
     0.0, 32.0,  8.0, 40.0,  2.0, 34.0, 10.0, 42.0,
    48.0, 16.0, 56.0, 24.0, 50.0, 18.0, 58.0, 26.0,
    12.0, 44.0,  4.0, 36.0, 14.0, 46.0,  6.0, 38.0,
    60.0, 28.0, 52.0, 20.0, 62.0, 30.0, 54.0, 22.0,
     3.0, 35.0, 11.0, 43.0,  1.0, 33.0,  9.0, 41.0,
    51.0, 19.0, 59.0, 27.0, 49.0, 17.0, 57.0, 25.0,
    15.0, 47.0,  7.0, 39.0, 13.0, 45.0,  5.0, 37.0,
    63.0, 31.0, 55.0, 23.0, 61.0, 29.0, 53.0, 21.0,
];

/// GOURD: Bayer 8x8 offsets applied in linear light.
///
/// The matrix value, centered on 31.5, is scaled into 10-bit linear units
/// and pushed through the gamma-inverse table, so the visible texture is
/// even across the tonal range.
pub(super) fn reduce_bayer(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    let s = palette.dither_strength() * 8.0 * palette.population_bias();
    reduce_ordered(palette, pixels, width, height, opts, |x, y, r, g, b| {
        let offset = ((BAYER8[(x & 7) + ((y & 7) << 3)] - 31.5) * s) as i32;
        (
            from_linear(to_linear(r) + offset),
            from_linear(to_linear(g) + offset),
            from_linear(to_linear(b) + offset),
        )
    })
}

/// LOAF: two-level checkerboard, the cheapest texture that still breaks
/// banding.
pub(super) fn reduce_checker(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    let s = palette.dither_strength() * (0.5 + palette.population_bias());
    reduce_ordered(palette, pixels, width, height, opts, |x, y, r, g, b| {
        let offset = if (x + y) & 1 == 0 { -16.0 * s } else { 16.0 * s };
        (
            add_clamped(r, offset),
            add_clamped(g, offset),
            add_clamped(b, offset),
        )
    })
}

/// GRADIENT_NOISE: Jimenez interleaved gradient noise, scaled per channel
/// by the pixel's own quantization residual so flat palette-exact regions
/// stay untouched.
pub(super) fn reduce_gradient_noise(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    let s = palette.dither_strength() * palette.population_bias();
    reduce_ordered(palette, pixels, width, height, opts, |x, y, r, g, b| {
        let used = palette.nearest_entry(r, g, b);
        let n = (52.98 * (0.067 * x as f32 + 0.0058 * y as f32).fract()).fract() - 0.5;
        let adjust = |v: u8, u: u8| add_clamped(v, n * s * (v as f32 - u as f32));
        (
            adjust(r, crate::color::red(used)),
            adjust(g, crate::color::green(used)),
            adjust(b, crate::color::blue(used)),
        )
    })
}

/// Triangle wave with period 1, range [-1, 1].
#[inline]
fn triangle_wave(t: f32) -> f32 {
    4.0 * (t.fract() - 0.5).abs() - 1.0
}

/// ROBERTS: a sub-random rotation, phase-shifted per channel and shaped
/// into a triangle wave.
///
/// The phase accumulates in 23-bit fixed point: `theta = frac((0.608 * x
/// + 0.285 * y) / 2^23)` with the coordinates pre-scaled by `2^23`, so
/// the fraction is exact and wraps instead of losing precision on large
/// images.
pub(super) fn reduce_roberts(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    // 0.608 and 0.285 in 23-bit fixed point.
    const C1: u32 = 5_100_274;
    const C2: u32 = 2_390_753;
    let s = palette.dither_strength() * 32.0 * palette.population_bias();
    reduce_ordered(palette, pixels, width, height, opts, |x, y, r, g, b| {
        let phase = (x as u32)
            .wrapping_mul(C1)
            .wrapping_add((y as u32).wrapping_mul(C2))
            & 0x7F_FFFF;
        let theta = phase as f32 / 8_388_608.0;
        (
            add_clamped(r, triangle_wave(theta) * s),
            add_clamped(g, triangle_wave(theta + 1.0 / 3.0) * s),
            add_clamped(b, triangle_wave(theta + 2.0 / 3.0) * s),
        )
    })
}

/// BLUE_NOISE: a distinct triangular blue-noise grid per channel, plus a
/// small checker offset, clamped and scaled.
pub(super) fn reduce_blue_noise(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    let s = palette.dither_strength() * 0.25 * palette.population_bias();
    reduce_ordered(palette, pixels, width, height, opts, |x, y, r, g, b| {
        let adj = if (x + y) & 1 == 0 { -16 } else { 16 };
        let shift = |n: i32| ((n + adj).clamp(-100, 100)) as f32 * s;
        (
            add_clamped(r, shift(noise::tri_a(x, y))),
            add_clamped(g, shift(noise::tri_b(x, y))),
            add_clamped(b, shift(noise::tri_c(x, y))),
        )
    })
}

/// Add a float offset to an 8-bit channel, saturating.
#[inline]
pub(super) fn add_clamped(v: u8, offset: f32) -> u8 {
    (v as f32 + offset).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dither::DitherAlgorithm;

    fn bw() -> Palette {
        Palette::exact(&[0x000000FF, 0xFFFFFFFF])
    }

    #[test]
    fn test_bayer_matrix_is_a_permutation() {
        let mut seen = [false; 64];
        for &v in &BAYER8 {
            let i = v as usize;
            assert!(!seen[i], "duplicate {i}");
            seen[i] = true;
        }
    }

    #[test]
    fn test_triangle_wave_range() {
        for i in 0..100 {
            let t = i as f32 / 23.0;
            let w = triangle_wave(t);
            assert!((-1.0..=1.0).contains(&w), "wave({t}) = {w}");
        }
        assert!((triangle_wave(0.5) - 1.0).abs() < 1e-6);
        assert!((triangle_wave(0.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_solid_reduce_is_pure_lookup() {
        let mut p = bw();
        let pixels = vec![0x202020FFu32; 16];
        let frame = p.reduce(
            DitherAlgorithm::None,
            &pixels,
            4,
            4,
            &DitherOptions::default(),
        );
        assert!(frame.indices().iter().all(|&i| i == 0));
    }

    #[test]
    fn test_ordered_zero_strength_equals_solid() {
        for algo in [
            DitherAlgorithm::Gourd,
            DitherAlgorithm::Loaf,
            DitherAlgorithm::GradientNoise,
            DitherAlgorithm::Roberts,
            DitherAlgorithm::BlueNoise,
        ] {
            let mut p = bw();
            p.set_dither_strength(0.0);
            let pixels: Vec<u32> = (0..64)
                .map(|i| {
                    let v = (i * 4) as u8;
                    crate::color::rgba(v, v, v, 0xFF)
                })
                .collect();
            let dithered = p.reduce(algo, &pixels, 8, 8, &DitherOptions::default());
            let plain = p.reduce(
                DitherAlgorithm::None,
                &pixels,
                8,
                8,
                &DitherOptions::default(),
            );
            assert_eq!(dithered.indices(), plain.indices(), "{algo:?}");
        }
    }

    #[test]
    fn test_bayer_gradient_uses_both_extremes() {
        let mut p = bw();
        let pixels: Vec<u32> = (0..256)
            .map(|i| {
                let v = (i * 255 / 255) as u8;
                crate::color::rgba(v, v, v, 0xFF)
            })
            .collect();
        let frame = p.reduce(
            DitherAlgorithm::Gourd,
            &pixels,
            16,
            16,
            &DitherOptions::default(),
        );
        assert!(frame.used(0));
        assert!(frame.used(1));
    }
}
