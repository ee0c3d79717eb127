//! Burkes-kernel error diffusion and its noise-modulated variants.
//!
//! The two-row Burkes kernel spreads error wider than Floyd-Steinberg:
//!
//! ```text
//!         X   8   4
//! 2   4   8   4   2      (/ 32)
//! ```
//!
//! OCEANIC and SEASIDE scale each distributed share by a blue-noise
//! multiplier at the receiving pixel, which breaks the kernel's diagonal
//! worms without adding visible grain. OVERBOARD interleaves four noise
//! recipes by pixel parity and soft-clamps the error instead.

use super::{source_pixel, DiffusionScratch, DitherAlgorithm, DitherOptions, IndexedFrame};
use crate::color::{alpha, blue, green, red};
use crate::noise;
use crate::palette::{Palette, ALPHA_THRESHOLD};

/// `(dx, on_current_row, weight/32)` for the Burkes kernel.
const KERNEL: [(isize, bool, f32); 7] = [
    (1, true, 8.0 / 32.0),
    (2, true, 4.0 / 32.0),
    (-2, false, 2.0 / 32.0),
    (-1, false, 4.0 / 32.0),
    (0, false, 8.0 / 32.0),
    (1, false, 4.0 / 32.0),
    (2, false, 2.0 / 32.0),
];

/// How each distributed share is modulated at the receiving pixel.
#[derive(Clone, Copy)]
enum ShareMode {
    Plain,
    /// One multiplier grid for all channels (OCEANIC).
    SingleGrid,
    /// A distinct multiplier grid per channel (SEASIDE).
    GridPerChannel,
}

pub(super) fn reduce_burkes(
    palette: &mut Palette,
    algorithm: DitherAlgorithm,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    let mut scratch = std::mem::take(&mut palette.scratch);
    let frame = run(palette, &mut scratch, algorithm, pixels, width, height, opts);
    palette.scratch = scratch;
    frame
}

fn run(
    palette: &Palette,
    scratch: &mut DiffusionScratch,
    algorithm: DitherAlgorithm,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
) -> IndexedFrame {
    let ds = palette.dither_strength();
    // Saturating strength curve: rises quickly from zero, levels off so
    // large knob values cannot blow up the two-row kernel.
    let error_scale = ds * 0.6 / (0.19 + ds);
    let overboard = algorithm == DitherAlgorithm::Overboard;
    let share_mode = match algorithm {
        DitherAlgorithm::Oceanic => ShareMode::SingleGrid,
        DitherAlgorithm::Seaside => ShareMode::GridPerChannel,
        _ => ShareMode::Plain,
    };

    let transparent = palette.has_transparent_slot();
    let mut frame = IndexedFrame::new(width, height);
    scratch.begin(width);

    for y in 0..height {
        for x in 0..width {
            let px = source_pixel(pixels, width, height, x, y, opts.flip_y);
            if transparent && alpha(px) < ALPHA_THRESHOLD {
                frame.emit(0);
                continue;
            }
            let src = [red(px) as f32, green(px) as f32, blue(px) as f32];

            let mut adjusted = [0.0f32; 3];
            let mut bytes = [0u8; 3];
            for ch in 0..3 {
                let mut v = src[ch] + scratch.cur(ch, x);
                if overboard {
                    v += overboard_noise(x, y, ch, ds);
                }
                adjusted[ch] = v.clamp(0.0, 255.0);
                bytes[ch] = adjusted[ch] as u8;
            }

            let idx = palette.nearest_index(bytes[0], bytes[1], bytes[2]);
            frame.emit(idx);
            let used = palette.colors()[idx as usize];
            let used = [red(used) as f32, green(used) as f32, blue(used) as f32];

            for ch in 0..3 {
                let mut e = (adjusted[ch] - used[ch]) * error_scale;
                if overboard {
                    e = e * 16.0 / (45.0 + e.abs());
                }
                for (dx, on_cur, weight) in KERNEL {
                    let tx = x as isize + dx;
                    if tx < 0 || tx as usize >= width {
                        continue;
                    }
                    let ty = if on_cur { y } else { y + 1 };
                    let share = match share_mode {
                        ShareMode::Plain => e * weight,
                        ShareMode::SingleGrid => {
                            e * weight * noise::multiplier(0, tx as usize, ty)
                        }
                        ShareMode::GridPerChannel => {
                            e * weight * noise::multiplier(ch, tx as usize, ty)
                        }
                    };
                    if on_cur {
                        scratch.add_cur(ch, tx as usize, width, share);
                    } else {
                        scratch.add_next(ch, tx, width, share);
                    }
                }
            }
        }
        scratch.advance(width);
    }
    frame
}

/// OVERBOARD's four interleaved noise recipes, selected by pixel parity.
fn overboard_noise(x: usize, y: usize, ch: usize, ds: f32) -> f32 {
    const A1: f32 = 0.754_877_7;
    const A2: f32 = 0.569_840_3;
    match ((x << 1) | y) & 3 {
        0 => (noise::tri_a(x, y) as f32 + 0.5) * 0.4 * ds,
        1 => super::diffusion::hash_offset(x, y, ch) * 24.0 * ds,
        2 => {
            let theta = (x as f32 * A1 + y as f32 * A2 + ch as f32 / 3.0).fract();
            (4.0 * (theta - 0.5).abs() - 1.0) * 12.0 * ds
        }
        _ => {
            if (x ^ y) & 1 == 0 {
                -8.0 * ds
            } else {
                8.0 * ds
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BURKES_VARIANTS: [DitherAlgorithm; 4] = [
        DitherAlgorithm::Burkes,
        DitherAlgorithm::Oceanic,
        DitherAlgorithm::Seaside,
        DitherAlgorithm::Overboard,
    ];

    #[test]
    fn test_kernel_weights_sum_to_one() {
        let sum: f32 = KERNEL.iter().map(|&(_, _, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_variants_fill_the_frame() {
        for algo in BURKES_VARIANTS {
            let mut p = Palette::exact(&[0x000000FF, 0x808080FF, 0xFFFFFFFF]);
            let pixels: Vec<u32> = (0..256)
                .map(|i| {
                    let v = i as u8;
                    crate::color::rgba(v, v, v, 0xFF)
                })
                .collect();
            let frame = p.reduce(algo, &pixels, 16, 16, &DitherOptions::default());
            assert_eq!(frame.indices().len(), 256, "{algo:?}");
            assert!(
                frame.indices().iter().all(|&i| (i as usize) < 3),
                "{algo:?}"
            );
        }
    }

    #[test]
    fn test_zero_strength_is_plain_lookup() {
        for algo in BURKES_VARIANTS {
            let mut p = Palette::exact(&[0x000000FF, 0xFFFFFFFF]);
            p.set_dither_strength(0.0);
            let pixels = vec![0x808080FFu32; 64];
            let frame = p.reduce(algo, &pixels, 8, 8, &DitherOptions::default());
            let first = frame.indices()[0];
            assert!(
                frame.indices().iter().all(|&i| i == first),
                "{algo:?} dithered at strength 0"
            );
        }
    }

    #[test]
    fn test_burkes_mixes_mid_grey() {
        let mut p = Palette::exact(&[0x000000FF, 0xFFFFFFFF]);
        let pixels = vec![0x808080FFu32; 256];
        let frame = p.reduce(
            DitherAlgorithm::Burkes,
            &pixels,
            16,
            16,
            &DitherOptions::default(),
        );
        assert!(frame.used(0) && frame.used(1));
    }

    #[test]
    fn test_seaside_differs_from_oceanic() {
        let mut p = Palette::exact(&[0x000000FF, 0x404040FF, 0xC0C0C0FF, 0xFFFFFFFF]);
        let pixels: Vec<u32> = (0..1024)
            .map(|i| {
                let v = (i % 256) as u8;
                crate::color::rgba(v, v.wrapping_add(40), v.wrapping_add(80), 0xFF)
            })
            .collect();
        let a = p.reduce(
            DitherAlgorithm::Oceanic,
            &pixels,
            32,
            32,
            &DitherOptions::default(),
        );
        let b = p.reduce(
            DitherAlgorithm::Seaside,
            &pixels,
            32,
            32,
            &DitherOptions::default(),
        );
        assert_ne!(a.indices(), b.indices());
    }
}
