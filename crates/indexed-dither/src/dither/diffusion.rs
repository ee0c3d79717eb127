//! Floyd-Steinberg error diffusion and its noise-modulated variants.
//!
//! One driver runs the classic 7/16, 3/16, 5/16, 1/16 kernel; the variants
//! plug in a pre-lookup noise term, an error-shaping curve, and an
//! optional blue-noise multiplier on the stored error. Two scratch rows
//! per channel are borrowed from the palette and handed back afterwards,
//! so repeated frames reuse their allocations.

use super::{source_pixel, DiffusionScratch, DitherAlgorithm, DitherOptions, IndexedFrame};
use crate::color::{alpha, blue, green, red};
use crate::noise;
use crate::palette::{Palette, ALPHA_THRESHOLD};

/// Error-shaping curve applied before distribution, in byte units.
#[derive(Clone, Copy)]
enum Shape {
    Identity,
    /// `e * 1.25 / (0.25 + |e|/255)`: amplifies small errors, passes large
    /// ones through. Smooths the transition bands SCATTER's multipliers
    /// would otherwise tear up.
    Sigmoid,
    /// `e / (0.5 + |e|/255)`: a gentler version of the same idea.
    Hyperbolic,
    /// `e * 16 / sqrt(2048 + e^2)`: soft clamp to about +/-16, leaving the
    /// noise terms in charge of the texture.
    SoftClamp,
}

impl Shape {
    #[inline]
    fn apply(self, e: f32) -> f32 {
        match self {
            Shape::Identity => e,
            Shape::Sigmoid => e * 1.25 / (0.25 + e.abs() / 255.0),
            Shape::Hyperbolic => e / (0.5 + e.abs() / 255.0),
            Shape::SoftClamp => e * 16.0 / (2048.0 + e * e).sqrt(),
        }
    }
}

/// Pre-lookup additive noise, in byte units.
#[derive(Clone, Copy)]
enum NoiseTerm {
    None,
    /// NEUE: softly clamped blue-noise bias, one grid for all channels.
    NeueBias { limit: f32 },
    /// DODGY: a distinct blue-noise grid per channel, clamped to +/-90.
    DodgyBlue,
    /// WREN family: blended blue noise and hashed offset.
    WrenMix { blue: f32, hashed: f32 },
    /// WOVEN: hashed offset clamped by palette size.
    WovenHash { limit: f32 },
}

impl NoiseTerm {
    #[inline]
    fn sample(self, x: usize, y: usize, ch: usize, ds: f32) -> f32 {
        match self {
            NoiseTerm::None => 0.0,
            NoiseTerm::NeueBias { limit } => {
                ((noise::tri_a(x, y) as f32 + 0.5) * 1.275 * ds).clamp(-limit, limit)
            }
            NoiseTerm::DodgyBlue => {
                let n = match ch {
                    0 => noise::tri_a(x, y),
                    1 => noise::tri_b(x, y),
                    _ => noise::tri_c(x, y),
                };
                ((n as f32 + 0.5) * 0.7 * ds).clamp(-90.0, 90.0)
            }
            NoiseTerm::WrenMix { blue, hashed } => {
                let n = (noise::tri_a(x, y) as f32 + 0.5) * blue * ds
                    + hash_offset(x, y, ch) * hashed * ds;
                n.clamp(-64.0, 64.0)
            }
            NoiseTerm::WovenHash { limit } => {
                (hash_offset(x, y, ch) * 40.0 * ds).clamp(-limit, limit)
            }
        }
    }
}

/// Deterministic triangular-distributed position hash in [-1, 1).
///
/// Two scrambled 16-bit halves summed, so small offsets dominate and the
/// extremes stay rare.
#[inline]
pub(super) fn hash_offset(x: usize, y: usize, ch: usize) -> f32 {
    let mut h = (x as u32)
        .wrapping_mul(0x9E37_79B9)
        .wrapping_add((y as u32).wrapping_mul(0x85EB_CA6B))
        ^ ((ch as u32 + 1).wrapping_mul(0xC2B2_AE35));
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    let a = (h & 0xFFFF) as f32 / 65536.0;
    let b = (h >> 16) as f32 / 65536.0;
    a + b - 1.0
}

struct FsConfig {
    noise: NoiseTerm,
    shape: Shape,
    /// Multiply stored errors by the blue-noise multiplier grid at read
    /// time (SCATTER).
    scatter_read: bool,
    /// Scale on the distributed shares (WOVEN's w1 tuning).
    weight_scale: f32,
}

fn config_for(palette: &Palette, algorithm: DitherAlgorithm) -> FsConfig {
    let ds = palette.dither_strength();
    let bias = palette.population_bias();
    match algorithm {
        DitherAlgorithm::Diffusion => FsConfig {
            noise: NoiseTerm::None,
            shape: Shape::Identity,
            scatter_read: false,
            weight_scale: 1.0,
        },
        DitherAlgorithm::Scatter => FsConfig {
            noise: NoiseTerm::None,
            shape: Shape::Sigmoid,
            scatter_read: true,
            weight_scale: 1.0,
        },
        DitherAlgorithm::Neue => FsConfig {
            noise: NoiseTerm::NeueBias {
                limit: 64.0 * bias,
            },
            shape: Shape::Sigmoid,
            scatter_read: false,
            weight_scale: 1.0,
        },
        DitherAlgorithm::Dodgy => FsConfig {
            noise: NoiseTerm::DodgyBlue,
            shape: Shape::Hyperbolic,
            scatter_read: false,
            weight_scale: 1.0,
        },
        DitherAlgorithm::Wren => FsConfig {
            noise: NoiseTerm::WrenMix {
                blue: 0.35,
                hashed: 30.0,
            },
            shape: Shape::SoftClamp,
            scatter_read: false,
            weight_scale: 1.0,
        },
        DitherAlgorithm::WrenOriginal => FsConfig {
            noise: NoiseTerm::WrenMix {
                blue: 0.5,
                hashed: 20.0,
            },
            shape: Shape::SoftClamp,
            scatter_read: false,
            weight_scale: 1.0,
        },
        DitherAlgorithm::Woven => FsConfig {
            noise: NoiseTerm::WovenHash {
                limit: 5.0 + 250.0 / (palette.color_count() as f32 + 1.5).sqrt(),
            },
            shape: Shape::Identity,
            scatter_read: false,
            weight_scale: (10.0 * ds.sqrt() / (bias * bias)).min(16.0) / 16.0,
        },
        other => unreachable!("{other:?} is not a Floyd-Steinberg variant"),
    }
}

pub(super) fn reduce_floyd_steinberg(
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
    let config = config_for(palette, algorithm);
    let ds = palette.dither_strength();
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
                let mut carried = scratch.cur(ch, x);
                if config.scatter_read {
                    carried *= noise::multiplier(0, x, y);
                }
                let v = src[ch] + carried + config.noise.sample(x, y, ch, ds);
                adjusted[ch] = v.clamp(0.0, 255.0);
                bytes[ch] = adjusted[ch] as u8;
            }

            let idx = palette.nearest_index(bytes[0], bytes[1], bytes[2]);
            frame.emit(idx);
            let used = palette.colors()[idx as usize];
            let used = [red(used) as f32, green(used) as f32, blue(used) as f32];

            for ch in 0..3 {
                let e = config.shape.apply((adjusted[ch] - used[ch]) * ds) * config.weight_scale;
                scratch.add_cur(ch, x + 1, width, e * (7.0 / 16.0));
                scratch.add_next(ch, x as isize - 1, width, e * (3.0 / 16.0));
                scratch.add_next(ch, x as isize, width, e * (5.0 / 16.0));
                scratch.add_next(ch, x as isize + 1, width, e * (1.0 / 16.0));
            }
        }
        scratch.advance(width);
    }
    frame
}
