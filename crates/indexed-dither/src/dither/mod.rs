//! Dithered palette mapping.
//!
//! Nineteen algorithms share one outer loop: fetch the source pixel
//! (optionally Y-flipped), short-circuit sub-threshold alpha to the
//! transparent slot, perturb the channels, clamp, and look the result up
//! in the palette's RGB555 map. They differ only in how they perturb and
//! in what state they carry between pixels.
//!
//! # Families
//!
//! - **Ordered** (`GOURD`, `LOAF`, `GRADIENT_NOISE`, `ROBERTS`,
//!   `BLUE_NOISE`): stateless per-pixel offsets from a fixed grid or
//!   sequence. Stable across frames, best for animation.
//! - **Pattern** (`PATTERN`): Knoll's 4x4 candidate-list refinement.
//!   Slowest, smoothest static output.
//! - **Error diffusion** (`DIFFUSION` through `OVERBOARD`): push each
//!   pixel's quantization error into unvisited neighbors, in several
//!   noise-modulated variants that trade worm artifacts for grain.
//! - **Chaotic** (`CHAOTIC_NOISE`): deliberately unstable noise keyed on
//!   the frame sequence number, for a distressed look.
//!
//! Effective strengths derive from the palette's `dither_strength` knob
//! and its `population_bias`: small palettes produce large quantization
//! errors, so their dithers are softened to keep diffusion from
//! saturating.

mod burkes;
mod chaotic;
mod diffusion;
mod ordered;
mod pattern;

use crate::color::{alpha, blue, green, red};
use crate::palette::{Palette, ALPHA_THRESHOLD};

/// Dither algorithm selection.
///
/// The names are part of the output contract: callers pick a look, not an
/// implementation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherAlgorithm {
    /// No dithering; plain nearest-color lookup.
    None,
    /// Knoll pattern dithering: 16 candidates per pixel, selected through
    /// a 4x4 threshold matrix. Highest quality for stills, slow.
    Pattern,
    /// Bayer 8x8 ordered dither in linear light.
    Gourd,
    /// Two-level checkerboard. The cheapest possible texture.
    Loaf,
    /// Jimenez interleaved gradient noise, scaled by the quantization
    /// residual.
    GradientNoise,
    /// R2 sub-random sequence, triangle-waved per channel.
    Roberts,
    /// Triangular blue noise, one independent grid per channel.
    BlueNoise,
    /// Sequence-seeded chaotic noise; intentionally differs per frame.
    ChaoticNoise,
    /// Plain Floyd-Steinberg error diffusion.
    Diffusion,
    /// Floyd-Steinberg with blue-noise-multiplied error reads and sigmoid
    /// error smoothing.
    Scatter,
    /// Floyd-Steinberg plus a softly clamped blue-noise bias.
    Neue,
    /// Floyd-Steinberg with per-channel blue noise and hyperbolic error
    /// smoothing.
    Dodgy,
    /// Floyd-Steinberg with blended blue noise and hashed offsets, soft
    /// error clamp.
    Wren,
    /// Earlier WREN coefficients, kept for output compatibility.
    WrenOriginal,
    /// Floyd-Steinberg with hashed offsets clamped by palette size.
    Woven,
    /// Two-row Burkes error diffusion.
    Burkes,
    /// Burkes with blue-noise-multiplied error shares.
    Oceanic,
    /// Burkes with a distinct multiplier grid per channel.
    Seaside,
    /// Burkes-shaped diffusion with four interleaved noise recipes and a
    /// hard-soft error clamp. The all-round default.
    #[default]
    Overboard,
}

impl DitherAlgorithm {
    /// Every algorithm, in declaration order.
    pub const ALL: [DitherAlgorithm; 19] = [
        DitherAlgorithm::None,
        DitherAlgorithm::Pattern,
        DitherAlgorithm::Gourd,
        DitherAlgorithm::Loaf,
        DitherAlgorithm::GradientNoise,
        DitherAlgorithm::Roberts,
        DitherAlgorithm::BlueNoise,
        DitherAlgorithm::ChaoticNoise,
        DitherAlgorithm::Diffusion,
        DitherAlgorithm::Scatter,
        DitherAlgorithm::Neue,
        DitherAlgorithm::Dodgy,
        DitherAlgorithm::Wren,
        DitherAlgorithm::WrenOriginal,
        DitherAlgorithm::Woven,
        DitherAlgorithm::Burkes,
        DitherAlgorithm::Oceanic,
        DitherAlgorithm::Seaside,
        DitherAlgorithm::Overboard,
    ];
}

/// Per-call dithering options.
///
/// Strength lives on the [`Palette`]; these are the knobs that vary per
/// frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct DitherOptions {
    /// When set, source row 0 becomes the last emitted row.
    pub flip_y: bool,
    /// Frame sequence number; seeds [`DitherAlgorithm::ChaoticNoise`].
    pub seq: u64,
}

/// The output of a dithering pass: one palette index per pixel plus a
/// record of which palette slots were actually emitted.
#[derive(Debug, Clone)]
pub struct IndexedFrame {
    indices: Vec<u8>,
    width: usize,
    height: usize,
    used: [bool; 256],
}

impl IndexedFrame {
    fn new(width: usize, height: usize) -> Self {
        IndexedFrame {
            indices: Vec::with_capacity(width * height),
            width,
            height,
            used: [false; 256],
        }
    }

    #[inline]
    fn emit(&mut self, index: u8) {
        self.indices.push(index);
        self.used[index as usize] = true;
    }

    /// Palette indices, row-major, top row first.
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the given palette slot appears in `indices`.
    #[inline]
    pub fn used(&self, index: u8) -> bool {
        self.used[index as usize]
    }

    /// Number of distinct palette slots emitted.
    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|&&u| u).count()
    }

    /// Consume the frame, keeping only the index buffer.
    pub fn into_indices(self) -> Vec<u8> {
        self.indices
    }
}

/// Reusable error-diffusion rows, owned by the palette.
///
/// Rows are grown on demand and never shrunk, so repeated frames of the
/// same width reuse their allocations.
#[derive(Debug, Clone, Default)]
pub(crate) struct DiffusionScratch {
    cur: [Vec<f32>; 3],
    next: [Vec<f32>; 3],
}

impl DiffusionScratch {
    /// Prepare for a frame of the given width: grow if needed, zero both
    /// row sets.
    fn begin(&mut self, width: usize) {
        for row in self.cur.iter_mut().chain(self.next.iter_mut()) {
            if row.len() < width {
                row.resize(width, 0.0);
            }
            row[..width].fill(0.0);
        }
    }

    /// Rotate: the accumulated next-row errors become current, and the new
    /// next row starts from zero. Zeroing is explicit; arithmetic is never
    /// trusted to self-cancel.
    fn advance(&mut self, width: usize) {
        for ch in 0..3 {
            std::mem::swap(&mut self.cur[ch], &mut self.next[ch]);
            self.next[ch][..width].fill(0.0);
        }
    }

    #[inline]
    fn cur(&self, ch: usize, x: usize) -> f32 {
        self.cur[ch][x]
    }

    #[inline]
    fn add_cur(&mut self, ch: usize, x: usize, width: usize, e: f32) {
        if x < width {
            self.cur[ch][x] += e;
        }
    }

    #[inline]
    fn add_next(&mut self, ch: usize, x: isize, width: usize, e: f32) {
        if x >= 0 && (x as usize) < width {
            self.next[ch][x as usize] += e;
        }
    }
}

/// Fetch the source pixel for emitted coordinates, honoring `flip_y`.
#[inline]
pub(crate) fn source_pixel(
    pixels: &[u32],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    flip_y: bool,
) -> u32 {
    let sy = if flip_y { height - 1 - y } else { y };
    pixels[sy * width + x]
}

/// The shared outer loop for stateless (ordered) algorithms.
///
/// `perturb` receives emitted coordinates and the source channels and
/// returns adjusted channels; the caller handles its own clamping.
pub(crate) fn reduce_ordered<F>(
    palette: &Palette,
    pixels: &[u32],
    width: usize,
    height: usize,
    opts: &DitherOptions,
    mut perturb: F,
) -> IndexedFrame
where
    F: FnMut(usize, usize, u8, u8, u8) -> (u8, u8, u8),
{
    let transparent = palette.has_transparent_slot();
    let mut frame = IndexedFrame::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let px = source_pixel(pixels, width, height, x, y, opts.flip_y);
            if transparent && alpha(px) < ALPHA_THRESHOLD {
                frame.emit(0);
                continue;
            }
            let (r, g, b) = perturb(x, y, red(px), green(px), blue(px));
            frame.emit(palette.nearest_index(r, g, b));
        }
    }
    frame
}

impl Palette {
    /// Map a frame of RGBA8888 pixels to palette indices with the chosen
    /// algorithm.
    ///
    /// `pixels` is row-major `width * height`; the output is always in
    /// emitted order (top row first), regardless of `flip_y`.
    pub fn reduce(
        &mut self,
        algorithm: DitherAlgorithm,
        pixels: &[u32],
        width: usize,
        height: usize,
        opts: &DitherOptions,
    ) -> IndexedFrame {
        debug_assert_eq!(
            pixels.len(),
            width * height,
            "pixel buffer does not match {width}x{height}"
        );
        match algorithm {
            DitherAlgorithm::None => ordered::reduce_solid(self, pixels, width, height, opts),
            DitherAlgorithm::Pattern => pattern::reduce_knoll(self, pixels, width, height, opts),
            DitherAlgorithm::Gourd => ordered::reduce_bayer(self, pixels, width, height, opts),
            DitherAlgorithm::Loaf => ordered::reduce_checker(self, pixels, width, height, opts),
            DitherAlgorithm::GradientNoise => {
                ordered::reduce_gradient_noise(self, pixels, width, height, opts)
            }
            DitherAlgorithm::Roberts => ordered::reduce_roberts(self, pixels, width, height, opts),
            DitherAlgorithm::BlueNoise => {
                ordered::reduce_blue_noise(self, pixels, width, height, opts)
            }
            DitherAlgorithm::ChaoticNoise => {
                chaotic::reduce_chaotic(self, pixels, width, height, opts)
            }
            DitherAlgorithm::Diffusion
            | DitherAlgorithm::Scatter
            | DitherAlgorithm::Neue
            | DitherAlgorithm::Dodgy
            | DitherAlgorithm::Wren
            | DitherAlgorithm::WrenOriginal
            | DitherAlgorithm::Woven => {
                diffusion::reduce_floyd_steinberg(self, algorithm, pixels, width, height, opts)
            }
            DitherAlgorithm::Burkes
            | DitherAlgorithm::Oceanic
            | DitherAlgorithm::Seaside
            | DitherAlgorithm::Overboard => {
                burkes::reduce_burkes(self, algorithm, pixels, width, height, opts)
            }
        }
    }
}
