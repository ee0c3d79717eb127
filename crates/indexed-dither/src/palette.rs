//! Palette construction and nearest-color lookup.
//!
//! A [`Palette`] owns up to 256 RGBA8888 entries plus a dense 32,768-entry
//! byte map that answers "nearest palette index" for every RGB555 key in
//! constant time. All conversions and the full map are computed at build
//! time; per-pixel work during dithering is a shift and two array loads.
//!
//! Builders never fail. Bad input (empty or single-color palettes, limits
//! below 2, malformed preloads) falls back to safe behavior with a logged
//! warning, so an encoding run always completes with *some* palette.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::color::{self, shrink, shrink_channels, stretch, RGB555_SIZE};
use crate::difference::ColorDifference;
use crate::dither::DiffusionScratch;

/// Fully transparent RGBA8888 word, reserved for palette slot 0 whenever
/// the analyzed source contains sub-threshold alpha.
pub const TRANSPARENT: u32 = 0x0000_0000;

/// Alpha values below this threshold count as transparent.
pub const ALPHA_THRESHOLD: u8 = 0x80;

/// A color palette with a precomputed RGB555 nearest-index map.
#[derive(Debug, Clone)]
pub struct Palette {
    /// Active entries, `0xRRGGBBAA`. Slot 0 is [`TRANSPARENT`] iff the
    /// source had sub-threshold alpha during analysis.
    colors: Vec<u32>,
    /// One byte per RGB555 key: the nearest palette index.
    mapping: Box<[u8]>,
    /// Exact RGBA -> index, for fast hits during construction.
    reverse: HashMap<u32, u8>,
    /// `exp(-1.375 / color_count)`; softens dithers for small palettes.
    population_bias: f32,
    /// User-facing dither strength knob, default 1.
    dither_strength: f32,
    difference: ColorDifference,
    /// Error-diffusion rows, reused (and only ever grown) across frames.
    pub(crate) scratch: DiffusionScratch,
}

impl Default for Palette {
    /// The built-in 256-color fallback palette.
    fn default() -> Self {
        Self::from_colors(default_colors(), ColorDifference::Oklab)
    }
}

impl Palette {
    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    /// Use the supplied palette verbatim, keeping at most 256 entries.
    pub fn exact(colors: &[u32]) -> Self {
        Self::exact_limited(colors, 256)
    }

    /// Use the supplied palette verbatim, keeping at most `limit` entries.
    ///
    /// Fewer than two colors, or a limit below two, falls back to the
    /// built-in default palette.
    pub fn exact_limited(colors: &[u32], limit: usize) -> Self {
        if colors.len() < 2 || limit < 2 {
            warn!(
                supplied = colors.len(),
                limit, "unusable exact palette, using built-in default"
            );
            return Self::default();
        }
        let n = colors.len().min(limit).min(256);
        Self::from_colors(colors[..n].to_vec(), ColorDifference::Oklab)
    }

    /// Use the supplied palette together with a preloaded 32,768-byte
    /// nearest-index map, skipping the expensive fill.
    ///
    /// The preload is accepted only if it has exactly [`RGB555_SIZE`]
    /// entries, all below the palette's color count; otherwise the map is
    /// recomputed from scratch.
    pub fn exact_with_preload(colors: &[u32], preload: &[u8]) -> Self {
        let mut palette = Self::exact(colors);
        let count = palette.colors.len();
        if preload.len() == RGB555_SIZE && preload.iter().all(|&b| (b as usize) < count) {
            palette.mapping.copy_from_slice(preload);
        } else {
            warn!(
                preload_len = preload.len(),
                color_count = count,
                "invalid preloaded mapping, recomputed"
            );
        }
        palette
    }

    /// Build a palette by frequency analysis of one or more frames.
    ///
    /// Pixels are tallied at 5-bit-per-channel resolution; candidates are
    /// admitted most-frequent first, each required to sit at least
    /// `threshold / (limit^1.5 * 0.00105)` away from everything already
    /// admitted. Uses the Oklab metric and the exhaustive map fill.
    pub fn analyze(frames: &[&[u32]], threshold: f64, limit: usize) -> Self {
        let colors = Self::analyze_colors(frames, threshold, limit, ColorDifference::Oklab);
        Self::from_colors(colors, ColorDifference::Oklab)
    }

    /// Like [`analyze`](Self::analyze), but with the cheaper linear-RGB
    /// metric and an iterative neighbor-expansion map fill. Roughly 5x
    /// faster; the default for multi-frame animations.
    pub fn analyze_fast(frames: &[&[u32]], threshold: f64, limit: usize) -> Self {
        let colors = Self::analyze_colors(frames, threshold, limit, ColorDifference::LinearRgb);
        let mut palette = Self::bare(colors, ColorDifference::LinearRgb);
        palette.fill_mapping_fast();
        palette
    }

    /// Build a palette by median-cut partitioning of the opaque pixels.
    ///
    /// Prefers an even spread over faithfulness to dominant colors: the
    /// pixel cloud is split `ceil(log2(limit))` times along each bin's
    /// widest channel, and each surviving bin contributes its average.
    pub fn analyze_median_cut(pixels: &[u32], limit: usize) -> Self {
        let limit = limit.clamp(2, 256);
        let mut has_transparent = false;
        let mut cloud: Vec<[u8; 3]> = Vec::with_capacity(pixels.len());
        for &px in pixels {
            if color::alpha(px) < ALPHA_THRESHOLD {
                has_transparent = true;
            } else {
                cloud.push([color::red(px), color::green(px), color::blue(px)]);
            }
        }

        let capacity = if has_transparent { limit - 1 } else { limit };
        let cuts = usize::BITS - (capacity.max(2) - 1).leading_zeros();

        let mut bins: Vec<Vec<[u8; 3]>> = vec![cloud];
        for _ in 0..cuts {
            let mut split: Vec<Vec<[u8; 3]>> = Vec::with_capacity(bins.len() * 2);
            for mut bin in bins {
                if bin.len() <= 1 {
                    split.push(bin);
                    continue;
                }
                let axis = widest_axis(&bin);
                bin.sort_unstable_by_key(|px| px[axis]);
                let tail = bin.split_off(bin.len() / 2);
                split.push(bin);
                split.push(tail);
            }
            bins = split;
        }

        // Keep the most populated bins. The ordering uses its own key
        // extraction; bin populations are never touched during the sort.
        bins.retain(|bin| !bin.is_empty());
        bins.sort_by_key(|bin| std::cmp::Reverse(bin.len()));
        bins.truncate(capacity);

        let mut colors = Vec::with_capacity(bins.len() + 1);
        if has_transparent {
            colors.push(TRANSPARENT);
        }
        for bin in &bins {
            let mut sums = [0u64; 3];
            for px in bin {
                for c in 0..3 {
                    sums[c] += px[c] as u64;
                }
            }
            let n = bin.len() as u64;
            colors.push(color::rgba(
                ((sums[0] + n / 2) / n) as u8,
                ((sums[1] + n / 2) / n) as u8,
                ((sums[2] + n / 2) / n) as u8,
                0xFF,
            ));
        }
        if colors.is_empty() {
            colors.push(0x0000_00FF);
        }
        Self::from_colors(colors, ColorDifference::Oklab)
    }

    /// Shared tally/admission step for the analyze builders.
    fn analyze_colors(
        frames: &[&[u32]],
        threshold: f64,
        limit: usize,
        metric: ColorDifference,
    ) -> Vec<u32> {
        let limit = limit.clamp(2, 256);
        let threshold = threshold / ((limit as f64).powf(1.5) * 0.00105);

        let mut tally: HashMap<u32, u32> = HashMap::new();
        let mut has_transparent = false;
        for frame in frames {
            for &px in *frame {
                if color::alpha(px) < ALPHA_THRESHOLD {
                    has_transparent = true;
                } else {
                    *tally.entry((px & 0xF8F8_F800) | 0xFF).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(u32, u32)> = tally.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let capacity = if has_transparent { limit - 1 } else { limit };
        let mut colors = Vec::with_capacity(limit);
        if has_transparent {
            colors.push(TRANSPARENT);
        }
        if ranked.len() <= capacity {
            colors.extend(ranked.into_iter().map(|(c, _)| c));
        } else {
            for (candidate, _) in ranked {
                if colors.len() == limit {
                    break;
                }
                let admissible = colors
                    .iter()
                    .all(|&kept| metric.between(candidate, kept) >= threshold);
                if admissible {
                    colors.push(candidate);
                }
            }
        }
        if colors.is_empty() {
            warn!("analysis found no usable pixels, palette is black only");
            colors.push(0x0000_00FF);
        }
        debug!(
            colors = colors.len(),
            transparent = has_transparent,
            "palette analysis complete"
        );
        colors
    }

    /// Construct with the exhaustive map fill.
    fn from_colors(colors: Vec<u32>, difference: ColorDifference) -> Self {
        let mut palette = Self::bare(colors, difference);
        palette.fill_mapping();
        palette
    }

    /// Construct everything except the 32K map.
    fn bare(colors: Vec<u32>, difference: ColorDifference) -> Self {
        let mut reverse = HashMap::with_capacity(colors.len());
        for (i, &c) in colors.iter().enumerate().rev() {
            reverse.insert(c, i as u8);
        }
        let population_bias = (-1.375 / colors.len() as f32).exp();
        Palette {
            colors,
            mapping: vec![0u8; RGB555_SIZE].into_boxed_slice(),
            reverse,
            population_bias,
            dither_strength: 1.0,
            difference,
            scratch: DiffusionScratch::default(),
        }
    }

    /// Exhaustive O(32768 * N) map fill: every key gets the index of the
    /// metric-nearest entry, ties to the lowest index. Keys occupied by an
    /// opaque palette entry map to that entry. The transparent slot never
    /// claims a cell (its own key 0 belongs to the nearest opaque color,
    /// so opaque near-black pixels stay opaque); it is reachable only
    /// through the ditherers' alpha short-circuit.
    fn fill_mapping(&mut self) {
        let skip = usize::from(self.has_transparent_slot());
        let mut occupied = vec![false; RGB555_SIZE];
        for (i, &c) in self.colors.iter().enumerate().skip(skip) {
            let key = shrink(c) as usize;
            if !occupied[key] {
                self.mapping[key] = i as u8;
                occupied[key] = true;
            }
        }
        for key in 0..RGB555_SIZE {
            if occupied[key] {
                continue;
            }
            let probe = stretch(key as u16);
            let mut best = 0u8;
            let mut best_d = f64::INFINITY;
            for (i, &c) in self.colors.iter().enumerate() {
                let d = self.difference.between(probe, c);
                if d < best_d {
                    best_d = d;
                    best = i as u8;
                }
            }
            self.mapping[key] = best;
        }
    }

    /// Neighbor-expansion map fill over the 32x32x32 grid: starting from
    /// the keys occupied by opaque palette entries, unassigned keys
    /// repeatedly copy the index of an already-assigned axis neighbor;
    /// every third pass the 12 face-diagonal neighbors join in. Converges
    /// in at most one pass per grid cell of distance to the nearest seed.
    /// As in [`fill_mapping`](Self::fill_mapping), the transparent slot
    /// seeds nothing, so it cannot bleed into the dark corner of the
    /// grid.
    fn fill_mapping_fast(&mut self) {
        let skip = usize::from(self.has_transparent_slot());
        let mut assigned = vec![false; RGB555_SIZE];
        for (i, &c) in self.colors.iter().enumerate().skip(skip) {
            let key = shrink(c) as usize;
            if !assigned[key] {
                self.mapping[key] = i as u8;
                assigned[key] = true;
            }
        }

        // Grid-unit offsets in (r, g, b).
        const AXIS: [(i32, i32, i32); 6] = [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ];
        const DIAGONAL: [(i32, i32, i32); 12] = [
            (1, 1, 0),
            (1, -1, 0),
            (-1, 1, 0),
            (-1, -1, 0),
            (1, 0, 1),
            (1, 0, -1),
            (-1, 0, 1),
            (-1, 0, -1),
            (0, 1, 1),
            (0, 1, -1),
            (0, -1, 1),
            (0, -1, -1),
        ];

        let mut pending: Vec<(usize, u8)> = Vec::new();
        let mut pass = 0usize;
        loop {
            pass += 1;
            pending.clear();
            let mut remaining = 0usize;
            for key in 0..RGB555_SIZE {
                if assigned[key] {
                    continue;
                }
                let r = (key >> 10) as i32;
                let g = ((key >> 5) & 0x1F) as i32;
                let b = (key & 0x1F) as i32;
                let mut found = None;
                let diagonals: &[(i32, i32, i32)] = if pass % 3 == 0 { &DIAGONAL } else { &[] };
                for &(dr, dg, db) in AXIS.iter().chain(diagonals) {
                    let (nr, ng, nb) = (r + dr, g + dg, b + db);
                    if !(0..32).contains(&nr) || !(0..32).contains(&ng) || !(0..32).contains(&nb) {
                        continue;
                    }
                    let nk = ((nr as usize) << 10) | ((ng as usize) << 5) | nb as usize;
                    if assigned[nk] {
                        found = Some(self.mapping[nk]);
                        break;
                    }
                }
                match found {
                    Some(idx) => pending.push((key, idx)),
                    None => remaining += 1,
                }
            }
            for &(key, idx) in &pending {
                self.mapping[key] = idx;
                assigned[key] = true;
            }
            if remaining == 0 || pending.is_empty() {
                break;
            }
        }
    }

    // ------------------------------------------------------------------
    // Lookup and accessors
    // ------------------------------------------------------------------

    /// Nearest palette index for an opaque RGB triple.
    #[inline]
    pub fn nearest_index(&self, r: u8, g: u8, b: u8) -> u8 {
        self.mapping[shrink_channels(r, g, b) as usize]
    }

    /// Palette entry for an opaque RGB triple.
    #[inline]
    pub fn nearest_entry(&self, r: u8, g: u8, b: u8) -> u32 {
        self.colors[self.nearest_index(r, g, b) as usize]
    }

    /// Exact-match lookup from construction-time colors.
    #[inline]
    pub fn reverse_lookup(&self, rgba: u32) -> Option<u8> {
        self.reverse.get(&rgba).copied()
    }

    /// Active palette entries.
    #[inline]
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Number of active entries, in `1..=256`.
    #[inline]
    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    /// The full RGB555 nearest-index map.
    #[inline]
    pub fn mapping(&self) -> &[u8] {
        &self.mapping
    }

    /// Whether slot 0 is the reserved transparent entry.
    #[inline]
    pub fn has_transparent_slot(&self) -> bool {
        self.colors[0] == TRANSPARENT
    }

    /// `exp(-1.375 / color_count)`.
    #[inline]
    pub fn population_bias(&self) -> f32 {
        self.population_bias
    }

    /// The configured dither strength, default 1.
    #[inline]
    pub fn dither_strength(&self) -> f32 {
        self.dither_strength
    }

    /// Set the dither strength; negative values are clamped to zero.
    pub fn set_dither_strength(&mut self, strength: f32) {
        self.dither_strength = strength.max(0.0);
    }

    /// The metric used for map fills and admission decisions.
    #[inline]
    pub fn difference_metric(&self) -> ColorDifference {
        self.difference
    }

    /// Switch metrics and rebuild the map under the new one.
    pub fn set_difference_metric(&mut self, metric: ColorDifference) {
        if self.difference != metric {
            self.difference = metric;
            self.fill_mapping();
        }
    }

    /// Difference between two RGBA words under the configured metric.
    #[inline]
    pub fn difference(&self, a: u32, b: u32) -> f64 {
        self.difference.between(a, b)
    }

    // ------------------------------------------------------------------
    // In-place alteration
    // ------------------------------------------------------------------

    /// Scale and offset the warped-Oklab lightness of every opaque entry,
    /// then rebuild the map.
    pub fn alter_lightness(&mut self, multiplier: f32, add: f32) {
        self.alter_oklab(|l, a, b| (((l * multiplier) + add).clamp(0.0, 1.0), a, b));
    }

    /// Rotate every opaque entry's hue by `degrees` in Oklab, then rebuild
    /// the map.
    pub fn hue_shift(&mut self, degrees: f32) {
        let theta = degrees.to_radians();
        let (sin, cos) = theta.sin_cos();
        self.alter_oklab(move |l, a, b| (l, a * cos - b * sin, a * sin + b * cos));
    }

    fn alter_oklab(&mut self, f: impl Fn(f32, f32, f32) -> (f32, f32, f32)) {
        for c in &mut self.colors {
            if color::alpha(*c) < ALPHA_THRESHOLD {
                continue;
            }
            let [l, a, b] = crate::color::lut::oklab_from_rgb(
                color::red(*c) as f32 / 255.0,
                color::green(*c) as f32 / 255.0,
                color::blue(*c) as f32 / 255.0,
            );
            let (l, a, b) = f(l, a, b);
            *c = crate::color::lut::oklab_to_rgba(l, a, b);
        }
        self.reverse.clear();
        for (i, &c) in self.colors.iter().enumerate().rev() {
            self.reverse.insert(c, i as u8);
        }
        self.fill_mapping();
    }
}

/// Channel with the largest value spread in a pixel bin.
fn widest_axis(bin: &[[u8; 3]]) -> usize {
    let mut lo = [255u8; 3];
    let mut hi = [0u8; 3];
    for px in bin {
        for c in 0..3 {
            lo[c] = lo[c].min(px[c]);
            hi[c] = hi[c].max(px[c]);
        }
    }
    let spans = [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]];
    (0..3).max_by_key(|&c| spans[c]).unwrap_or(0)
}

/// The built-in fallback palette: a 6x7x6 RGB lattice plus four greys the
/// lattice misses.
fn default_colors() -> Vec<u32> {
    let r_levels = [0u8, 51, 102, 153, 204, 255];
    let g_levels = [0u8, 42, 85, 128, 170, 213, 255];
    let b_levels = [0u8, 51, 102, 153, 204, 255];
    let mut colors = Vec::with_capacity(256);
    for &r in &r_levels {
        for &g in &g_levels {
            for &b in &b_levels {
                colors.push(color::rgba(r, g, b, 0xFF));
            }
        }
    }
    for &v in &[64u8, 96, 160, 192] {
        colors.push(color::rgba(v, v, v, 0xFF));
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RED: u32 = 0xFF0000FF;
    const GREEN: u32 = 0x00FF00FF;
    const BLUE: u32 = 0x0000FFFF;
    const BLACK: u32 = 0x000000FF;
    const WHITE: u32 = 0xFFFFFFFF;

    #[test]
    fn test_default_palette_is_full() {
        let p = Palette::default();
        assert_eq!(p.color_count(), 256);
        assert!(!p.has_transparent_slot());
    }

    #[test]
    fn test_exact_keeps_order() {
        let p = Palette::exact(&[BLACK, RED, GREEN, BLUE]);
        assert_eq!(p.colors(), &[BLACK, RED, GREEN, BLUE]);
        assert_eq!(p.nearest_index(255, 0, 0), 1);
        assert_eq!(p.reverse_lookup(GREEN), Some(2));
    }

    #[test]
    fn test_exact_bad_input_falls_back() {
        assert_eq!(Palette::exact(&[]).color_count(), 256);
        assert_eq!(Palette::exact(&[RED]).color_count(), 256);
        assert_eq!(Palette::exact_limited(&[RED, GREEN], 1).color_count(), 256);
    }

    #[test]
    fn test_exact_limit_truncates() {
        let p = Palette::exact_limited(&[BLACK, RED, GREEN, BLUE], 2);
        assert_eq!(p.colors(), &[BLACK, RED]);
    }

    #[test]
    fn test_preload_round_trip() {
        let source = Palette::exact(&[BLACK, RED, GREEN, BLUE]);
        let reloaded = Palette::exact_with_preload(&[BLACK, RED, GREEN, BLUE], source.mapping());
        assert_eq!(reloaded.mapping(), source.mapping());
    }

    #[test]
    fn test_preload_rejects_out_of_range() {
        let bogus = vec![9u8; RGB555_SIZE];
        let p = Palette::exact_with_preload(&[BLACK, WHITE], &bogus);
        // Fill ran instead: every byte must be a valid index.
        assert!(p.mapping().iter().all(|&b| (b as usize) < p.color_count()));
        assert_eq!(p.nearest_index(250, 250, 250), 1);
    }

    #[test]
    fn test_population_bias_formula() {
        for n in [2usize, 16, 64, 256] {
            let colors: Vec<u32> =
                (0..n).map(|i| color::rgba((i * 97 % 256) as u8, (i * 31) as u8, i as u8, 0xFF))
                    .collect();
            let p = Palette::exact(&colors);
            let expected = (-1.375 / p.color_count() as f32).exp();
            assert!(
                (p.population_bias() - expected).abs() / expected < 1e-6,
                "bias for {n} colors"
            );
        }
    }

    #[test]
    fn test_mapping_always_valid() {
        let p = Palette::exact(&[BLACK, RED, GREEN, BLUE, WHITE]);
        assert!(p.mapping().iter().all(|&b| (b as usize) < p.color_count()));
    }

    #[test]
    fn test_palette_is_fixed_point_of_its_map() {
        let p = Palette::exact(&[BLACK, RED, GREEN, BLUE, WHITE]);
        for (i, &c) in p.colors().iter().enumerate() {
            assert_eq!(
                p.mapping()[shrink(c) as usize] as usize,
                i,
                "entry {i} ({c:08X}) not a fixed point"
            );
        }
    }

    #[test]
    fn test_analyze_reserves_transparent_slot() {
        let frame = [RED, RED, RED, TRANSPARENT];
        let p = Palette::analyze(&[&frame], 100.0, 16);
        assert!(p.has_transparent_slot());
        assert_eq!(p.colors()[0], TRANSPARENT);
        // RED survives (masked to 5-bit resolution, alpha forced opaque).
        assert!(p.colors()[1..].iter().any(|&c| c & 0xF8F8F8FF == 0xF80000FF));
    }

    #[test]
    fn test_transparent_slot_never_claims_cell_zero() {
        // Opaque near-black shrinks to RGB555 cell 0, the same cell as
        // the transparent entry. The opaque black entry must own it.
        let frame = [BLACK, 0x050505FF, RED, TRANSPARENT];
        for (name, p) in [
            ("analyze", Palette::analyze(&[&frame], 100.0, 8)),
            ("analyze_fast", Palette::analyze_fast(&[&frame], 100.0, 8)),
        ] {
            assert!(p.has_transparent_slot(), "{name}");
            let idx = p.nearest_index(0, 0, 0);
            assert_ne!(idx, 0, "{name}: cell 0 claimed by the transparent slot");
            assert_eq!(p.colors()[idx as usize], BLACK, "{name}");
            assert!(
                p.mapping().iter().all(|&b| b != 0),
                "{name}: transparent index leaked into the map"
            );
        }
    }

    #[test]
    fn test_analyze_opaque_source_has_no_transparent_slot() {
        let frame = [RED, GREEN, BLUE, WHITE];
        let p = Palette::analyze(&[&frame], 100.0, 16);
        assert!(!p.has_transparent_slot());
        assert_eq!(p.color_count(), 4);
    }

    #[test]
    fn test_analyze_respects_admission_threshold() {
        // 500 distinct colors, evenly spread.
        let frame: Vec<u32> = (0..500)
            .map(|i| {
                let r = (i * 13 % 256) as u8;
                let g = (i * 89 % 256) as u8;
                let b = (i * 41 % 256) as u8;
                color::rgba(r, g, b, 0xFF)
            })
            .collect();
        let threshold = 150.0;
        let limit = 16usize;
        let p = Palette::analyze(&[&frame], threshold, limit);
        assert_eq!(p.color_count(), limit);

        let spacing = threshold / ((limit as f64).powf(1.5) * 0.00105);
        for (i, &a) in p.colors().iter().enumerate() {
            for &b in &p.colors()[i + 1..] {
                assert!(
                    p.difference(a, b) >= spacing,
                    "{a:08X} and {b:08X} closer than {spacing}"
                );
            }
        }
    }

    #[test]
    fn test_analyze_fast_mapping_matches_seeds_and_is_total() {
        let frame: Vec<u32> = (0..4096)
            .map(|i| color::rgba((i % 256) as u8, (i / 16 % 256) as u8, (i * 7 % 256) as u8, 0xFF))
            .collect();
        let p = Palette::analyze_fast(&[&frame], 100.0, 32);
        assert!(p.mapping().iter().all(|&b| (b as usize) < p.color_count()));
        for (i, &c) in p.colors().iter().enumerate() {
            let key = shrink(c) as usize;
            // Seeds keep their own index unless two entries share a key.
            if p.colors().iter().position(|&o| shrink(o) == key as u16) == Some(i) {
                assert_eq!(p.mapping()[key] as usize, i);
            }
        }
    }

    #[test]
    fn test_median_cut_hits_limit() {
        let frame: Vec<u32> = (0..1000)
            .map(|i| color::rgba((i % 256) as u8, (i * 3 % 256) as u8, (i * 7 % 256) as u8, 0xFF))
            .collect();
        let p = Palette::analyze_median_cut(&frame, 8);
        assert!(p.color_count() <= 8);
        assert!(p.color_count() >= 2);
        assert!(p.mapping().iter().all(|&b| (b as usize) < p.color_count()));
    }

    #[test]
    fn test_median_cut_solid_input() {
        let frame = vec![RED; 64];
        let p = Palette::analyze_median_cut(&frame, 8);
        assert_eq!(p.nearest_entry(255, 0, 0), RED);
    }

    #[test]
    fn test_alter_lightness_rebuilds_mapping() {
        let mut p = Palette::exact(&[BLACK, 0x808080FF, WHITE]);
        p.alter_lightness(0.5, 0.0);
        assert!(p.mapping().iter().all(|&b| (b as usize) < p.color_count()));
        // Darkening the palette must not brighten any entry.
        assert!(p.colors().iter().all(|&c| color::red(c) <= 0x90));
    }

    #[test]
    fn test_hue_shift_preserves_grey_axis() {
        let mut p = Palette::exact(&[BLACK, 0x808080FF, WHITE]);
        let before = p.colors().to_vec();
        p.hue_shift(90.0);
        for (b, a) in before.iter().zip(p.colors()) {
            let db = (color::red(*b) as i32 - color::red(*a) as i32).abs();
            assert!(db <= 2, "grey moved: {b:08X} -> {a:08X}");
        }
    }

    #[test]
    fn test_dither_strength_clamps_negative() {
        let mut p = Palette::exact(&[BLACK, WHITE]);
        p.set_dither_strength(-2.0);
        assert_eq!(p.dither_strength(), 0.0);
    }
}
