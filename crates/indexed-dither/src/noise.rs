//! Triangular blue-noise tables.
//!
//! Three independent 64x64 grids of signed bytes with a triangular value
//! distribution (peaked at zero, median ~0) and a blue power spectrum, plus
//! exponential multiplier grids derived from them. The grids tile
//! seamlessly on a 64x64 torus.
//!
//! The grids are generated once, at first use, by a deterministic
//! void-and-cluster run: a relaxed prototype pattern is ranked by repeated
//! tightest-cluster removal, then the empty grid cells are ranked by
//! repeated largest-void insertion. Ranks are mapped through the inverse
//! triangular CDF, a monotone transform that preserves the blue spectrum.

use once_cell::sync::Lazy;

const SIZE: usize = 64;
const CELLS: usize = SIZE * SIZE;

/// Gaussian energy spread, in cells. Beyond ~4 sigma the stamp is noise.
const SIGMA: f64 = 1.9;
const STAMP_RADIUS: i32 = 8;

/// Shared triangular blue-noise state.
pub struct NoiseTables {
    tri: [[i8; CELLS]; 3],
    mul: [[f32; CELLS]; 3],
}

static TABLES: Lazy<NoiseTables> = Lazy::new(NoiseTables::generate);

/// Map torus coordinates to a flat grid index.
#[inline]
pub fn grid_index(x: usize, y: usize) -> usize {
    (x & (SIZE - 1)) | ((y & (SIZE - 1)) << 6)
}

/// Triangular blue noise, channel 0, in `-127..=127`.
#[inline]
pub fn tri_a(x: usize, y: usize) -> i32 {
    TABLES.tri[0][grid_index(x, y)] as i32
}

/// Triangular blue noise, channel 1.
#[inline]
pub fn tri_b(x: usize, y: usize) -> i32 {
    TABLES.tri[1][grid_index(x, y)] as i32
}

/// Triangular blue noise, channel 2.
#[inline]
pub fn tri_c(x: usize, y: usize) -> i32 {
    TABLES.tri[2][grid_index(x, y)] as i32
}

/// `exp((tri + 0.5) / 128)` multiplier grid for the given channel.
///
/// Geometric mean ~1, so scaling diffusion errors by it neither grows nor
/// shrinks them on average.
#[inline]
pub fn multiplier(channel: usize, x: usize, y: usize) -> f32 {
    TABLES.mul[channel][grid_index(x, y)]
}

/// Raw channel-0 grid, for statistics and spectrum tests.
pub fn tri_grid(channel: usize) -> &'static [i8; CELLS] {
    &TABLES.tri[channel]
}

impl NoiseTables {
    fn generate() -> Self {
        let seeds = [
            0x9E37_79B9_7F4A_7C15u64,
            0xD1B5_4A32_D192_ED03,
            0x8CB9_2BA7_2F3D_8DD7,
        ];
        let mut tri = [[0i8; CELLS]; 3];
        let mut mul = [[1.0f32; CELLS]; 3];
        for ch in 0..3 {
            let ranks = blue_noise_ranks(seeds[ch]);
            for i in 0..CELLS {
                tri[ch][i] = triangularize(ranks[i]);
            }
            for i in 0..CELLS {
                mul[ch][i] = ((tri[ch][i] as f32 + 0.5) / 128.0).exp();
            }
        }
        NoiseTables { tri, mul }
    }
}

/// Inverse CDF of the symmetric triangular distribution on [-127, 127].
fn triangularize(rank: u16) -> i8 {
    let u = (rank as f64 + 0.5) / CELLS as f64;
    let x = if u < 0.5 {
        (2.0 * u).sqrt() - 1.0
    } else {
        1.0 - (2.0 * (1.0 - u)).sqrt()
    };
    (x * 127.0).round() as i8
}

struct Lcg(u64);

impl Lcg {
    fn next_cell(&mut self) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % CELLS
    }
}

/// Toroidal Gaussian energy field over a binary point pattern.
struct EnergyField {
    energy: Vec<f64>,
    stamp: Vec<f64>,
}

impl EnergyField {
    fn new() -> Self {
        let d = (2 * STAMP_RADIUS + 1) as usize;
        let mut stamp = vec![0.0; d * d];
        for dy in -STAMP_RADIUS..=STAMP_RADIUS {
            for dx in -STAMP_RADIUS..=STAMP_RADIUS {
                let r2 = (dx * dx + dy * dy) as f64;
                stamp[((dy + STAMP_RADIUS) as usize) * d + (dx + STAMP_RADIUS) as usize] =
                    (-r2 / (2.0 * SIGMA * SIGMA)).exp();
            }
        }
        EnergyField {
            energy: vec![0.0; CELLS],
            stamp,
        }
    }

    fn apply(&mut self, cell: usize, sign: f64) {
        let cx = (cell % SIZE) as i32;
        let cy = (cell / SIZE) as i32;
        let d = (2 * STAMP_RADIUS + 1) as usize;
        for dy in -STAMP_RADIUS..=STAMP_RADIUS {
            let y = (cy + dy).rem_euclid(SIZE as i32) as usize;
            for dx in -STAMP_RADIUS..=STAMP_RADIUS {
                let x = (cx + dx).rem_euclid(SIZE as i32) as usize;
                let w = self.stamp
                    [((dy + STAMP_RADIUS) as usize) * d + (dx + STAMP_RADIUS) as usize];
                self.energy[y * SIZE + x] += sign * w;
            }
        }
    }

    /// Extremal-energy cell among cells whose membership equals `want_set`.
    fn extremum(&self, pattern: &[bool], want_set: bool, want_max: bool) -> usize {
        let mut best = usize::MAX;
        let mut best_e = if want_max {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        for (i, &e) in self.energy.iter().enumerate() {
            if pattern[i] != want_set {
                continue;
            }
            if (want_max && e > best_e) || (!want_max && e < best_e) {
                best_e = e;
                best = i;
            }
        }
        best
    }
}

/// Void-and-cluster rank array: every cell gets a unique rank in
/// `0..4096`, spatially ordered so that any rank threshold yields a
/// well-dispersed point set.
fn blue_noise_ranks(seed: u64) -> Vec<u16> {
    let mut rng = Lcg(seed);
    let mut pattern = vec![false; CELLS];
    let mut field = EnergyField::new();

    // Seed ~10% of the cells at random.
    let initial = CELLS / 10;
    let mut placed = 0;
    while placed < initial {
        let cell = rng.next_cell();
        if !pattern[cell] {
            pattern[cell] = true;
            field.apply(cell, 1.0);
            placed += 1;
        }
    }

    // Relax: move the tightest cluster into the largest void until the
    // pattern reaches a fixed point. The iteration cap only guards
    // against a ping-pong cycle; convergence takes a few hundred moves.
    for _ in 0..CELLS {
        let cluster = field.extremum(&pattern, true, true);
        pattern[cluster] = false;
        field.apply(cluster, -1.0);
        let void = field.extremum(&pattern, false, false);
        pattern[void] = true;
        field.apply(void, 1.0);
        if void == cluster {
            break;
        }
    }

    let mut ranks = vec![0u16; CELLS];

    // Phase one: strip the prototype, tightest cluster first; the last
    // point removed gets rank 0.
    {
        let mut p = pattern.clone();
        let mut f = EnergyField::new();
        for (i, &set) in p.iter().enumerate() {
            if set {
                f.apply(i, 1.0);
            }
        }
        for rank in (0..initial).rev() {
            let cluster = f.extremum(&p, true, true);
            p[cluster] = false;
            f.apply(cluster, -1.0);
            ranks[cluster] = rank as u16;
        }
    }

    // Phase two: refill from the prototype, always into the largest void,
    // until the grid is full.
    for rank in initial..CELLS {
        let void = field.extremum(&pattern, false, false);
        pattern[void] = true;
        field.apply(void, 1.0);
        ranks[void] = rank as u16;
    }

    ranks
}
