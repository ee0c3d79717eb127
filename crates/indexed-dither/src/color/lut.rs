//! Process-wide color lookup tables.
//!
//! All tables are built exactly once, on first access, and shared by every
//! palette in the process. Per-key storage covers the full 15-bit RGB555
//! space so that nearest-color work never converts a color twice.
//!
//! The Oklab tables use the matrices from Björn Ottosson's reference
//! formulation, with two deliberate deviations that define this crate's
//! working space:
//!
//! - the sRGB decode is approximated by squaring the normalized channel
//!   (gamma 2), and
//! - lightness is warped by `L -> L^1.5`, which spreads dark tones so that
//!   squared-distance matching stops crushing shadows.
//!
//! With both applied, the warped lightness of a pure grey `v` is exactly
//! `v / 255`, which keeps threshold-style reasoning simple.

use once_cell::sync::Lazy;

use super::rgb::{rgba, RGB555_SIZE};

/// 8-bit sRGB value to 10-bit linear light, `0..=1023`.
pub fn to_linear(v: u8) -> i32 {
    TABLES.to_linear[v as usize]
}

/// 10-bit linear light back to an 8-bit sRGB value.
///
/// The index is clamped, so callers may add signed adjustments in linear
/// units without pre-checking the range.
pub fn from_linear(idx: i32) -> u8 {
    TABLES.from_linear[idx.clamp(0, 1023) as usize]
}

/// Warped Oklab (L', A, B) for an RGB555 key.
#[inline]
pub fn oklab(key: u16) -> [f32; 3] {
    let t = &*TABLES;
    [
        t.oklab_l[key as usize],
        t.oklab_a[key as usize],
        t.oklab_b[key as usize],
    ]
}

/// IPT (I, P, T) for an RGB555 key.
#[inline]
pub fn ipt(key: u16) -> [f64; 3] {
    let t = &*TABLES;
    [
        t.ipt_i[key as usize],
        t.ipt_p[key as usize],
        t.ipt_t[key as usize],
    ]
}

struct ColorTables {
    to_linear: [i32; 256],
    from_linear: [u8; 1024],
    oklab_l: Vec<f32>,
    oklab_a: Vec<f32>,
    oklab_b: Vec<f32>,
    ipt_i: Vec<f64>,
    ipt_p: Vec<f64>,
    ipt_t: Vec<f64>,
}

static TABLES: Lazy<ColorTables> = Lazy::new(build_tables);

/// IEC 61966-2-1 sRGB decode.
fn srgb_to_linear_exact(srgb: f64) -> f64 {
    if srgb <= 0.04045 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

/// IEC 61966-2-1 sRGB encode.
fn linear_to_srgb_exact(linear: f64) -> f64 {
    if linear <= 0.0031308 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// Warped Oklab from normalized sRGB channels.
///
/// Gamma-2 decode, Ottosson M1, cube root, Ottosson M2, then the
/// `L -> L^1.5` lightness warp.
pub(crate) fn oklab_from_rgb(r: f32, g: f32, b: f32) -> [f32; 3] {
    let lr = r * r;
    let lg = g * g;
    let lb = b * b;

    let l = 0.4122214708 * lr + 0.5363325363 * lg + 0.0514459929 * lb;
    let m = 0.2119034982 * lr + 0.6806995451 * lg + 0.1073969566 * lb;
    let s = 0.0883024619 * lr + 0.2817188376 * lg + 0.6299787005 * lb;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    let lab_l = 0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_;
    let lab_a = 1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_;
    let lab_b = 0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_;

    [(lab_l.max(0.0)).powf(1.5), lab_a, lab_b]
}

/// Inverse of [`oklab_from_rgb`], producing an opaque RGBA8888 word.
///
/// Out-of-gamut results are clamped per channel. Used by the palette
/// alteration helpers, not by the per-pixel hot path.
pub(crate) fn oklab_to_rgba(l_warped: f32, a: f32, b: f32) -> u32 {
    let l = l_warped.max(0.0).powf(2.0 / 3.0);

    let l_ = l + 0.3963377774 * a + 0.2158037573 * b;
    let m_ = l - 0.1055613458 * a - 0.0638541728 * b;
    let s_ = l - 0.0894841775 * a - 1.2914855480 * b;

    let lin_l = l_ * l_ * l_;
    let lin_m = m_ * m_ * m_;
    let lin_s = s_ * s_ * s_;

    let lr = 4.0767416621 * lin_l - 3.3077115913 * lin_m + 0.2309699292 * lin_s;
    let lg = -1.2684380046 * lin_l + 2.6097574011 * lin_m - 0.3413193965 * lin_s;
    let lb = -0.0041960863 * lin_l - 0.7034186147 * lin_m + 1.7076147010 * lin_s;

    // Undo the gamma-2 decode.
    let to_byte = |lin: f32| (lin.max(0.0).sqrt().min(1.0) * 255.0 + 0.5) as u8;
    rgba(to_byte(lr), to_byte(lg), to_byte(lb), 0xFF)
}

/// IPT from normalized sRGB channels: gamma-2 decode, sRGB-to-XYZ (D65),
/// Hunt-Pointer-Estevez LMS, `|x|^0.43` compression, IPT matrix.
fn ipt_from_rgb(r: f64, g: f64, b: f64) -> [f64; 3] {
    let lr = r * r;
    let lg = g * g;
    let lb = b * b;

    let x = 0.4124564 * lr + 0.3575761 * lg + 0.1804375 * lb;
    let y = 0.2126729 * lr + 0.7151522 * lg + 0.0721750 * lb;
    let z = 0.0193339 * lr + 0.1191920 * lg + 0.9503041 * lb;

    let l = 0.4002 * x + 0.7075 * y - 0.0807 * z;
    let m = -0.2280 * x + 1.1500 * y + 0.0612 * z;
    let s = 0.9184 * z;

    let f = |v: f64| v.abs().powf(0.43).copysign(v);
    let lp = f(l);
    let mp = f(m);
    let sp = f(s);

    [
        0.4000 * lp + 0.4000 * mp + 0.2000 * sp,
        4.4550 * lp - 4.8510 * mp + 0.3960 * sp,
        0.8056 * lp + 0.3572 * mp - 1.1628 * sp,
    ]
}

fn build_tables() -> ColorTables {
    let mut to_linear = [0i32; 256];
    for (v, slot) in to_linear.iter_mut().enumerate() {
        *slot = (srgb_to_linear_exact(v as f64 / 255.0) * 1023.0).round() as i32;
    }

    let mut from_linear = [0u8; 1024];
    for (i, slot) in from_linear.iter_mut().enumerate() {
        *slot = (linear_to_srgb_exact(i as f64 / 1023.0) * 255.0).round() as u8;
    }

    let mut oklab_l = vec![0.0f32; RGB555_SIZE];
    let mut oklab_a = vec![0.0f32; RGB555_SIZE];
    let mut oklab_b = vec![0.0f32; RGB555_SIZE];
    let mut ipt_i = vec![0.0f64; RGB555_SIZE];
    let mut ipt_p = vec![0.0f64; RGB555_SIZE];
    let mut ipt_t = vec![0.0f64; RGB555_SIZE];

    for key in 0..RGB555_SIZE as u16 {
        let word = super::rgb::stretch(key);
        let r = super::rgb::red(word) as f32 / 255.0;
        let g = super::rgb::green(word) as f32 / 255.0;
        let b = super::rgb::blue(word) as f32 / 255.0;

        let lab = oklab_from_rgb(r, g, b);
        oklab_l[key as usize] = lab[0];
        oklab_a[key as usize] = lab[1];
        oklab_b[key as usize] = lab[2];

        let ipt = ipt_from_rgb(r as f64, g as f64, b as f64);
        ipt_i[key as usize] = ipt[0];
        ipt_p[key as usize] = ipt[1];
        ipt_t[key as usize] = ipt[2];
    }

    ColorTables {
        to_linear,
        from_linear,
        oklab_l,
        oklab_a,
        oklab_b,
        ipt_i,
        ipt_p,
        ipt_t,
    }
}
