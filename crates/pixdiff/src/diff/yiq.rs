//! Perceptual colour distance in YIQ space.

/// Largest delta `color_delta` can return (opaque black vs opaque white).
pub const MAX_YIQ_POSSIBLE_DELTA: f64 = 35215.0;

const Y_WEIGHT: f64 = 0.5053;
const I_WEIGHT: f64 = 0.299;
const Q_WEIGHT: f64 = 0.1957;

#[inline]
fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.298_895_31 + g * 0.586_622_47 + b * 0.114_482_23
}

#[inline]
fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.595_977_99 - g * 0.274_176_10 - b * 0.321_801_89
}

#[inline]
fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.211_470_17 - g * 0.522_617_11 + b * 0.311_146_94
}

/// Blend a channel toward white by `alpha` (0 = white, 1 = unchanged).
#[inline]
pub fn blend(c: f64, alpha: f64) -> f64 {
    255.0 + (c - 255.0) * alpha
}

/// Composite a pixel onto white, returning RGB.
#[inline]
fn flatten(p: [u8; 4]) -> (f64, f64, f64) {
    let (r, g, b) = (p[0] as f64, p[1] as f64, p[2] as f64);
    if p[3] == 255 {
        return (r, g, b);
    }
    let a = p[3] as f64 / 255.0;
    (blend(r, a), blend(g, a), blend(b, a))
}

/// Signed squared YIQ distance between two pixels.
///
/// Computed on the gamma-encoded sRGB values, matching pixelmatch, so
/// thresholds carry over from tools built on it.
///
/// Negative when `a` is brighter than `b`. Callers comparing against a
/// cutoff use the absolute value.
pub fn color_delta(a: [u8; 4], b: [u8; 4]) -> f64 {
    if a == b {
        return 0.0;
    }
    let (r1, g1, b1) = flatten(a);
    let (r2, g2, b2) = flatten(b);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;
    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

    let delta = Y_WEIGHT * y * y + I_WEIGHT * i * i + Q_WEIGHT * q * q;
    if y1 > y2 { -delta } else { delta }
}

/// Brightness-only difference `luma(a) - luma(b)`, used by anti-aliasing
/// detection.
pub fn brightness_delta(a: [u8; 4], b: [u8; 4]) -> f64 {
    if a == b {
        return 0.0;
    }
    let (r1, g1, b1) = flatten(a);
    let (r2, g2, b2) = flatten(b);
    rgb2y(r1, g1, b1) - rgb2y(r2, g2, b2)
}

/// Grey value for an unchanged pixel: its luma faded toward white.
pub fn faded_luma(p: [u8; 4], alpha: f64) -> u8 {
    let y = rgb2y(p[0] as f64, p[1] as f64, p[2] as f64);
    let v = blend(y, alpha * p[3] as f64 / 255.0);
    v.round().clamp(0.0, 255.0) as u8
}
