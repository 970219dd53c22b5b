//! Pixel-by-pixel comparison of two equally sized images.

mod antialias;
mod yiq;

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::antialias::is_antialiased;
pub use self::yiq::{MAX_YIQ_POSSIBLE_DELTA, color_delta};

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("dimension mismatch: {left_w}x{left_h} vs {right_w}x{right_h}")]
    DimensionMismatch {
        left_w: u32,
        left_h: u32,
        right_w: u32,
        right_h: u32,
    },
}

/// An opaque RGB colour. Parses `r,g,b` or `#rrggbb`; serializes as
/// `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const RED: Rgb = Rgb([255, 0, 0]);

    fn rgba(self) -> [u8; 4] {
        let [r, g, b] = self.0;
        [r, g, b, 255]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(format!("expected #rrggbb, got {s:?}"));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("{s:?}: {e}"))
            };
            return Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]));
        }

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(format!("expected r,g,b or #rrggbb, got {s:?}"));
        };
        let channel = |v: &str| v.parse::<u8>().map_err(|e| format!("{s:?}: {e}"));
        Ok(Rgb([channel(*r)?, channel(*g)?, channel(*b)?]))
    }
}

/// Knobs for a single comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffOptions {
    /// Colour tolerance in `[0, 1]`; 0 requires exact matches.
    pub threshold: f64,
    /// Count anti-aliased pixels as differences.
    pub include_anti_aliasing: bool,
    /// Opacity of the unchanged-pixel underlay in the diff image.
    pub alpha: f64,
    pub diff_color: Rgb,
    /// Marker for anti-aliased pixels. `None` renders them like the rest
    /// of their class.
    pub anti_alias_color: Option<Rgb>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            include_anti_aliasing: false,
            alpha: 0.1,
            diff_color: Rgb::RED,
            anti_alias_color: None,
        }
    }
}

impl DiffOptions {
    /// Squared YIQ distance above which two pixels differ.
    pub fn max_delta(&self) -> f64 {
        MAX_YIQ_POSSIBLE_DELTA * self.threshold * self.threshold
    }
}

pub struct DiffOutput {
    /// Visualization: faded greyscale underlay with changes highlighted.
    pub image: RgbaImage,
    pub diff_pixels: u64,
}

impl DiffOutput {
    pub fn total_pixels(&self) -> u64 {
        self.image.width() as u64 * self.image.height() as u64
    }

    /// 0.0 = identical, 1.0 = every pixel differs.
    pub fn score(&self) -> f64 {
        match self.total_pixels() {
            0 => 0.0,
            total => self.diff_pixels as f64 / total as f64,
        }
    }
}

/// Compare `a` against `b` and render the difference on top of `a`.
///
/// Both images must have been normalized to the same size; a mismatch is a
/// caller bug and reported as `DiffError::DimensionMismatch`. Rows are
/// classified in parallel; the output does not depend on scheduling.
pub fn diff(a: &RgbaImage, b: &RgbaImage, opts: &DiffOptions) -> Result<DiffOutput, DiffError> {
    if a.dimensions() != b.dimensions() {
        return Err(DiffError::DimensionMismatch {
            left_w: a.width(),
            left_h: a.height(),
            right_w: b.width(),
            right_h: b.height(),
        });
    }

    let (w, h) = a.dimensions();
    if w == 0 || h == 0 {
        return Ok(DiffOutput {
            image: RgbaImage::new(w, h),
            diff_pixels: 0,
        });
    }
    let mut out = vec![0u8; a.as_raw().len()];

    // Byte-identical: nothing to classify.
    if a.as_raw() == b.as_raw() {
        out.par_chunks_mut(w as usize * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w {
                    put(row, x, grey(a, x, y as u32, opts.alpha));
                }
            });
        return Ok(DiffOutput {
            image: into_image(w, h, out),
            diff_pixels: 0,
        });
    }

    let max_delta = opts.max_delta();
    let diff_pixels = out
        .par_chunks_mut(w as usize * 4)
        .enumerate()
        .map(|(y, row)| diff_row(a, b, y as u32, row, max_delta, opts))
        .sum::<u64>();

    Ok(DiffOutput {
        image: into_image(w, h, out),
        diff_pixels,
    })
}

/// Classify and render one row, returning its differing-pixel count.
fn diff_row(
    a: &RgbaImage,
    b: &RgbaImage,
    y: u32,
    row: &mut [u8],
    max_delta: f64,
    opts: &DiffOptions,
) -> u64 {
    let mut count = 0;
    for x in 0..a.width() {
        let pa = a.get_pixel(x, y).0;
        let pb = b.get_pixel(x, y).0;

        if pa == pb || color_delta(pa, pb).abs() <= max_delta {
            put(row, x, grey(a, x, y, opts.alpha));
            continue;
        }

        let anti_aliased = is_antialiased(a, b, x, y) || is_antialiased(b, a, x, y);
        let pixel = match (anti_aliased, opts.include_anti_aliasing) {
            (true, false) => match opts.anti_alias_color {
                Some(color) => color.rgba(),
                None => grey(a, x, y, opts.alpha),
            },
            (true, true) => {
                count += 1;
                opts.anti_alias_color.unwrap_or(opts.diff_color).rgba()
            }
            (false, _) => {
                count += 1;
                opts.diff_color.rgba()
            }
        };
        put(row, x, pixel);
    }
    count
}

#[inline]
fn grey(img: &RgbaImage, x: u32, y: u32, alpha: f64) -> [u8; 4] {
    let v = yiq::faded_luma(img.get_pixel(x, y).0, alpha);
    [v, v, v, 255]
}

#[inline]
fn put(row: &mut [u8], x: u32, pixel: [u8; 4]) {
    let i = x as usize * 4;
    row[i..i + 4].copy_from_slice(&pixel);
}

fn into_image(w: u32, h: u32, raw: Vec<u8>) -> RgbaImage {
    // Length is w * h * 4 by construction.
    RgbaImage::from_raw(w, h, raw).unwrap_or_else(|| RgbaImage::new(w, h))
}
