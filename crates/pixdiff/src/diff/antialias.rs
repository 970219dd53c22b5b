//! Anti-aliasing detection over a 3x3 neighbourhood.
//!
//! A changed pixel is treated as an edge-smoothing artifact when, in one
//! image, it sits between a darker and a brighter neighbour and those
//! extreme neighbours belong to flat regions in *both* images.

use image::RgbaImage;

use super::yiq::brightness_delta;

#[inline]
fn px(img: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
    img.get_pixel(x, y).0
}

/// Inclusive bounds of the 3x3 window around `(x, y)`, clipped to the image.
#[inline]
fn window(x: u32, y: u32, w: u32, h: u32) -> (u32, u32, u32, u32) {
    (
        x.saturating_sub(1),
        y.saturating_sub(1),
        (x + 1).min(w - 1),
        (y + 1).min(h - 1),
    )
}

#[inline]
fn on_edge(x: u32, y: u32, w: u32, h: u32) -> bool {
    x == 0 || y == 0 || x == w - 1 || y == h - 1
}

/// Whether pixel `(x, y)` of `img` looks anti-aliased relative to `other`.
///
/// Both images must share dimensions and contain `(x, y)`.
pub fn is_antialiased(img: &RgbaImage, other: &RgbaImage, x: u32, y: u32) -> bool {
    let (w, h) = img.dimensions();
    let (x0, y0, x2, y2) = window(x, y, w, h);
    let center = px(img, x, y);

    let mut zeroes = u32::from(on_edge(x, y, w, h));
    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = (0, 0);
    let mut max_at = (0, 0);

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            let delta = brightness_delta(center, px(img, nx, ny));
            if delta == 0.0 {
                zeroes += 1;
                // More than two identical neighbours: part of a flat area.
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_at = (nx, ny);
            } else if delta > max {
                max = delta;
                max_at = (nx, ny);
            }
        }
    }

    // Needs both a darker and a brighter neighbour.
    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_at) && has_many_siblings(other, min_at))
        || (has_many_siblings(img, max_at) && has_many_siblings(other, max_at))
}

/// Whether the pixel at `at` has more than two identical neighbours.
fn has_many_siblings(img: &RgbaImage, (x, y): (u32, u32)) -> bool {
    let (w, h) = img.dimensions();
    let (x0, y0, x2, y2) = window(x, y, w, h);
    let center = px(img, x, y);

    let mut zeroes = u32::from(on_edge(x, y, w, h));
    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            if px(img, nx, ny) == center {
                zeroes += 1;
                if zeroes > 2 {
                    return true;
                }
            }
        }
    }
    false
}
