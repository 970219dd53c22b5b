//! Padding of differently sized images onto a shared canvas.

use image::{RgbaImage, imageops};

/// Bring two images onto a common canvas: the bounding box of both.
///
/// Each image is anchored at the top-left corner; uncovered area stays fully
/// transparent (all-zero RGBA). Nothing is scaled or cropped. Inputs that
/// already share dimensions are returned untouched.
pub fn normalize(a: RgbaImage, b: RgbaImage) -> (RgbaImage, RgbaImage) {
    if a.dimensions() == b.dimensions() {
        return (a, b);
    }

    let w = a.width().max(b.width());
    let h = a.height().max(b.height());
    (pad_to(&a, w, h), pad_to(&b, w, h))
}

/// Copy `src` onto a transparent canvas of `w x h`, anchored at top-left.
///
/// Uses `replace`, not `overlay`: translucent source pixels must keep their
/// exact values rather than being composited onto the canvas.
fn pad_to(src: &RgbaImage, w: u32, h: u32) -> RgbaImage {
    if src.dimensions() == (w, h) {
        return src.clone();
    }
    let mut canvas = RgbaImage::new(w, h);
    imageops::replace(&mut canvas, src, 0, 0);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn equal_sizes_pass_through() {
        let a = RgbaImage::from_pixel(3, 2, Rgba([1, 1, 1, 255]));
        let b = RgbaImage::from_pixel(3, 2, Rgba([2, 2, 2, 255]));
        let (na, nb) = normalize(a.clone(), b.clone());
        assert_eq!(na, a);
        assert_eq!(nb, b);
    }

    #[test]
    fn pads_smaller_image_with_transparency() {
        let wide = RgbaImage::from_pixel(20, 10, Rgba([255, 0, 0, 255]));
        let small = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let (na, nb) = normalize(wide.clone(), small);

        assert_eq!(na.dimensions(), (20, 10));
        assert_eq!(nb.dimensions(), (20, 10));
        assert_eq!(na, wide);
        for (x, _, p) in nb.enumerate_pixels() {
            if x < 10 {
                assert_eq!(*p, Rgba([255, 0, 0, 255]));
            } else {
                assert_eq!(*p, CLEAR);
            }
        }
    }

    #[test]
    fn canvas_is_elementwise_max() {
        // Neither image contains the other: 5x2 and 2x7 -> 5x7.
        let a = RgbaImage::from_pixel(5, 2, Rgba([9, 9, 9, 255]));
        let b = RgbaImage::from_pixel(2, 7, Rgba([7, 7, 7, 255]));
        let (na, nb) = normalize(a, b);
        assert_eq!(na.dimensions(), (5, 7));
        assert_eq!(nb.dimensions(), (5, 7));
        assert_eq!(*na.get_pixel(4, 1), Rgba([9, 9, 9, 255]));
        assert_eq!(*na.get_pixel(4, 6), CLEAR);
        assert_eq!(*nb.get_pixel(1, 6), Rgba([7, 7, 7, 255]));
        assert_eq!(*nb.get_pixel(4, 0), CLEAR);
    }

    #[test]
    fn translucent_pixels_are_copied_exactly() {
        let a = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 128]));
        let b = RgbaImage::new(3, 3);
        let (na, _) = normalize(a, b);
        assert_eq!(*na.get_pixel(1, 1), Rgba([200, 100, 50, 128]));
        assert_eq!(*na.get_pixel(2, 2), CLEAR);
    }

    #[test]
    fn zero_area_side_becomes_blank_canvas() {
        let a = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let empty = RgbaImage::new(0, 0);
        let (na, nb) = normalize(a.clone(), empty);
        assert_eq!(na, a);
        assert_eq!(nb.dimensions(), (4, 4));
        assert!(nb.pixels().all(|p| *p == CLEAR));
    }

    proptest! {
        #[test]
        fn normalized_dimensions_match(aw in 0u32..16, ah in 0u32..16, bw in 0u32..16, bh in 0u32..16) {
            let (na, nb) = normalize(RgbaImage::new(aw, ah), RgbaImage::new(bw, bh));
            prop_assert_eq!(na.dimensions(), nb.dimensions());
            prop_assert_eq!(na.dimensions(), (aw.max(bw), ah.max(bh)));
        }
    }
}
