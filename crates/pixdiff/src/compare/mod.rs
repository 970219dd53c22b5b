pub mod pipeline;

use std::fmt;

use tracing::{debug, warn};

use crate::codec::{self, DecodeError, EncodedImage};
use crate::diff::{self, DiffOptions};
use crate::normalize::normalize;

pub use self::pipeline::{compare_files, compare_with_history};

/// Human-readable names for the two sides of a comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    pub current: String,
    pub previous: String,
}

impl Labels {
    pub fn for_revision(revision: impl fmt::Display) -> Self {
        Self {
            current: "Current".to_owned(),
            previous: format!("Previous Commit ({revision})"),
        }
    }
}

/// One comparison's input. Consumed by [`compare`].
pub struct ComparisonRequest {
    pub current: Vec<u8>,
    pub previous: Option<Vec<u8>>,
    pub labels: Labels,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Current,
    Previous,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Current => "current",
            Side::Previous => "previous",
        })
    }
}

/// Canvas sizes before normalization, when they differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DimensionChange {
    pub previous: (u32, u32),
    pub current: (u32, u32),
}

impl fmt::Display for DimensionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (pw, ph) = self.previous;
        let (cw, ch) = self.current;
        write!(f, "{pw}x{ph} -> {cw}x{ch}")
    }
}

/// Why a comparison has no diff image.
#[derive(Debug)]
pub enum DiffUnavailable {
    NoPreviousVersion,
    Undecodable { side: Side, error: DecodeError },
    EncodeFailed(image::ImageError),
}

impl fmt::Display for DiffUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPreviousVersion => f.write_str("no previous version available"),
            Self::Undecodable { side, error } => {
                write!(f, "{side} image cannot be diffed: {error}")
            }
            Self::EncodeFailed(e) => write!(f, "failed to encode diff image: {e}"),
        }
    }
}

/// Everything the viewer needs for one file.
#[derive(Debug)]
pub struct Comparison {
    pub labels: Labels,
    /// `None` only when the current bytes are not a displayable image.
    pub current: Option<EncodedImage>,
    pub previous: Option<EncodedImage>,
    pub diff: Option<EncodedImage>,
    pub diff_pixels: Option<u64>,
    pub total_pixels: u64,
    pub dimension_change: Option<DimensionChange>,
    pub diff_unavailable: Option<DiffUnavailable>,
}

impl Comparison {
    pub fn has_differences(&self) -> bool {
        self.diff_pixels.is_some_and(|n| n > 0)
    }

    /// Fraction of differing pixels, when a diff was computed.
    pub fn score(&self) -> Option<f64> {
        let n = self.diff_pixels?;
        Some(match self.total_pixels {
            0 => 0.0,
            total => n as f64 / total as f64,
        })
    }
}

/// Decode → normalize → diff → encode, degrading instead of failing.
///
/// * no previous bytes: only `current` is populated;
/// * either side not diffable: both payloads, no diff;
/// * otherwise all artifacts.
///
/// CPU-bound and synchronous; call via `spawn_blocking` from async code.
pub fn compare(request: ComparisonRequest, options: &DiffOptions) -> Comparison {
    let ComparisonRequest {
        current,
        previous,
        labels,
    } = request;

    let current_image = codec::decode(&current);
    let current_payload = display_payload(current, Side::Current);

    let mut result = Comparison {
        labels,
        current: current_payload,
        previous: None,
        diff: None,
        diff_pixels: None,
        total_pixels: 0,
        dimension_change: None,
        diff_unavailable: None,
    };

    let Some(previous) = previous else {
        debug!("no previous version, current only");
        result.diff_unavailable = Some(DiffUnavailable::NoPreviousVersion);
        return result;
    };

    let previous_image = codec::decode(&previous);
    result.previous = display_payload(previous, Side::Previous);

    let (current_image, previous_image) = match (current_image, previous_image) {
        (Ok(c), Ok(p)) => (c, p),
        (Err(error), _) => {
            result.diff_unavailable = Some(undecodable(Side::Current, error));
            return result;
        }
        (_, Err(error)) => {
            result.diff_unavailable = Some(undecodable(Side::Previous, error));
            return result;
        }
    };

    if current_image.dimensions() != previous_image.dimensions() {
        result.dimension_change = Some(DimensionChange {
            previous: previous_image.dimensions(),
            current: current_image.dimensions(),
        });
    }

    let (current_image, previous_image) = normalize(current_image, previous_image);
    let output = match diff::diff(&current_image, &previous_image, options) {
        Ok(output) => output,
        // normalize() guarantees equal dimensions.
        Err(e) => unreachable!("diff after normalize: {e}"),
    };
    debug!(
        diff_pixels = output.diff_pixels,
        total = output.total_pixels(),
        "diff computed"
    );

    result.total_pixels = output.total_pixels();
    result.diff_pixels = Some(output.diff_pixels);
    match EncodedImage::png(&output.image) {
        Ok(encoded) => result.diff = Some(encoded),
        Err(e) => {
            warn!("failed to encode diff image: {e}");
            result.diff_unavailable = Some(DiffUnavailable::EncodeFailed(e));
        }
    }
    result
}

fn display_payload(bytes: Vec<u8>, side: Side) -> Option<EncodedImage> {
    match EncodedImage::from_bytes(bytes) {
        Ok(encoded) => Some(encoded),
        Err(e) => {
            warn!("{side} image cannot be displayed: {e}");
            None
        }
    }
}

fn undecodable(side: Side, error: DecodeError) -> DiffUnavailable {
    warn!("{side} image cannot be diffed: {error}");
    DiffUnavailable::Undecodable { side, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::{solid_jpeg, solid_png};
    use image::{ImageFormat, Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn request(current: Vec<u8>, previous: Option<Vec<u8>>) -> ComparisonRequest {
        ComparisonRequest {
            current,
            previous,
            labels: Labels::for_revision("HEAD~1"),
        }
    }

    fn decode_diff(c: &Comparison) -> RgbaImage {
        codec::decode(&c.diff.as_ref().expect("diff image").bytes).unwrap()
    }

    #[test]
    fn red_vs_blue_every_pixel_differs() {
        let c = compare(
            request(solid_png(10, 10, RED), Some(solid_png(10, 10, BLUE))),
            &DiffOptions::default(),
        );
        assert_eq!(c.diff_pixels, Some(100));
        assert_eq!(c.total_pixels, 100);
        assert_eq!(c.score(), Some(1.0));
        assert!(c.has_differences());
        assert!(c.diff_unavailable.is_none());
        assert!(decode_diff(&c).pixels().all(|p| *p == RED));
    }

    #[test]
    fn no_history_returns_current_only() {
        let c = compare(request(solid_png(10, 10, RED), None), &DiffOptions::default());
        assert!(c.current.is_some());
        assert!(c.previous.is_none());
        assert!(c.diff.is_none());
        assert!(c.diff_pixels.is_none());
        assert!(!c.has_differences());
        assert!(matches!(
            c.diff_unavailable,
            Some(DiffUnavailable::NoPreviousVersion)
        ));
        assert_eq!(c.labels.previous, "Previous Commit (HEAD~1)");
    }

    #[test]
    fn grown_canvas_counts_padded_region() {
        // Current is twice as wide; overlapping 10x10 region is identical.
        let c = compare(
            request(solid_png(20, 10, RED), Some(solid_png(10, 10, RED))),
            &DiffOptions::default(),
        );
        assert_eq!(c.total_pixels, 200);
        assert_eq!(c.diff_pixels, Some(100));
        assert_eq!(
            c.dimension_change,
            Some(DimensionChange {
                previous: (10, 10),
                current: (20, 10),
            })
        );
        assert_eq!(c.dimension_change.unwrap().to_string(), "10x10 -> 20x10");

        let diff = decode_diff(&c);
        assert_eq!(diff.dimensions(), (20, 10));
        for (x, _, p) in diff.enumerate_pixels() {
            assert_eq!(*p == RED, x >= 10, "pixel at x={x}");
        }
    }

    #[test]
    fn jpeg_previous_is_display_only() {
        let c = compare(
            request(solid_png(8, 8, RED), Some(solid_jpeg(8, 8))),
            &DiffOptions::default(),
        );
        assert!(c.current.is_some());
        assert_eq!(c.previous.as_ref().unwrap().format, ImageFormat::Jpeg);
        assert!(c.diff.is_none());
        assert!(c.diff_pixels.is_none());
        let reason = c.diff_unavailable.unwrap();
        assert!(matches!(
            reason,
            DiffUnavailable::Undecodable {
                side: Side::Previous,
                error: DecodeError::NotDiffable(ImageFormat::Jpeg),
            }
        ));
        assert_eq!(
            reason.to_string(),
            "previous image cannot be diffed: JPEG images can be displayed but not diffed"
        );
    }

    #[test]
    fn corrupt_current_still_shows_previous() {
        let c = compare(
            request(b"garbage".to_vec(), Some(solid_png(4, 4, BLUE))),
            &DiffOptions::default(),
        );
        assert!(c.current.is_none());
        assert!(c.previous.is_some());
        assert!(c.diff.is_none());
        assert!(matches!(
            c.diff_unavailable,
            Some(DiffUnavailable::Undecodable {
                side: Side::Current,
                ..
            })
        ));
    }

    #[test]
    fn identical_versions_have_zero_diff() {
        let png = solid_png(6, 6, BLUE);
        let c = compare(request(png.clone(), Some(png)), &DiffOptions::default());
        assert_eq!(c.diff_pixels, Some(0));
        assert_eq!(c.score(), Some(0.0));
        assert!(!c.has_differences());
        assert!(c.diff.is_some());
    }

    #[test]
    fn payloads_keep_original_bytes() {
        let current = solid_png(3, 3, RED);
        let previous = solid_png(3, 3, BLUE);
        let c = compare(
            request(current.clone(), Some(previous.clone())),
            &DiffOptions::default(),
        );
        assert_eq!(c.current.unwrap().bytes, current);
        assert_eq!(c.previous.unwrap().bytes, previous);
    }
}
