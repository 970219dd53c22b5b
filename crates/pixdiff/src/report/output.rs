use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use pixdiff::codec::EncodedImage;
use pixdiff::compare::Comparison;

/// Write `current.<ext>`, `previous.<ext>` and `diff.png` into `dir`,
/// skipping whichever payloads are absent. Returns the written paths.
pub fn write_artifacts(dir: &Path, c: &Comparison) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for (stem, image) in [
        ("current", &c.current),
        ("previous", &c.previous),
        ("diff", &c.diff),
    ] {
        let Some(image) = image else { continue };
        let path = dir.join(format!("{stem}.{}", image.extension()));
        std::fs::write(&path, &image.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Per-file artifact directory for batch runs: `out/<relative path>/`.
///
/// Root and parent components are dropped so the result always stays
/// under `out`.
pub fn artifact_dir(out: &Path, file: &Path) -> PathBuf {
    let mut dir = out.to_path_buf();
    for component in file.components() {
        if let Component::Normal(part) = component {
            dir.push(part);
        }
    }
    dir
}

#[derive(Debug, Serialize)]
pub struct DimensionReport {
    pub previous: [u32; 2],
    pub current: [u32; 2],
}

/// Machine-readable form of a [`Comparison`]; images are embedded as
/// data URIs.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub current_label: String,
    pub previous_label: String,
    pub current: Option<String>,
    pub previous: Option<String>,
    pub diff: Option<String>,
    pub diff_pixels: Option<u64>,
    pub total_pixels: u64,
    pub score: Option<f64>,
    pub dimension_change: Option<DimensionReport>,
    /// Why the diff is missing, if it is.
    pub message: Option<String>,
}

impl From<&Comparison> for JsonReport {
    fn from(c: &Comparison) -> Self {
        Self {
            current_label: c.labels.current.clone(),
            previous_label: c.labels.previous.clone(),
            current: c.current.as_ref().map(EncodedImage::data_uri),
            previous: c.previous.as_ref().map(EncodedImage::data_uri),
            diff: c.diff.as_ref().map(EncodedImage::data_uri),
            diff_pixels: c.diff_pixels,
            total_pixels: c.total_pixels,
            score: c.score(),
            dimension_change: c.dimension_change.map(|d| DimensionReport {
                previous: [d.previous.0, d.previous.1],
                current: [d.current.0, d.current.1],
            }),
            message: c.diff_unavailable.as_ref().map(ToString::to_string),
        }
    }
}

pub fn to_json(c: &Comparison) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport::from(c)).context("Failed to serialize report")
}
