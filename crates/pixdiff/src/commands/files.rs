use std::path::Path;

use anyhow::Result;
use pixdiff::compare::compare_files;
use pixdiff::config::ResolvedConfig;

/// `pixdiff files`: diff two images on disk.
pub async fn files(
    config: ResolvedConfig,
    current: &Path,
    previous: &Path,
    out: Option<&Path>,
    json: bool,
) -> Result<i32> {
    let c = compare_files(current, previous, &config.diff).await?;
    let name = format!("{} vs {}", current.display(), previous.display());
    super::finish(&name, &c, out, json)
}
