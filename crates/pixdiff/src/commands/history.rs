use std::path::Path;

use anyhow::Result;
use pixdiff::compare::compare_with_history;
use pixdiff::config::ResolvedConfig;
use pixdiff::history::Backend;

/// `pixdiff history`: diff a working-tree file against an earlier revision.
pub async fn history(
    config: ResolvedConfig,
    file: &Path,
    repo: Option<&Path>,
    out: Option<&Path>,
    json: bool,
) -> Result<i32> {
    let backend = Backend::new(config.backend, config.max_blob_bytes);
    let c = compare_with_history(&backend, file, repo, &config.revision, &config.diff).await?;
    super::finish(&file.display().to_string(), &c, out, json)
}
