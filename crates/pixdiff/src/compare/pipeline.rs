use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{Comparison, ComparisonRequest, Labels, compare};
use crate::diff::DiffOptions;
use crate::history::{self, RepositoryContext, Revision, VersionResolver};

/// Compare the file on disk with its content at `revision`.
///
/// A missing current file is an error. Anything that prevents reading the
/// previous version (not a repository, unknown revision, oversized blob)
/// yields a current-only comparison instead.
pub async fn compare_with_history<R: VersionResolver + Sync>(
    resolver: &R,
    current_path: &Path,
    repo_root: Option<&Path>,
    revision: &Revision,
    options: &DiffOptions,
) -> Result<Comparison> {
    let current = read(current_path).await?;

    let previous = match RepositoryContext::discover(current_path, repo_root) {
        Ok(ctx) => history::fetch_previous(resolver, &ctx, revision).await,
        Err(e) => {
            warn!(path = %current_path.display(), "no previous version: {e}");
            None
        }
    };

    let request = ComparisonRequest {
        current,
        previous,
        labels: Labels::for_revision(revision),
    };
    run(request, options).await
}

/// Compare two explicit files. Both must exist.
pub async fn compare_files(
    current_path: &Path,
    previous_path: &Path,
    options: &DiffOptions,
) -> Result<Comparison> {
    let current = read(current_path).await?;
    let previous = read(previous_path).await?;

    let request = ComparisonRequest {
        current,
        previous: Some(previous),
        labels: Labels {
            current: file_label(current_path),
            previous: file_label(previous_path),
        },
    };
    run(request, options).await
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn run(request: ComparisonRequest, options: &DiffOptions) -> Result<Comparison> {
    let options = options.clone();
    debug!(current = %request.labels.current, previous = %request.labels.previous, "comparing");
    tokio::task::spawn_blocking(move || compare(request, &options))
        .await
        .context("Diff task panicked")
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
