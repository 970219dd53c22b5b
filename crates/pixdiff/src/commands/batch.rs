use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use pixdiff::compare::compare_with_history;
use pixdiff::config::ResolvedConfig;
use pixdiff::history::Backend;

use crate::report::terminal::{self, Tally};
use crate::report::{Status, output};

/// `pixdiff batch`: compare every matching file with its earlier revision.
/// Returns exit code: 0 = nothing changed, 1 = any difference or error.
pub async fn batch(
    config: ResolvedConfig,
    patterns: &[String],
    repo: Option<&Path>,
    out: Option<&Path>,
) -> Result<i32> {
    let files = expand(patterns)?;
    if files.is_empty() {
        warn!("no files match {}", patterns.join(" "));
        return Ok(0);
    }

    let backend = Backend::new(config.backend, config.max_blob_bytes);
    let run_start = Instant::now();
    let total = files.len();
    debug!(total, parallel = config.parallel, "starting batch");

    let backend = &backend;
    let config = &config;
    let mut results = stream::iter(&files)
        .map(|file| async move {
            let result =
                compare_with_history(backend, file, repo, &config.revision, &config.diff).await;
            (file, result)
        })
        .buffer_unordered(config.parallel);

    let mut tally = Tally::default();
    let mut done = 0usize;
    let mut changed_names = Vec::new();
    let mut errored_names = Vec::new();

    while let Some((file, result)) = results.next().await {
        done += 1;
        let name = file.display().to_string();
        let c = match result {
            Ok(c) => c,
            Err(e) => {
                tally.errored += 1;
                terminal::print_error_line(&name, &format!("{e:#}"));
                errored_names.push(name);
                terminal::show_progress(done, total);
                continue;
            }
        };

        if let Some(out) = out {
            output::write_artifacts(&output::artifact_dir(out, file), &c)?;
        }

        let status = Status::of(&c);
        tally.record(&status);
        if matches!(status, Status::Diff { .. }) {
            changed_names.push(name.clone());
        }
        terminal::print_line(&name, &status);
        terminal::show_progress(done, total);
    }

    changed_names.sort();
    errored_names.sort();
    terminal::print_actionable_summary(&changed_names, &errored_names);
    terminal::print_summary(&tally, run_start.elapsed());
    Ok(tally.exit_code())
}

/// Expand glob patterns into a sorted, de-duplicated list of regular files.
fn expand(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for pattern in patterns {
        let paths = glob::glob(pattern).with_context(|| format!("Invalid pattern {pattern:?}"))?;
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    files.insert(path);
                }
                Ok(_) => {}
                Err(e) => warn!("skipping unreadable path: {e}"),
            }
        }
    }
    Ok(files.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::png;
    use git2::{IndexAddOption, Repository, Signature};
    use pixdiff::config::{CliOverrides, Config, EnvLayer, HistoryConfig};
    use pixdiff::history::BackendKind;
    use tempfile::TempDir;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index.add_all(["*"], IndexAddOption::DEFAULT, None).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    /// `icons/a.png` turns from blue to red; `icons/b.png` stays red.
    fn icon_repo() -> TempDir {
        let temp = TempDir::new().expect("tempdir");
        let repo = Repository::init(temp.path()).unwrap();
        let icons = temp.path().join("icons");
        std::fs::create_dir_all(&icons).unwrap();
        std::fs::write(icons.join("a.png"), png(6, 6, BLUE)).unwrap();
        std::fs::write(icons.join("b.png"), png(6, 6, RED)).unwrap();
        commit_all(&repo, "initial icons");
        std::fs::write(icons.join("a.png"), png(6, 6, RED)).unwrap();
        commit_all(&repo, "recolour a");
        temp
    }

    fn libgit2_config(parallel: usize) -> ResolvedConfig {
        let cli = CliOverrides {
            history: HistoryConfig {
                backend: Some(BackendKind::Libgit2),
                parallel: Some(parallel),
                ..HistoryConfig::default()
            },
            ..CliOverrides::default()
        };
        ResolvedConfig::from_layers(Config::default(), EnvLayer::default(), cli).unwrap()
    }

    #[tokio::test]
    async fn changed_file_fails_the_batch_and_writes_artifacts() {
        let temp = icon_repo();
        let out = TempDir::new().expect("tempdir");
        let pattern = format!("{}/icons/*.png", temp.path().display());

        let code = batch(libgit2_config(2), &[pattern], None, Some(out.path()))
            .await
            .unwrap();
        assert_eq!(code, 1);

        let changed = output::artifact_dir(out.path(), &temp.path().join("icons/a.png"));
        for name in ["current.png", "previous.png", "diff.png"] {
            assert!(changed.join(name).is_file(), "missing {name}");
        }
        assert_eq!(
            std::fs::read(changed.join("previous.png")).unwrap(),
            png(6, 6, BLUE)
        );
        let same = output::artifact_dir(out.path(), &temp.path().join("icons/b.png"));
        assert!(same.join("diff.png").is_file());
    }

    #[tokio::test]
    async fn unchanged_files_pass() {
        let temp = icon_repo();
        let pattern = format!("{}/icons/b.png", temp.path().display());
        let code = batch(libgit2_config(1), &[pattern], None, None).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn files_without_history_do_not_fail_the_run() {
        let temp = icon_repo();
        // An untracked file has no previous version.
        std::fs::write(temp.path().join("icons/new.png"), png(2, 2, RED)).unwrap();
        let pattern = format!("{}/icons/new.png", temp.path().display());
        let code = batch(libgit2_config(4), &[pattern], None, None).await.unwrap();
        assert_eq!(code, 0);

        // Neither does a file outside the given repository root.
        let elsewhere = TempDir::new().expect("tempdir");
        let pattern = format!("{}/icons/b.png", temp.path().display());
        let code = batch(libgit2_config(4), &[pattern], Some(elsewhere.path()), None)
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn no_matches_is_not_a_failure() {
        let temp = TempDir::new().expect("tempdir");
        let pattern = format!("{}/*.png", temp.path().display());
        assert_eq!(batch(libgit2_config(4), &[pattern], None, None).await.unwrap(), 0);
    }

    #[test]
    fn expand_dedupes_and_skips_directories() {
        let temp = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(temp.path().join("icons.png")).unwrap();
        std::fs::write(temp.path().join("b.png"), b"b").unwrap();
        std::fs::write(temp.path().join("a.png"), b"a").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"n").unwrap();

        let root = temp.path().display();
        let files = expand(&[format!("{root}/*.png"), format!("{root}/a.*")]).unwrap();
        assert_eq!(
            files,
            [temp.path().join("a.png"), temp.path().join("b.png")]
        );
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(expand(&["[".to_owned()]).is_err());
    }
}
