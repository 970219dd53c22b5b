//! Read-only retrieval of a file's bytes at a historical revision.

pub mod git_cli;
pub mod libgit2;

use std::fmt;
use std::future::Future;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use self::git_cli::GitCli;
pub use self::libgit2::Libgit2;

/// Upper bound on a retrieved blob (10 MiB).
pub const DEFAULT_MAX_BLOB_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("not found: {reason}")]
    NotFound { reason: String },

    #[error("blob exceeds the {limit}-byte limit")]
    TooLarge { limit: u64 },

    #[error("invalid revision {0:?}")]
    InvalidRevision(String),

    #[error("invalid repository path {0:?}")]
    InvalidPath(PathBuf),

    #[error("{} is not inside a git repository", .0.display())]
    NotARepository(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    pub fn is_resource_limit(&self) -> bool {
        matches!(self, Self::TooLarge { .. })
    }
}

/// A revision reference such as `HEAD~1`, a branch name or a commit hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    /// Reject anything that could be read as a git option or that would
    /// break the `<rev>:<path>` object spec.
    pub fn parse(s: &str) -> Result<Self, RetrievalError> {
        let s = s.trim();
        if s.is_empty() || s.starts_with('-') || s.contains(':') || s.contains('\0') {
            return Err(RetrievalError::InvalidRevision(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self("HEAD~1".to_owned())
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Revision {
    type Error = RetrievalError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Revision> for String {
    fn from(r: Revision) -> Self {
        r.0
    }
}

impl std::str::FromStr for Revision {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Repository-relative path, always `/`-separated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoPath(String);

impl RepoPath {
    /// Build from a host path relative to the repository root.
    pub fn new(rel: &Path) -> Result<Self, RetrievalError> {
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| RetrievalError::InvalidPath(rel.to_path_buf()))?;
                    parts.push(part);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(RetrievalError::InvalidPath(rel.to_path_buf()));
                }
            }
        }
        if parts.is_empty() {
            return Err(RetrievalError::InvalidPath(rel.to_path_buf()));
        }
        Ok(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a file lives: the working-tree root and the path inside it.
#[derive(Clone, Debug)]
pub struct RepositoryContext {
    pub root: PathBuf,
    pub file: RepoPath,
}

impl RepositoryContext {
    /// Locate `file` inside `root`, or inside the nearest ancestor holding a
    /// `.git` entry when no root is given.
    pub fn discover(file: &Path, root: Option<&Path>) -> Result<Self, RetrievalError> {
        let file = std::fs::canonicalize(file)?;
        let root = match root {
            Some(root) => std::fs::canonicalize(root)?,
            None => find_worktree_root(&file)
                .ok_or_else(|| RetrievalError::NotARepository(file.clone()))?,
        };
        let rel = file
            .strip_prefix(&root)
            .map_err(|_| RetrievalError::InvalidPath(file.clone()))?;
        Ok(Self {
            file: RepoPath::new(rel)?,
            root,
        })
    }

    /// Object spec understood by git: `<rev>:<path>`.
    pub fn object_spec(&self, revision: &Revision) -> String {
        format!("{revision}:{}", self.file)
    }
}

fn find_worktree_root(file: &Path) -> Option<PathBuf> {
    file.ancestors()
        .skip(1)
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Fetches file content as stored at a revision. Implementations must not
/// touch the working tree, the index or refs.
pub trait VersionResolver {
    fn name(&self) -> &'static str;

    fn resolve(
        &self,
        ctx: &RepositoryContext,
        revision: &Revision,
    ) -> impl Future<Output = Result<Vec<u8>, RetrievalError>> + Send;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Shell out to the `git` binary.
    #[default]
    GitCli,
    /// Read the object database in-process via libgit2.
    Libgit2,
}

/// The configured resolver.
#[derive(Clone, Debug)]
pub enum Backend {
    GitCli(GitCli),
    Libgit2(Libgit2),
}

impl Backend {
    pub fn new(kind: BackendKind, max_bytes: u64) -> Self {
        match kind {
            BackendKind::GitCli => Self::GitCli(GitCli::new(max_bytes)),
            BackendKind::Libgit2 => Self::Libgit2(Libgit2::new(max_bytes)),
        }
    }
}

impl VersionResolver for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::GitCli(r) => r.name(),
            Self::Libgit2(r) => r.name(),
        }
    }

    async fn resolve(
        &self,
        ctx: &RepositoryContext,
        revision: &Revision,
    ) -> Result<Vec<u8>, RetrievalError> {
        match self {
            Self::GitCli(r) => r.resolve(ctx, revision).await,
            Self::Libgit2(r) => r.resolve(ctx, revision).await,
        }
    }
}

/// Resolve the previous version, collapsing every failure to `None`.
///
/// The reason is logged; callers only learn that no previous version is
/// available.
pub async fn fetch_previous<R: VersionResolver + Sync>(
    resolver: &R,
    ctx: &RepositoryContext,
    revision: &Revision,
) -> Option<Vec<u8>> {
    debug!(backend = resolver.name(), file = %ctx.file, %revision, "resolving previous version");
    match resolver.resolve(ctx, revision).await {
        Ok(bytes) => {
            debug!(bytes = bytes.len(), "previous version retrieved");
            Some(bytes)
        }
        Err(e) if e.is_resource_limit() => {
            warn!(file = %ctx.file, %revision, "resource limit: {e}");
            None
        }
        Err(e) => {
            warn!(file = %ctx.file, %revision, "no previous version: {e}");
            None
        }
    }
}
