use std::path::Path;

use git2::{ErrorClass, ErrorCode, ObjectType, Repository};

use super::{RepositoryContext, RetrievalError, Revision, VersionResolver};

/// In-process resolver reading the object database through libgit2.
#[derive(Clone, Debug)]
pub struct Libgit2 {
    max_bytes: u64,
}

impl Libgit2 {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl VersionResolver for Libgit2 {
    fn name(&self) -> &'static str {
        "libgit2"
    }

    async fn resolve(
        &self,
        ctx: &RepositoryContext,
        revision: &Revision,
    ) -> Result<Vec<u8>, RetrievalError> {
        let root = ctx.root.clone();
        let rev = revision.as_str().to_owned();
        let path = ctx.file.as_str().to_owned();
        let max_bytes = self.max_bytes;
        tokio::task::spawn_blocking(move || read_blob(&root, &rev, &path, max_bytes))
            .await
            .map_err(|e| RetrievalError::Io(std::io::Error::other(e)))?
    }
}

/// Read `path` as stored in the tree of `rev`.
///
/// The size comes from the object header, so an oversized blob is rejected
/// before its content is inflated.
fn read_blob(
    root: &Path,
    rev: &str,
    path: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, RetrievalError> {
    let repo = Repository::open(root).map_err(|err| {
        if err.class() == ErrorClass::Repository && err.code() == ErrorCode::NotFound {
            RetrievalError::NotARepository(root.to_path_buf())
        } else {
            not_found(&err)
        }
    })?;

    let tree = repo
        .revparse_single(rev)
        .and_then(|object| object.peel_to_tree())
        .map_err(|err| not_found(&err))?;
    let entry = tree.get_path(Path::new(path)).map_err(|err| not_found(&err))?;
    let id = entry.id();

    let (size, kind) = repo
        .odb()
        .and_then(|odb| odb.read_header(id))
        .map_err(|err| not_found(&err))?;
    if kind != ObjectType::Blob {
        return Err(RetrievalError::NotFound {
            reason: format!("{path} is not a file at {rev}"),
        });
    }
    if size as u64 > max_bytes {
        return Err(RetrievalError::TooLarge { limit: max_bytes });
    }

    let blob = repo.find_blob(id).map_err(|err| not_found(&err))?;
    Ok(blob.content().to_vec())
}

fn not_found(err: &git2::Error) -> RetrievalError {
    RetrievalError::NotFound {
        reason: err.message().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::{stage_and_commit, two_commit_repo, write_file};
    use tempfile::TempDir;

    fn rev(s: &str) -> Revision {
        Revision::parse(s).unwrap()
    }

    #[tokio::test]
    async fn reads_blob_at_revision() {
        let (_temp, file) = two_commit_repo();
        let ctx = RepositoryContext::discover(&file, None).unwrap();
        let lib = Libgit2::new(1024);
        assert_eq!(lib.resolve(&ctx, &rev("HEAD~1")).await.unwrap(), b"one");
        assert_eq!(lib.resolve(&ctx, &rev("HEAD")).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn unknown_revision_is_not_found() {
        let (_temp, file) = two_commit_repo();
        let ctx = RepositoryContext::discover(&file, None).unwrap();
        let err = Libgit2::new(1024)
            .resolve(&ctx, &rev("no-such-branch"))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound { .. }), "{err}");
    }

    #[tokio::test]
    async fn size_limit_is_enforced() {
        let (_temp, file) = two_commit_repo();
        let ctx = RepositoryContext::discover(&file, None).unwrap();
        let err = Libgit2::new(2)
            .resolve(&ctx, &rev("HEAD"))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::TooLarge { limit: 2 }));
        // Exactly at the limit is fine.
        let ok = Libgit2::new(3).resolve(&ctx, &rev("HEAD")).await.unwrap();
        assert_eq!(ok, b"two");
    }

    #[test]
    fn oversized_blob_is_rejected_from_its_header() {
        let (_temp, file) = two_commit_repo();
        let ctx = RepositoryContext::discover(&file, None).unwrap();
        let repo = git2::Repository::open(&ctx.root).unwrap();
        // Incompressible content keeps the object far larger than its header.
        let mut state = 0x2545_f491u32;
        let noise: Vec<u8> = (0..256 * 1024)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();
        write_file(file.clone(), &noise);
        stage_and_commit(&repo, "large");

        let oid = repo
            .revparse_single("HEAD")
            .and_then(|o| o.peel_to_tree())
            .and_then(|t| t.get_path(Path::new(ctx.file.as_str())))
            .unwrap()
            .id();
        // Keep only the first KiB of the loose object. The header still
        // decodes, but the body is gone, so only a header-based size check
        // can reach the limit.
        let hex = oid.to_string();
        let object = ctx.root.join(".git/objects").join(&hex[..2]).join(&hex[2..]);
        let mut raw = std::fs::read(&object).unwrap();
        let keep = raw.len().min(1024);
        raw.truncate(keep);
        set_writable(&object);
        std::fs::write(&object, &raw).unwrap();

        let err = read_blob(&ctx.root, "HEAD", ctx.file.as_str(), 1024).unwrap_err();
        assert!(matches!(err, RetrievalError::TooLarge { limit: 1024 }), "{err}");
        assert!(read_blob(&ctx.root, "HEAD", ctx.file.as_str(), u64::MAX).is_err());
    }

    fn set_writable(path: &Path) {
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn directory_path_is_not_found() {
        let (_temp, file) = two_commit_repo();
        let ctx = RepositoryContext::discover(&file, None).unwrap();
        let err = read_blob(&ctx.root, "HEAD", "dir", 1024).unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound { .. }), "{err}");
    }

    #[test]
    fn plain_directory_is_not_a_repository() {
        let temp = TempDir::new().expect("tempdir");
        let err = read_blob(temp.path(), "HEAD", "x.png", 10).unwrap_err();
        assert!(matches!(err, RetrievalError::NotARepository(_)), "{err}");
    }

    #[test]
    fn working_tree_is_untouched() {
        let (_temp, file) = two_commit_repo();
        let ctx = RepositoryContext::discover(&file, None).unwrap();
        read_blob(&ctx.root, "HEAD~1", ctx.file.as_str(), 1024).unwrap();
        assert_eq!(std::fs::read(&file).unwrap(), b"two");
    }
}
