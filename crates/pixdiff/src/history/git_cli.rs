use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use super::{RepositoryContext, RetrievalError, Revision, VersionResolver};

/// Resolver backed by the `git` executable.
///
/// Runs `git cat-file blob <rev>:<path>` with arguments passed straight to
/// the process (no shell), so paths with spaces or quotes need no escaping.
/// The child is killed if the future is dropped before it finishes.
#[derive(Clone, Debug)]
pub struct GitCli {
    program: PathBuf,
    max_bytes: u64,
}

impl GitCli {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            program: PathBuf::from("git"),
            max_bytes,
        }
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl VersionResolver for GitCli {
    fn name(&self) -> &'static str {
        "git-cli"
    }

    async fn resolve(
        &self,
        ctx: &RepositoryContext,
        revision: &Revision,
    ) -> Result<Vec<u8>, RetrievalError> {
        let spec = ctx.object_spec(revision);
        debug!(program = %self.program.display(), root = %ctx.root.display(), %spec, "git cat-file");

        let mut child = Command::new(&self.program)
            .arg("-C")
            .arg(&ctx.root)
            .args(["cat-file", "blob"])
            .arg(&spec)
            // Read-only: never take index.lock for a stat refresh.
            .env("GIT_OPTIONAL_LOCKS", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(std::io::Error::other("git output was not captured").into());
        };
        // Drain stderr alongside stdout so a chatty git never blocks on it.
        let stderr = tokio::spawn(head_of(stderr, STDERR_KEEP));

        let mut content = Vec::new();
        stdout
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut content)
            .await?;
        if content.len() as u64 > self.max_bytes {
            // `child` is dropped here, which kills git mid-stream.
            return Err(RetrievalError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let status = child.wait().await?;
        if !status.success() {
            let stderr = stderr.await.unwrap_or_default();
            let stderr = String::from_utf8_lossy(&stderr);
            let reason = stderr
                .lines()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("git cat-file failed")
                .trim()
                .to_owned();
            return Err(RetrievalError::NotFound { reason });
        }
        Ok(content)
    }
}

/// Bytes of stderr kept for the error message.
const STDERR_KEEP: usize = 4096;

/// Read `reader` to EOF, keeping only the first `keep` bytes.
async fn head_of(mut reader: impl AsyncRead + Unpin, keep: usize) -> Vec<u8> {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = keep.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    kept
}
