//! Work-tree operations over the command-line `git` binary.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use tempo_scheduler::{PortError, Repository, WorkUnit};

use crate::error::GitError;

/// A local Git work tree that units of work are committed into.
///
/// Non-reentrant by nature: callers must serialize commits, which the
/// scheduler's single execution loop guarantees.
#[derive(Debug, Clone)]
pub struct GitRepository {
    work_tree: PathBuf,
}

impl GitRepository {
    /// Point at a work tree. Nothing is touched until
    /// [`ensure_initialized`](Self::ensure_initialized) runs.
    pub fn new(work_tree: impl Into<PathBuf>) -> Self {
        Self {
            work_tree: work_tree.into(),
        }
    }

    /// The work tree this port writes into.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Create the work tree directory and initialize a repository in it if
    /// one does not already exist.
    pub async fn ensure_initialized(&self) -> Result<(), GitError> {
        tokio::fs::create_dir_all(&self.work_tree).await?;

        if self.is_repository().await {
            debug!(path = %self.work_tree.display(), "opened existing repository");
            return Ok(());
        }

        self.git(&["init"]).await?;
        info!(path = %self.work_tree.display(), "initialized new repository");
        Ok(())
    }

    /// Whether the work tree is inside a Git repository.
    pub async fn is_repository(&self) -> bool {
        self.git(&["rev-parse", "--git-dir"]).await.is_ok()
    }

    /// Apply a unit's file changes, stage exactly those paths, and commit.
    ///
    /// Returns the full hash of the created commit.
    pub async fn commit_unit(&self, unit: &WorkUnit) -> Result<String, GitError> {
        let mut staged = Vec::with_capacity(unit.changes.len());

        for change in &unit.changes {
            let path = self.resolve(&change.path)?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            if change.append {
                use tokio::io::AsyncWriteExt;
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await?;
                file.write_all(change.content.as_bytes()).await?;
            } else {
                tokio::fs::write(&path, change.content.as_bytes()).await?;
            }

            staged.push(change.path.as_str());
        }

        let mut add_args = vec!["add", "--"];
        add_args.extend(staged.iter().copied());
        self.git(&add_args).await?;

        self.git(&["commit", "-m", &unit.message]).await?;
        let hash = self.git(&["rev-parse", "HEAD"]).await?;

        debug!(hash = %hash, files = unit.changes.len(), "committed unit");
        Ok(hash)
    }

    /// `git status --porcelain` output, used as a reachability probe.
    pub async fn status(&self) -> Result<String, GitError> {
        self.git(&["status", "--porcelain"]).await
    }

    /// Resolve a unit-relative path inside the work tree, rejecting absolute
    /// paths and parent traversal.
    fn resolve(&self, relative: &str) -> Result<PathBuf, GitError> {
        let candidate = Path::new(relative);
        let escapes = candidate.is_absolute()
            || candidate
                .components()
                .any(|c| matches!(c, Component::ParentDir));
        if escapes {
            return Err(GitError::PathOutsideWorkTree(relative.to_string()));
        }
        Ok(self.work_tree.join(candidate))
    }

    /// Run a git subcommand against the work tree, returning trimmed stdout.
    async fn git(&self, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.work_tree)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GitError::GitNotFound
                } else {
                    GitError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Repository for GitRepository {
    async fn commit(&self, unit: &WorkUnit) -> Result<String, PortError> {
        self.commit_unit(unit)
            .await
            .map_err(|e| PortError::new(e.to_string()))
    }

    async fn check(&self) -> Result<(), PortError> {
        self.status()
            .await
            .map(|_| ())
            .map_err(|e| PortError::new(e.to_string()))
    }
}
