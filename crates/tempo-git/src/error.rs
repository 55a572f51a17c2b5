//! Error types for Git operations.

use thiserror::Error;

/// Errors from driving the `git` binary.
#[derive(Debug, Error)]
pub enum GitError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The `git` binary is not on PATH.
    #[error("git not found - is Git installed?")]
    GitNotFound,

    /// A git command exited non-zero.
    #[error("git {command} failed: {stderr}")]
    CommandFailed {
        /// The subcommand and arguments that failed.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A unit-of-work path tried to escape the work tree.
    #[error("refusing path outside the work tree: {0}")]
    PathOutsideWorkTree(String),
}
