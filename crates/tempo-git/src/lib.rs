//! Git repository port for tempo.
//!
//! Drives the command-line `git` binary against a local work tree. The core
//! only depends on the narrow [`Repository`](tempo_scheduler::Repository)
//! contract, so the backing mechanism stays an implementation detail of this
//! crate.

mod error;
mod repo;

pub use error::GitError;
pub use repo::GitRepository;
