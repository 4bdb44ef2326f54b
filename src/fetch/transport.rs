//! Revision-control transport abstraction
//!
//! Provides a trait for the repository operations the fetch and build
//! pipeline needs, so the git command-line backend can be swapped for an
//! in-memory one in tests.

use crate::error::QuarryResult;
use async_trait::async_trait;
use std::path::Path;

/// Abstract repository operations
///
/// `repository` is always a local mirror created by `clone_repository`.
#[async_trait]
pub trait RepositoryTransport: Send + Sync {
    /// Check whether `path` holds a usable local mirror
    async fn is_repository(&self, path: &Path) -> bool;

    /// Clone `remote` into a new mirror at `destination`
    async fn clone_repository(&self, remote: &str, destination: &Path) -> QuarryResult<()>;

    /// Update the mirror at `repository` from `remote`
    async fn fetch(&self, repository: &Path, remote: &str) -> QuarryResult<()>;

    /// Check whether `commitish` resolves to a commit in the mirror
    async fn commit_exists(&self, repository: &Path, commitish: &str) -> QuarryResult<bool>;

    /// Check whether `commitish` names a branch or tag rather than a commit
    async fn is_symbolic_reference(&self, repository: &Path, commitish: &str)
        -> QuarryResult<bool>;

    /// Commit hash the mirror currently has checked out
    async fn current_revision(&self, repository: &Path) -> QuarryResult<String>;

    /// Check out `commitish` from the mirror into `working_directory`
    async fn checkout(
        &self,
        repository: &Path,
        commitish: &str,
        working_directory: &Path,
    ) -> QuarryResult<()>;
}
