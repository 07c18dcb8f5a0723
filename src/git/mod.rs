//! Version control access using git2-rs.
//!
//! The pipeline only needs the staged diff as text and a way to record a
//! commit; both sit behind [`VersionControl`].

pub mod repository;

pub use repository::GitRepository;

use crate::error::GitError;

/// The two capabilities the commit flow needs from a repository.
#[cfg_attr(test, mockall::automock)]
pub trait VersionControl {
    /// Unified diff of the staged changes against `HEAD`.
    ///
    /// Fails with [`GitError::NoStagedChanges`] when nothing is staged.
    fn staged_diff(&self) -> Result<String, GitError>;

    /// Commit the staged changes with `message`, returning the new commit id.
    fn commit(&self, message: &str) -> Result<String, GitError>;
}
