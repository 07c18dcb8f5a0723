//! git2-backed repository.

use std::path::Path;

use git2::{DiffFindOptions, DiffFormat, DiffOptions, ErrorCode, IndexAddOption, Repository};
use tracing::{debug, info};

use super::VersionControl;
use crate::error::GitError;

/// A repository discovered from a working directory.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open the repository containing `path`, searching parent directories.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Repository::discover(path.as_ref()).map_err(GitError::OpenRepository)?;
        debug!("Opened repository at {}", repo.path().display());
        Ok(Self { repo })
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    /// Stage every change in the working tree, including deletions.
    pub fn stage_all(&self) -> Result<(), GitError> {
        let mut index = self.repo.index().map_err(GitError::StagingFailed)?;
        index
            .add_all(["*"], IndexAddOption::DEFAULT, None)
            .map_err(GitError::StagingFailed)?;
        index
            .update_all(["*"], None)
            .map_err(GitError::StagingFailed)?;
        index.write().map_err(GitError::StagingFailed)?;
        info!("Staged all working tree changes");
        Ok(())
    }

    /// Tree of the `HEAD` commit, or `None` on an unborn branch.
    fn head_tree(&self) -> Result<Option<git2::Tree<'_>>, git2::Error> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_tree()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>, git2::Error> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl VersionControl for GitRepository {
    fn staged_diff(&self) -> Result<String, GitError> {
        let tree = self.head_tree().map_err(GitError::DiffFailed)?;
        let index = self.repo.index().map_err(GitError::DiffFailed)?;

        let mut opts = DiffOptions::new();
        opts.show_binary(false);
        let mut diff = self
            .repo
            .diff_tree_to_index(tree.as_ref(), Some(&index), Some(&mut opts))
            .map_err(GitError::DiffFailed)?;
        diff.find_similar(Some(DiffFindOptions::new().renames(true)))
            .map_err(GitError::DiffFailed)?;

        if diff.deltas().len() == 0 {
            return Err(GitError::NoStagedChanges);
        }

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                text.push(line.origin());
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })
        .map_err(GitError::DiffFailed)?;

        debug!(
            "Collected staged diff: {} files, {} bytes",
            diff.deltas().len(),
            text.len()
        );
        Ok(text)
    }

    fn commit(&self, message: &str) -> Result<String, GitError> {
        let signature = self.repo.signature().map_err(GitError::ConfigError)?;

        let mut index = self.repo.index().map_err(GitError::CommitFailed)?;
        let tree_id = index.write_tree().map_err(GitError::CommitFailed)?;
        let tree = self.repo.find_tree(tree_id).map_err(GitError::CommitFailed)?;

        let parent = self.head_commit().map_err(GitError::CommitFailed)?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(GitError::CommitFailed)?;

        info!("Created commit {}", oid);
        Ok(oid.to_string())
    }
}
