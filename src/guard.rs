//! Repository state preconditions
//!
//! Probes version-control state and asserts the preconditions mutating
//! operations depend on. Nothing is cached across calls: each probe
//! re-derives truth from the backend at the point of use, so a check
//! always reflects the repository as it is right now.

use crate::error::{ReleaseError, Result};
use crate::git::GitBackend;

/// Point-in-time snapshot of the repository, derived per query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    pub current_branch: String,
    pub is_clean: bool,
    pub ahead: usize,
    pub behind: usize,
}

/// Asserts repository preconditions before mutating operations.
///
/// All methods are read-only probes except [switch_and_sync], the single
/// mutating entry point.
///
/// [switch_and_sync]: RepositoryStateGuard::switch_and_sync
pub struct RepositoryStateGuard<'a> {
    git: &'a dyn GitBackend,
    remote: String,
}

impl<'a> RepositoryStateGuard<'a> {
    pub fn new(git: &'a dyn GitBackend, remote: impl Into<String>) -> Self {
        RepositoryStateGuard {
            git,
            remote: remote.into(),
        }
    }

    /// Fresh snapshot of branch, cleanliness and sync counts
    pub fn state(&self) -> Result<RepositoryState> {
        let current_branch = self.git.current_branch()?;
        let (ahead, behind) = self.git.ahead_behind(&current_branch, &self.remote)?;
        Ok(RepositoryState {
            is_clean: self.git.is_clean()?,
            current_branch,
            ahead,
            behind,
        })
    }

    /// Fail unless the working tree has no uncommitted changes
    pub fn assert_clean(&self) -> Result<()> {
        if self.git.is_clean()? {
            Ok(())
        } else {
            Err(ReleaseError::DirtyWorkingTree)
        }
    }

    /// Fail unless `expected` is the currently checked-out branch
    pub fn assert_on_branch(&self, expected: &str) -> Result<()> {
        let actual = self.git.current_branch()?;
        if actual == expected {
            Ok(())
        } else {
            Err(ReleaseError::WrongBranch {
                expected: expected.to_string(),
                actual,
            })
        }
    }

    /// Fetch and fail if the local branch lags or has diverged from its
    /// remote counterpart.
    ///
    /// Ahead-only is acceptable: that is the normal state right before a
    /// push. Behind or diverged would make a later push fail or rewrite
    /// history, so both are rejected.
    pub fn ensure_synced(&self, branch: &str) -> Result<()> {
        self.git.fetch(&self.remote, branch)?;
        let (ahead, behind) = self.git.ahead_behind(branch, &self.remote)?;
        if behind > 0 {
            return Err(ReleaseError::OutOfSync {
                branch: branch.to_string(),
                remote: self.remote.clone(),
                ahead,
                behind,
            });
        }
        Ok(())
    }

    /// Check out `branch` and bring it up to date with the remote.
    ///
    /// The only guard operation with mutating effect: it moves the branch
    /// pointer and working tree (checkout, fetch, fast-forward).
    pub fn switch_and_sync(&self, branch: &str) -> Result<()> {
        self.git.checkout(branch)?;
        self.git.fetch(&self.remote, branch)?;
        self.git.fast_forward(branch, &self.remote)?;
        Ok(())
    }
}
