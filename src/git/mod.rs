//! Git operations abstraction layer
//!
//! Trait-based abstraction over the version-control operations the
//! release workflow needs, with a real `git2`-backed implementation and a
//! mock for tests.
//!
//! Most code should depend on the [GitBackend] trait rather than concrete
//! implementations. Implementations derive every answer from repository
//! state at the point of the call - nothing is cached between calls,
//! since stale branch or cleanliness information directly causes
//! incorrect mutations.

pub mod mock;
pub mod repository;

pub use mock::MockGit;
pub use repository::Git2Backend;

use crate::error::Result;

/// Version-control operations used by the release workflow.
///
/// Probes (`current_branch`, `is_clean`, `ahead_behind`) are read-only.
/// The remaining methods mutate the repository or the remote and are only
/// reached through the guarded transitions in [crate::release].
///
/// All implementors must be `Send + Sync`.
pub trait GitBackend: Send + Sync {
    /// Name of the currently checked-out branch
    fn current_branch(&self) -> Result<String>;

    /// True when the working tree has no uncommitted or untracked changes
    fn is_clean(&self) -> Result<bool>;

    /// Fetch `branch` (and tags) from `remote`
    fn fetch(&self, remote: &str, branch: &str) -> Result<()>;

    /// Commits the local branch is ahead of / behind its remote
    /// counterpart. `(0, 0)` when the remote branch does not exist yet.
    fn ahead_behind(&self, branch: &str, remote: &str) -> Result<(usize, usize)>;

    /// Check out an existing local branch
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Fast-forward `branch` to its remote counterpart if possible.
    ///
    /// A missing remote branch or a local branch that is ahead or has
    /// diverged is left untouched; divergence is reported separately by
    /// [ahead_behind](Self::ahead_behind).
    fn fast_forward(&self, branch: &str, remote: &str) -> Result<()>;

    /// Create `branch` at the current HEAD and check it out
    fn create_branch(&self, branch: &str) -> Result<()>;

    /// Create a single commit containing exactly `paths`
    fn commit_paths(&self, paths: &[String], message: &str) -> Result<()>;

    /// Whether a tag with this name already exists
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Create an annotated tag at the current HEAD
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push a tag to `remote`
    fn push_tag(&self, remote: &str, name: &str) -> Result<()>;
}
