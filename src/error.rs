use thiserror::Error;

/// Unified error type for release-pilot operations
///
/// Variants map one-to-one onto the failure categories a caller (or a CI
/// script) needs to tell apart; see [ReleaseError::exit_code].
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Working tree is not clean. Commit or stash your changes first.")]
    DirtyWorkingTree,

    #[error("Wrong branch: expected '{expected}', currently on '{actual}'")]
    WrongBranch { expected: String, actual: String },

    #[error("Branch '{branch}' is out of sync with '{remote}' (ahead {ahead}, behind {behind}). Pull or reconcile first.")]
    OutOfSync {
        branch: String,
        remote: String,
        ahead: usize,
        behind: usize,
    },

    #[error("Checkout failed: {0}")]
    Checkout(String),

    #[error("Sync failed: {0}")]
    Sync(String),

    #[error("Version parsing error: {0}")]
    VersionParse(String),

    #[error("Version mismatch: {first_name}={first} vs {second_name}={second}")]
    VersionMismatch {
        first_name: String,
        first: String,
        second_name: String,
        second: String,
    },

    #[error("Gate '{gate}' failed with exit code {exit_code}\n{output}")]
    GateFailed {
        gate: String,
        exit_code: i32,
        output: String,
    },

    #[error("Gate '{gate}' timed out after {secs}s")]
    GateTimeout { gate: String, secs: u64 },

    #[error("Partial version write: updated {written:?}, failed at '{failed}': {reason}. The working tree is now dirty; fix the files or reset before retrying.")]
    PartialWrite {
        written: Vec<String>,
        failed: String,
        reason: String,
    },

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-pilot
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version parsing error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::VersionParse(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ReleaseError::Tag(msg.into())
    }

    /// Create a push error with context
    pub fn push(msg: impl Into<String>) -> Self {
        ReleaseError::Push(msg.into())
    }

    /// Process exit code for this failure category.
    ///
    /// Each category gets its own code so scripts can distinguish
    /// "nothing to do" from "broke": 2 dirty tree, 3 wrong branch,
    /// 4 out of sync, 5 version problems, 6 gate failures (including
    /// timeouts), 7 mutations (partial writes, tag, push), 1 the rest.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::DirtyWorkingTree => 2,
            ReleaseError::WrongBranch { .. } => 3,
            ReleaseError::OutOfSync { .. }
            | ReleaseError::Checkout(_)
            | ReleaseError::Sync(_) => 4,
            ReleaseError::VersionParse(_) | ReleaseError::VersionMismatch { .. } => 5,
            ReleaseError::GateFailed { .. } | ReleaseError::GateTimeout { .. } => 6,
            ReleaseError::PartialWrite { .. } | ReleaseError::Tag(_) | ReleaseError::Push(_) => 7,
            ReleaseError::Config(_) | ReleaseError::Git(_) | ReleaseError::Io(_) => 1,
        }
    }
}
