//! Release workflow orchestration
//!
//! Sequences guard checks, version resolution, the quality gate pipeline
//! and the final repository mutations into the supported operations.
//! Decoupled from the CLI so the whole workflow can be driven
//! programmatically, with mock git and mock executor, in tests.
//!
//! Ordering invariant: version files and the repository are only mutated
//! after every precondition and every required gate has passed. A failure
//! anywhere aborts the operation with nothing half-done, except the
//! documented partial-write case which leaves a visibly dirty tree.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ReleaseError, Result};
use crate::exec::CommandExecutor;
use crate::git::GitBackend;
use crate::guard::RepositoryStateGuard;
use crate::pipeline::{GateResult, QualityGatePipeline};
use crate::ui;
use crate::version::{self, BumpKind, Version};

/// The operation a session performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    StartFeature,
    PrepareRelease,
    CreateRelease,
    FullRelease,
}

/// Lifecycle state reached by this invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    Idle,
    FeatureStarted,
    ReleasePrepared,
    Published,
}

/// Record of one command invocation.
///
/// Ephemeral: created at operation start, returned to the caller for
/// display, never persisted.
#[derive(Debug, Clone)]
pub struct ReleaseSession {
    pub operation: Operation,
    pub from_version: Option<Version>,
    pub to_version: Option<Version>,
    pub gate_results: Vec<GateResult>,
}

impl ReleaseSession {
    fn new(operation: Operation) -> Self {
        ReleaseSession {
            operation,
            from_version: None,
            to_version: None,
            gate_results: Vec::new(),
        }
    }
}

/// The release orchestrator.
///
/// Owns no repository state of its own: every fact about the repository
/// is re-queried through the guard and the git backend when needed.
pub struct ReleaseStateMachine<'a> {
    config: &'a Config,
    root: PathBuf,
    git: &'a dyn GitBackend,
    executor: &'a dyn CommandExecutor,
    state: ReleaseState,
}

impl<'a> ReleaseStateMachine<'a> {
    pub fn new(
        config: &'a Config,
        root: impl AsRef<Path>,
        git: &'a dyn GitBackend,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        ReleaseStateMachine {
            config,
            root: root.as_ref().to_path_buf(),
            git,
            executor,
            state: ReleaseState::Idle,
        }
    }

    pub fn state(&self) -> ReleaseState {
        self.state
    }

    fn guard(&self) -> RepositoryStateGuard<'_> {
        RepositoryStateGuard::new(self.git, &self.config.remote)
    }

    /// Current and next version for a prospective bump, without mutating
    /// anything. Used for confirmation prompts.
    pub fn preview_bump(&self, kind: BumpKind) -> Result<(Version, Version)> {
        let current = version::read_current_version(&self.root, &self.config.sources)?;
        Ok((current, current.bump(kind)))
    }

    /// Verify all version sources agree and return the shared version
    pub fn check_version(&self) -> Result<Version> {
        version::read_current_version(&self.root, &self.config.sources)
    }

    /// Create and check out `feature/<name>` from a clean, synced default
    /// branch.
    pub fn start_feature(&mut self, name: &str) -> Result<ReleaseSession> {
        if name.trim().is_empty() {
            return Err(ReleaseError::config("Feature name must not be empty"));
        }

        let guard = self.guard();
        guard.assert_clean()?;

        ui::display_status(&format!(
            "Switching to '{}' and pulling latest changes...",
            self.config.default_branch
        ));
        guard.switch_and_sync(&self.config.default_branch)?;

        let branch = format!("feature/{}", name);
        ui::display_status(&format!("Creating feature branch: {}", branch));
        self.git.create_branch(&branch)?;

        self.state = ReleaseState::FeatureStarted;
        Ok(ReleaseSession::new(Operation::StartFeature))
    }

    /// Compute the next version, run the full gate pipeline, and only on
    /// a full pass rewrite the version sources and commit them.
    ///
    /// Re-running after success starts from the new current version, so
    /// repeated invocations advance monotonically - not a no-op.
    pub fn prepare_release(&mut self, kind: BumpKind) -> Result<ReleaseSession> {
        let mut session = ReleaseSession::new(Operation::PrepareRelease);

        // Fails before any gate runs and before any file is touched
        self.guard().assert_clean()?;

        let current = version::read_current_version(&self.root, &self.config.sources)?;
        let next = current.bump(kind);
        session.from_version = Some(current);
        session.to_version = Some(next);

        ui::display_status(&format!("Preparing {} release: {} -> {}", kind, current, next));

        session.gate_results = self.run_gates()?;

        ui::display_status(&format!("Updating version files to {}", next));
        version::write_version(&self.root, &self.config.sources, next)?;

        let paths: Vec<String> = self.config.sources.iter().map(|s| s.path.clone()).collect();
        let message = format!("bump: version {} -> {}", current, next);
        self.git.commit_paths(&paths, &message)?;
        ui::display_success(&format!("Release prepared for version {}", next));

        self.state = ReleaseState::ReleasePrepared;
        Ok(session)
    }

    /// Tag and push the release currently at HEAD of the default branch.
    ///
    /// Re-runs the full pipeline against the now-current HEAD - a prior
    /// pass from a different commit is never trusted. The tag push is the
    /// only externally visible side effect.
    pub fn create_release(&mut self) -> Result<ReleaseSession> {
        let mut session = ReleaseSession::new(Operation::CreateRelease);
        let guard = self.guard();

        guard.assert_on_branch(&self.config.default_branch)?;
        guard.assert_clean()?;

        ui::display_status("Pulling latest changes...");
        guard.switch_and_sync(&self.config.default_branch)?;
        guard.ensure_synced(&self.config.default_branch)?;

        let current = version::read_current_version(&self.root, &self.config.sources)?;
        session.from_version = Some(current);
        session.to_version = Some(current);

        let tag = format!("v{}", current);
        if self.git.tag_exists(&tag)? {
            return Err(ReleaseError::tag(format!("Tag {} already exists", tag)));
        }

        session.gate_results = self.run_gates()?;

        ui::display_status(&format!("Creating tag: {}", tag));
        self.git
            .create_annotated_tag(&tag, &format!("Release {}", tag))?;
        self.git.push_tag(&self.config.remote, &tag)?;
        ui::display_success(&format!("Release {} created and pushed", tag));

        self.state = ReleaseState::Published;
        Ok(session)
    }

    /// Emergency path: prepare then publish in one invocation.
    ///
    /// Literal sequential composition of the two underlying transitions,
    /// not a separate mechanism.
    pub fn full_release(&mut self, kind: BumpKind) -> Result<ReleaseSession> {
        let prepared = self.prepare_release(kind)?;
        let published = self.create_release()?;

        Ok(ReleaseSession {
            operation: Operation::FullRelease,
            from_version: prepared.from_version,
            to_version: prepared.to_version,
            gate_results: published.gate_results,
        })
    }

    fn run_gates(&self) -> Result<Vec<GateResult>> {
        let timeout = std::time::Duration::from_secs(self.config.gate_timeout_secs);
        let pipeline = QualityGatePipeline::new(self.executor, timeout);

        let report = pipeline.run_with_progress(&self.config.gates, |gate| {
            ui::display_status(&format!("Running gate: {}", gate.name));
        });

        if let Some(err) = report.gate_error(timeout) {
            return Err(err);
        }
        ui::display_success("All quality gates passed");
        Ok(report.results)
    }
}
