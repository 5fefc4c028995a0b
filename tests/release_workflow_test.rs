//! End-to-end workflow tests with mock git and mock executor.
//!
//! No real external tools run here: the executor is scripted and the git
//! backend records the mutations each operation performed.

use release_pilot::config::Config;
use release_pilot::error::ReleaseError;
use release_pilot::exec::MockExecutor;
use release_pilot::git::{GitBackend, MockGit};
use release_pilot::pipeline::GateSpec;
use release_pilot::release::{ReleaseState, ReleaseStateMachine};
use release_pilot::version::{read_current_version, BumpKind, Version, VersionSource};

fn sources() -> Vec<VersionSource> {
    vec![
        VersionSource::new("manifest", "Cargo.toml", r#"(?m)^version\s*=\s*"([^"]+)""#),
        VersionSource::new(
            "module",
            "src/version.rs",
            r#"VERSION:\s*&str\s*=\s*"([^"]+)""#,
        ),
    ]
}

fn test_config() -> Config {
    Config {
        sources: sources(),
        gates: vec![
            GateSpec::required("lint", &["tool", "lint"]),
            GateSpec::required("format-check", &["tool", "fmt"]),
            GateSpec::required("tests", &["tool", "test"]),
            GateSpec::required("build", &["tool", "build"]),
        ],
        ..Config::default()
    }
}

fn project_at(version: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(
        dir.path().join("Cargo.toml"),
        format!("[package]\nname = \"demo\"\nversion = \"{}\"\n", version),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("src/version.rs"),
        format!("pub const VERSION: &str = \"{}\";\n", version),
    )
    .unwrap();
    dir
}

#[test]
fn prepare_then_publish_from_1_0_2() {
    let config = test_config();
    let git = MockGit::new();
    let executor = MockExecutor::new();
    let dir = project_at("1.0.2");
    let mut machine = ReleaseStateMachine::new(&config, dir.path(), &git, &executor);

    // prepare-release(minor): 1.0.2 -> 1.1.0, written to both sources,
    // exactly one commit
    let session = machine.prepare_release(BumpKind::Minor).unwrap();
    assert_eq!(session.from_version.unwrap(), Version::new(1, 0, 2));
    assert_eq!(session.to_version.unwrap(), Version::new(1, 1, 0));
    assert_eq!(session.gate_results.len(), config.gates.len());
    assert_eq!(
        read_current_version(dir.path(), &config.sources).unwrap(),
        Version::new(1, 1, 0)
    );

    let commits = git.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(
        commits[0].0,
        vec!["Cargo.toml".to_string(), "src/version.rs".to_string()]
    );
    assert_eq!(commits[0].1, "bump: version 1.0.2 -> 1.1.0");
    assert_eq!(machine.state(), ReleaseState::ReleasePrepared);

    // create-release: exactly one new tag v1.1.0, pushed
    machine.create_release().unwrap();
    assert_eq!(git.tags(), vec!["v1.1.0".to_string()]);
    assert_eq!(
        git.pushed_tags(),
        vec![("origin".to_string(), "v1.1.0".to_string())]
    );
    assert_eq!(machine.state(), ReleaseState::Published);
}

#[test]
fn prepare_with_dirty_tree_fails_before_gates_and_files() {
    let config = test_config();
    let git = MockGit::new();
    git.set_clean(false);
    let executor = MockExecutor::new();
    let dir = project_at("1.0.2");
    let mut machine = ReleaseStateMachine::new(&config, dir.path(), &git, &executor);

    let err = machine.prepare_release(BumpKind::Patch).unwrap_err();
    assert!(matches!(err, ReleaseError::DirtyWorkingTree));
    assert_eq!(err.exit_code(), 2);

    // No gate ran, no file was touched, nothing was committed
    assert_eq!(executor.call_count(), 0);
    assert_eq!(
        read_current_version(dir.path(), &config.sources).unwrap(),
        Version::new(1, 0, 2)
    );
    assert!(git.commits().is_empty());
}

#[test]
fn prepare_aborts_on_gate_failure_with_diagnostic() {
    let config = test_config();
    let git = MockGit::new();
    let mut executor = MockExecutor::new();
    executor.fail_with("tool test", 101, "assertion failed: left == right");
    let dir = project_at("1.0.2");
    let mut machine = ReleaseStateMachine::new(&config, dir.path(), &git, &executor);

    let err = machine.prepare_release(BumpKind::Minor).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("tests"));
    assert!(msg.contains("assertion failed: left == right"));

    // lint, format-check, tests ran; build was never reached
    assert_eq!(executor.call_count(), 3);
    assert_eq!(
        read_current_version(dir.path(), &config.sources).unwrap(),
        Version::new(1, 0, 2)
    );
    assert!(git.commits().is_empty());
}

#[test]
fn publish_from_non_default_branch_creates_no_tag() {
    let config = test_config();
    let git = MockGit::new();
    git.set_current_branch("feature/add-auth");
    let executor = MockExecutor::new();
    let dir = project_at("1.1.0");
    let mut machine = ReleaseStateMachine::new(&config, dir.path(), &git, &executor);

    let err = machine.create_release().unwrap_err();
    match err {
        ReleaseError::WrongBranch { expected, actual } => {
            assert_eq!(expected, "main");
            assert_eq!(actual, "feature/add-auth");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(git.tags().is_empty());
    assert!(git.pushed_tags().is_empty());
}

#[test]
fn publish_behind_remote_is_rejected() {
    let config = test_config();
    let git = MockGit::new();
    git.set_ahead_behind(0, 2);
    let executor = MockExecutor::new();
    let dir = project_at("1.1.0");
    let mut machine = ReleaseStateMachine::new(&config, dir.path(), &git, &executor);

    let err = machine.create_release().unwrap_err();
    assert!(matches!(err, ReleaseError::OutOfSync { behind: 2, .. }));
    assert!(git.tags().is_empty());
}

#[test]
fn publish_reruns_gates_against_current_head() {
    let config = test_config();
    let git = MockGit::new();
    let executor = MockExecutor::new();
    let dir = project_at("1.1.0");
    let mut machine = ReleaseStateMachine::new(&config, dir.path(), &git, &executor);

    machine.create_release().unwrap();
    // A prior pass is never trusted: publish runs the full table itself
    assert_eq!(executor.call_count(), config.gates.len());
}

#[test]
fn gate_timeout_aborts_publish_without_tagging() {
    let config = test_config();
    let git = MockGit::new();
    let mut executor = MockExecutor::new();
    executor.time_out("tool build");
    let dir = project_at("1.1.0");
    let mut machine = ReleaseStateMachine::new(&config, dir.path(), &git, &executor);

    let err = machine.create_release().unwrap_err();
    assert!(matches!(err, ReleaseError::GateTimeout { .. }));
    assert_eq!(err.exit_code(), 6);
    assert!(git.tags().is_empty());
}

#[test]
fn feature_then_full_release_round_trip() {
    let config = test_config();
    let git = MockGit::new();
    let executor = MockExecutor::new();
    let dir = project_at("0.9.9");
    let mut machine = ReleaseStateMachine::new(&config, dir.path(), &git, &executor);

    machine.start_feature("polish-docs").unwrap();
    assert_eq!(git.current_branch().unwrap(), "feature/polish-docs");

    // Emergency path runs from the default branch
    git.set_current_branch("main");
    let session = machine.full_release(BumpKind::Patch).unwrap();
    assert_eq!(session.to_version.unwrap(), Version::new(0, 9, 10));
    assert_eq!(git.tags(), vec!["v0.9.10".to_string()]);

    // Both prepare and publish ran the full gate table
    assert_eq!(executor.call_count(), 2 * config.gates.len());
}
