use assert_cmd::Command;
use predicates::prelude::*;

fn write_project(root: &std::path::Path, manifest_version: &str, module_version: &str) {
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(
        root.join("Cargo.toml"),
        format!(
            "[package]\nname = \"demo\"\nversion = \"{}\"\n",
            manifest_version
        ),
    )
    .unwrap();
    std::fs::write(
        root.join("src/version.rs"),
        format!("pub const VERSION: &str = \"{}\";\n", module_version),
    )
    .unwrap();
}

#[test]
fn help_lists_all_operations() {
    Command::cargo_bin("release-pilot")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("feature")
                .and(predicate::str::contains("patch"))
                .and(predicate::str::contains("minor"))
                .and(predicate::str::contains("major"))
                .and(predicate::str::contains("publish"))
                .and(predicate::str::contains("full-release"))
                .and(predicate::str::contains("check-version")),
        );
}

#[test]
fn check_version_reports_synced_version() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "1.2.3", "1.2.3");

    Command::cargo_bin("release-pilot")
        .unwrap()
        .arg("check-version")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Version OK: 1.2.3"));
}

#[test]
fn check_version_mismatch_exits_with_version_code() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "1.2.3", "1.2.2");

    Command::cargo_bin("release-pilot")
        .unwrap()
        .arg("check-version")
        .current_dir(dir.path())
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Version mismatch"));
}

#[test]
fn check_version_missing_files_fails() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("release-pilot")
        .unwrap()
        .arg("check-version")
        .current_dir(dir.path())
        .assert()
        .failure();
}

#[test]
fn workflow_commands_require_a_repository() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "1.2.3", "1.2.3");

    Command::cargo_bin("release-pilot")
        .unwrap()
        .args(["feature", "add-auth"])
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Not in a git repository"));
}

#[test]
fn full_release_rejects_unknown_bump_kind() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "1.2.3", "1.2.3");
    git2::Repository::init(dir.path()).unwrap();

    Command::cargo_bin("release-pilot")
        .unwrap()
        .args(["--yes", "full-release", "breaking"])
        .current_dir(dir.path())
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Invalid bump kind"));
}
