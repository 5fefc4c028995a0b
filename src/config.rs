use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReleaseError, Result};
use crate::pipeline::GateSpec;
use crate::version::VersionSource;

/// Complete configuration for release-pilot.
///
/// Owns the ordered gate table and the version source list so both can be
/// substituted in tests (and per project) without touching orchestration
/// logic.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_branch")]
    pub default_branch: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    /// Upper bound for a single gate command, in seconds
    #[serde(default = "default_gate_timeout_secs")]
    pub gate_timeout_secs: u64,

    #[serde(default = "default_sources")]
    pub sources: Vec<VersionSource>,

    #[serde(default = "default_gates")]
    pub gates: Vec<GateSpec>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_gate_timeout_secs() -> u64 {
    600
}

/// Default version sources: the package manifest and the module constant.
///
/// Both must always declare the identical version; `check-version`
/// enforces it and `prepare-release` rewrites both together.
fn default_sources() -> Vec<VersionSource> {
    vec![
        VersionSource::new("manifest", "Cargo.toml", r#"(?m)^version\s*=\s*"([^"]+)""#),
        VersionSource::new(
            "module",
            "src/version.rs",
            r#"VERSION:\s*&str\s*=\s*"([^"]+)""#,
        ),
    ]
}

/// Canonical gate ordering: cheap, fast checks before expensive ones so a
/// broken tree fails early.
fn default_gates() -> Vec<GateSpec> {
    vec![
        GateSpec::required("lint", &["cargo", "clippy", "--", "-D", "warnings"]),
        GateSpec::required("format-check", &["cargo", "fmt", "--", "--check"]),
        GateSpec::required("tests", &["cargo", "test"]),
        GateSpec::required("version-sync", &["release-pilot", "check-version"]),
        GateSpec::required("build", &["cargo", "build", "--release"]),
        GateSpec::required("package-metadata", &["cargo", "package"]),
        GateSpec::required("artifact-contents", &["cargo", "package", "--list"]),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_branch: default_branch(),
            remote: default_remote(),
            gate_timeout_secs: default_gate_timeout_secs(),
            sources: default_sources(),
            gates: default_gates(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-pilot.toml` in the current directory
/// 3. `release-pilot.toml` in the user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./release-pilot.toml").exists() {
        fs::read_to_string("./release-pilot.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join("release-pilot.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config =
        toml::from_str(&config_str).map_err(|e| ReleaseError::config(e.to_string()))?;

    if config.sources.len() < 2 {
        return Err(ReleaseError::config(
            "At least two version sources are required to check synchronization",
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.remote, "origin");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].name, "manifest");
        assert_eq!(config.sources[1].name, "module");
    }

    #[test]
    fn test_default_gate_ordering() {
        let config = Config::default();
        let names: Vec<&str> = config
            .gates
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "lint",
                "format-check",
                "tests",
                "version-sync",
                "build",
                "package-metadata",
                "artifact-contents"
            ]
        );
    }

    #[test]
    fn test_default_gates_are_required() {
        assert!(Config::default().gates.iter().all(|g| g.required));
    }

    #[test]
    fn test_parse_config_overrides() {
        let toml_str = r#"
            default_branch = "master"
            gate_timeout_secs = 120

            [[sources]]
            name = "manifest"
            path = "pyproject.toml"
            pattern = '(?m)^version\s*=\s*"([^"]+)"'

            [[sources]]
            name = "module"
            path = "src/pkg/__init__.py"
            pattern = '__version__\s*=\s*"([^"]+)"'

            [[gates]]
            name = "tests"
            command = ["pytest", "-q"]
            required = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_branch, "master");
        assert_eq!(config.remote, "origin");
        assert_eq!(config.gate_timeout_secs, 120);
        assert_eq!(config.gates.len(), 1);
        assert!(!config.gates[0].required);
        assert_eq!(config.sources[1].path, "src/pkg/__init__.py");
    }

    #[test]
    fn test_gate_required_defaults_to_true() {
        let toml_str = r#"
            [[gates]]
            name = "lint"
            command = ["cargo", "clippy"]
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.gates[0].required);
    }
}
