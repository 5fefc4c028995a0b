use std::fmt;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ReleaseError, Result};

/// Semantic version representation
///
/// Immutable value type; bumping produces a new version. Ordering is
/// lexicographic on the (major, minor, patch) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string with the strict `X.Y.Z` grammar.
    ///
    /// Exactly three dot-separated non-negative integers; no `v` prefix,
    /// no pre-release or build suffix.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() != 3 {
            return Err(ReleaseError::version(format!(
                "Invalid version format: '{}' - expected X.Y.Z",
                text
            )));
        }

        let major = parts[0]
            .parse::<u32>()
            .map_err(|_| ReleaseError::version(format!("Invalid major version: {}", parts[0])))?;
        let minor = parts[1]
            .parse::<u32>()
            .map_err(|_| ReleaseError::version(format!("Invalid minor version: {}", parts[1])))?;
        let patch = parts[2]
            .parse::<u32>()
            .map_err(|_| ReleaseError::version(format!("Invalid patch version: {}", parts[2])))?;

        Ok(Version {
            major,
            minor,
            patch,
        })
    }

    /// Bump version according to bump kind
    pub fn bump(&self, kind: BumpKind) -> Self {
        match kind {
            BumpKind::Major => Version {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            BumpKind::Minor => Version {
                major: self.major,
                minor: self.minor + 1,
                patch: 0,
            },
            BumpKind::Patch => Version {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
            },
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Kind of semantic version increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BumpKind::Patch => "patch",
            BumpKind::Minor => "minor",
            BumpKind::Major => "major",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for BumpKind {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "patch" => Ok(BumpKind::Patch),
            "minor" => Ok(BumpKind::Minor),
            "major" => Ok(BumpKind::Major),
            other => Err(ReleaseError::version(format!(
                "Invalid bump kind: '{}' - expected patch, minor or major",
                other
            ))),
        }
    }
}

/// A named file location holding the project's declared version.
///
/// `pattern` is a regex whose capture group 1 is the version token,
/// e.g. `(?m)^version = "([^"]+)"` for a Cargo manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionSource {
    pub name: String,
    pub path: String,
    pub pattern: String,
}

impl VersionSource {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        VersionSource {
            name: name.into(),
            path: path.into(),
            pattern: pattern.into(),
        }
    }

    fn regex(&self) -> Result<Regex> {
        Regex::new(&self.pattern).map_err(|e| {
            ReleaseError::config(format!(
                "Invalid version pattern for source '{}': {}",
                self.name, e
            ))
        })
    }

    /// Locate the version token in `content`, returning its byte range.
    fn token_range(&self, content: &str) -> Result<(usize, usize)> {
        let re = self.regex()?;
        let caps = re.captures(content).ok_or_else(|| {
            ReleaseError::version(format!(
                "Could not find version in {} ({})",
                self.name, self.path
            ))
        })?;
        let group = caps.get(1).ok_or_else(|| {
            ReleaseError::config(format!(
                "Version pattern for source '{}' has no capture group",
                self.name
            ))
        })?;
        Ok((group.start(), group.end()))
    }

    /// Read and strict-parse the version declared in this source.
    pub fn read(&self, root: &Path) -> Result<Version> {
        let content = std::fs::read_to_string(root.join(&self.path))?;
        let (start, end) = self.token_range(&content)?;
        Version::parse(&content[start..end])
    }

    /// Rewrite the version token in place, preserving every other byte.
    pub fn write(&self, root: &Path, version: Version) -> Result<()> {
        let path = root.join(&self.path);
        let content = std::fs::read_to_string(&path)?;
        let (start, end) = self.token_range(&content)?;

        let mut updated = String::with_capacity(content.len());
        updated.push_str(&content[..start]);
        updated.push_str(&version.to_string());
        updated.push_str(&content[end..]);

        std::fs::write(&path, updated)?;
        Ok(())
    }
}

/// Read the declared version from every source and verify they agree.
///
/// Read-only: fails with a parse error on malformed input and with a
/// mismatch error naming both sources if any two disagree.
pub fn read_current_version(root: &Path, sources: &[VersionSource]) -> Result<Version> {
    let first = sources
        .first()
        .ok_or_else(|| ReleaseError::config("No version sources configured"))?;
    let reference = first.read(root)?;

    for source in &sources[1..] {
        let version = source.read(root)?;
        if version != reference {
            return Err(ReleaseError::VersionMismatch {
                first_name: first.name.clone(),
                first: reference.to_string(),
                second_name: source.name.clone(),
                second: version.to_string(),
            });
        }
    }

    Ok(reference)
}

/// Rewrite every source's version field to `version`.
///
/// Sources are written in order. A failed later write reports which
/// sources were already rewritten; there is no rollback - the working
/// tree shows dirty and the next run surfaces the inconsistency.
pub fn write_version(root: &Path, sources: &[VersionSource], version: Version) -> Result<()> {
    let mut written: Vec<String> = Vec::new();

    for source in sources {
        if let Err(e) = source.write(root, version) {
            return Err(ReleaseError::PartialWrite {
                written,
                failed: source.name.clone(),
                reason: e.to_string(),
            });
        }
        written.push(source.name.clone());
    }

    Ok(())
}
