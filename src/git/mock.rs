use std::sync::Mutex;

use crate::error::{ReleaseError, Result};
use crate::git::GitBackend;

#[derive(Debug, Clone)]
struct MockState {
    current_branch: String,
    clean: bool,
    ahead: usize,
    behind: usize,
    branches: Vec<String>,
    tags: Vec<String>,
    commits: Vec<(Vec<String>, String)>,
    pushed_tags: Vec<(String, String)>,
    fetches: usize,
}

/// Mock backend for testing workflows without a real repository.
///
/// Starts on a clean, synced `main`. Probes answer from the configured
/// state; mutating calls are recorded so tests can assert exactly which
/// side effects a workflow produced.
pub struct MockGit {
    state: Mutex<MockState>,
}

impl MockGit {
    pub fn new() -> Self {
        MockGit {
            state: Mutex::new(MockState {
                current_branch: "main".to_string(),
                clean: true,
                ahead: 0,
                behind: 0,
                branches: vec!["main".to_string()],
                tags: Vec::new(),
                commits: Vec::new(),
                pushed_tags: Vec::new(),
                fetches: 0,
            }),
        }
    }

    pub fn set_current_branch(&self, branch: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        let branch = branch.into();
        if !state.branches.contains(&branch) {
            state.branches.push(branch.clone());
        }
        state.current_branch = branch;
    }

    pub fn set_clean(&self, clean: bool) {
        self.state.lock().unwrap().clean = clean;
    }

    pub fn set_ahead_behind(&self, ahead: usize, behind: usize) {
        let mut state = self.state.lock().unwrap();
        state.ahead = ahead;
        state.behind = behind;
    }

    pub fn add_tag(&self, name: impl Into<String>) {
        self.state.lock().unwrap().tags.push(name.into());
    }

    /// Branches known to the mock, in creation order
    pub fn branches(&self) -> Vec<String> {
        self.state.lock().unwrap().branches.clone()
    }

    /// Commits recorded as `(paths, message)`, in order
    pub fn commits(&self) -> Vec<(Vec<String>, String)> {
        self.state.lock().unwrap().commits.clone()
    }

    /// Tags created locally, in order
    pub fn tags(&self) -> Vec<String> {
        self.state.lock().unwrap().tags.clone()
    }

    /// Tags pushed as `(remote, tag)`, in order
    pub fn pushed_tags(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pushed_tags.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches
    }
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitBackend for MockGit {
    fn current_branch(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().current_branch.clone())
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().clean)
    }

    fn fetch(&self, _remote: &str, _branch: &str) -> Result<()> {
        self.state.lock().unwrap().fetches += 1;
        Ok(())
    }

    fn ahead_behind(&self, _branch: &str, _remote: &str) -> Result<(usize, usize)> {
        let state = self.state.lock().unwrap();
        Ok((state.ahead, state.behind))
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.branches.iter().any(|b| b == branch) {
            return Err(ReleaseError::Checkout(format!(
                "Branch '{}' not found",
                branch
            )));
        }
        state.current_branch = branch.to_string();
        Ok(())
    }

    fn fast_forward(&self, _branch: &str, _remote: &str) -> Result<()> {
        Ok(())
    }

    fn create_branch(&self, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.branches.iter().any(|b| b == branch) {
            return Err(ReleaseError::config(format!(
                "Branch '{}' already exists",
                branch
            )));
        }
        state.branches.push(branch.to_string());
        state.current_branch = branch.to_string();
        Ok(())
    }

    fn commit_paths(&self, paths: &[String], message: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.commits.push((paths.to_vec(), message.to_string()));
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().tags.iter().any(|t| t == name))
    }

    fn create_annotated_tag(&self, name: &str, _message: &str) -> Result<()> {
        self.state.lock().unwrap().tags.push(name.to_string());
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.tags.iter().any(|t| t == name) {
            return Err(ReleaseError::push(format!("Tag '{}' does not exist", name)));
        }
        state
            .pushed_tags
            .push((remote.to_string(), name.to_string()));
        Ok(())
    }
}
