use std::path::{Path, PathBuf};

use git2::{BranchType, Repository};
use log::debug;

use crate::error::{ReleaseError, Result};
use crate::git::GitBackend;

/// Environment variables consulted for an HTTPS push/fetch credential.
///
/// Optional: absence never blocks the SSH key / agent flow.
const TOKEN_VARS: [&str; 2] = ["RELEASE_PILOT_TOKEN", "GITHUB_TOKEN"];

/// Real [GitBackend] implementation over the `git2` crate.
///
/// Holds only the repository root; every call re-discovers the repository
/// and derives its answer from current on-disk state.
pub struct Git2Backend {
    root: PathBuf,
}

impl Git2Backend {
    /// Create a backend rooted at `root` (or any directory inside the
    /// repository).
    ///
    /// # Returns
    /// * `Ok(Git2Backend)` - `root` is inside a git repository
    /// * `Err` - not in a git repository
    pub fn discover(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        // Validate up front so callers fail before any workflow starts
        Repository::discover(&root)
            .map_err(|e| ReleaseError::config(format!("Not in a git repository: {}", e)))?;
        Ok(Git2Backend { root })
    }

    fn open(&self) -> Result<Repository> {
        Ok(Repository::discover(&self.root)?)
    }

    /// Credential chain shared by fetch and push: SSH keys from ~/.ssh,
    /// then the SSH agent, then a token over HTTPS, then libgit2 defaults.
    fn callbacks<'cb>() -> git2::RemoteCallbacks<'cb> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = PathBuf::from(&home).join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(
                            username_from_url.unwrap_or("git"),
                            None,
                            &path,
                            None,
                        ) {
                            return Ok(cred);
                        }
                    }
                }

                if let Ok(cred) =
                    git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                {
                    return Ok(cred);
                }
            }

            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                for var in TOKEN_VARS {
                    if let Ok(token) = std::env::var(var) {
                        if !token.is_empty() {
                            return git2::Cred::userpass_plaintext("x-access-token", &token);
                        }
                    }
                }
            }

            git2::Cred::default()
        });
        callbacks
    }
}

impl GitBackend for Git2Backend {
    fn current_branch(&self) -> Result<String> {
        let repo = self.open()?;
        let head = repo.head()?;
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    fn is_clean(&self) -> Result<bool> {
        let repo = self.open()?;
        let mut options = git2::StatusOptions::new();
        options.include_untracked(true).include_ignored(false);
        let statuses = repo.statuses(Some(&mut options))?;
        Ok(statuses.is_empty())
    }

    fn fetch(&self, remote: &str, branch: &str) -> Result<()> {
        debug!("fetching {}/{}", remote, branch);
        let repo = self.open()?;
        let mut remote_handle = repo
            .find_remote(remote)
            .map_err(|_| ReleaseError::Sync(format!("Remote '{}' not found", remote)))?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(Self::callbacks());

        let refspec_branch = format!("+refs/heads/{0}:refs/remotes/{1}/{0}", branch, remote);
        let refspecs = &[refspec_branch.as_str(), "+refs/tags/*:refs/tags/*"];
        remote_handle
            .fetch(refspecs, Some(&mut fetch_options), None)
            .map_err(|e| {
                ReleaseError::Sync(format!("Failed to fetch from '{}': {}", remote, e))
            })?;
        Ok(())
    }

    fn ahead_behind(&self, branch: &str, remote: &str) -> Result<(usize, usize)> {
        let repo = self.open()?;
        let local = repo
            .find_branch(branch, BranchType::Local)?
            .into_reference()
            .target()
            .ok_or_else(|| ReleaseError::config(format!("Branch '{}' has no target", branch)))?;

        let remote_ref = format!("refs/remotes/{}/{}", remote, branch);
        let upstream = match repo.find_reference(&remote_ref) {
            Ok(r) => match r.target() {
                Some(oid) => oid,
                None => return Ok((0, 0)),
            },
            // No remote counterpart yet - nothing to compare against
            Err(_) => return Ok((0, 0)),
        };

        let (ahead, behind) = repo.graph_ahead_behind(local, upstream)?;
        Ok((ahead, behind))
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        debug!("checkout {}", branch);
        let repo = self.open()?;
        repo.find_branch(branch, BranchType::Local)
            .map_err(|_| ReleaseError::Checkout(format!("Branch '{}' not found", branch)))?;
        repo.set_head(&format!("refs/heads/{}", branch))?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().safe()))?;
        Ok(())
    }

    fn fast_forward(&self, branch: &str, remote: &str) -> Result<()> {
        let repo = self.open()?;
        let remote_ref_name = format!("refs/remotes/{}/{}", remote, branch);
        let remote_ref = match repo.find_reference(&remote_ref_name) {
            Ok(r) => r,
            // Remote branch doesn't exist, nothing to update
            Err(_) => return Ok(()),
        };
        let remote_oid = remote_ref
            .target()
            .ok_or_else(|| ReleaseError::config(format!("{} is invalid", remote_ref_name)))?;

        let local_branch = match repo.find_branch(branch, BranchType::Local) {
            Ok(b) => b,
            Err(_) => {
                // Local branch doesn't exist, create it from remote
                let remote_commit = repo.find_commit(remote_oid)?;
                repo.branch(branch, &remote_commit, false)?;
                return Ok(());
            }
        };

        let local_oid = match local_branch.into_reference().target() {
            Some(oid) => oid,
            None => return Ok(()),
        };

        if local_oid == remote_oid {
            return Ok(());
        }

        // Only move the ref when remote is strictly ahead of local;
        // ahead-only and diverged branches are left untouched.
        if !repo.graph_descendant_of(remote_oid, local_oid)? {
            return Ok(());
        }

        debug!("fast-forwarding {} to {}", branch, remote_oid);
        let mut reference = repo.find_reference(&format!("refs/heads/{}", branch))?;
        reference.set_target(remote_oid, &format!("fast-forward from {}", remote_ref_name))?;

        // Sync the working tree when the moved branch is checked out
        if repo.head()?.shorthand() == Some(branch) {
            repo.checkout_head(Some(git2::build::CheckoutBuilder::default().safe()))?;
        }
        Ok(())
    }

    fn create_branch(&self, branch: &str) -> Result<()> {
        debug!("creating branch {}", branch);
        let repo = self.open()?;
        let head = repo.head()?.peel_to_commit()?;
        repo.branch(branch, &head, false)?;
        repo.set_head(&format!("refs/heads/{}", branch))?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().safe()))?;
        Ok(())
    }

    fn commit_paths(&self, paths: &[String], message: &str) -> Result<()> {
        debug!("committing {:?}", paths);
        let repo = self.open()?;
        let mut index = repo.index()?;
        for path in paths {
            index.add_path(Path::new(path))?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let parent = repo.head()?.peel_to_commit()?;
        let signature = repo.signature()?;
        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        let repo = self.open()?;
        let exists = repo
            .find_reference(&format!("refs/tags/{}", name))
            .is_ok();
        Ok(exists)
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        debug!("tagging {}", name);
        let repo = self.open()?;
        let head = repo.head()?.peel_to_commit()?;
        let signature = repo.signature()?;
        repo.tag(name, head.as_object(), &signature, message, false)
            .map_err(|e| ReleaseError::tag(format!("Failed to create tag '{}': {}", name, e)))?;
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        debug!("pushing tag {} to {}", name, remote);
        let repo = self.open()?;
        let mut remote = repo
            .find_remote(remote)
            .map_err(|_| ReleaseError::push(format!("No remote named '{}' found", remote)))?;

        let mut callbacks = Self::callbacks();
        // Catch per-reference rejections the transport reports after the
        // connection itself succeeded
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                Err(git2::Error::from_str(&format!(
                    "Push rejected for {}: {}",
                    refname, status
                )))
            } else {
                Ok(())
            }
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(
                &[&format!("refs/tags/{}", name)],
                Some(&mut push_options),
            )
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    ReleaseError::push(format!("Network error during push: {}", e))
                } else {
                    ReleaseError::push(format!("Failed to push tag '{}': {}", name, e))
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_fails_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let result = Git2Backend::discover(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_and_probe_fresh_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        // Initial commit so HEAD resolves
        std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = repo.signature().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();

        let backend = Git2Backend::discover(dir.path()).unwrap();
        assert!(backend.is_clean().unwrap());
        assert!(!backend.tag_exists("v1.0.0").unwrap());

        backend.create_annotated_tag("v1.0.0", "Release v1.0.0").unwrap();
        assert!(backend.tag_exists("v1.0.0").unwrap());

        std::fs::write(dir.path().join("dirty.txt"), "x").unwrap();
        assert!(!backend.is_clean().unwrap());
    }

    #[test]
    fn test_ahead_behind_without_remote_branch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("a.txt")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = repo.signature().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();
        let branch = repo.head().unwrap().shorthand().unwrap().to_string();

        let backend = Git2Backend::discover(dir.path()).unwrap();
        assert_eq!(backend.ahead_behind(&branch, "origin").unwrap(), (0, 0));
    }
}
