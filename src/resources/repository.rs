//! Local clone of the configuration repository.
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Invocation;
use crate::tasks::Context;

/// A local clone of the configuration repository.
///
/// An existing checkout is reused as-is; it is never fetched, pulled or
/// reset. Its `origin` URL is read (with `git2`) only to report a mismatch.
#[derive(Debug, Clone)]
pub struct RepositoryClone {
    url: String,
    dir: PathBuf,
}

impl RepositoryClone {
    /// Describe a clone of `url` at `dir`.
    #[must_use]
    pub fn new(url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dir: dir.into(),
        }
    }

    /// Clone directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether `dir` already holds a git checkout.
    #[must_use]
    pub fn is_cloned(&self) -> bool {
        self.dir.join(".git").exists()
    }

    /// URL of the existing checkout's `origin` remote, if it can be read.
    #[must_use]
    pub fn origin_url(&self) -> Option<String> {
        let repo = git2::Repository::open(&self.dir).ok()?;
        let remote = repo.find_remote("origin").ok()?;
        remote.url().map(String::from)
    }
}

impl Resource for RepositoryClone {
    fn description(&self) -> String {
        format!("{} → {}", self.url, self.dir.display())
    }

    fn current_state(&self, _ctx: &Context) -> Result<ResourceState> {
        if self.is_cloned() {
            return Ok(match self.origin_url() {
                Some(origin) if origin != self.url => ResourceState::Incorrect { current: origin },
                _ => ResourceState::Correct,
            });
        }
        let occupied = std::fs::read_dir(&self.dir).is_ok_and(|mut entries| entries.next().is_some());
        if occupied {
            return Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a git checkout", self.dir.display()),
            });
        }
        Ok(ResourceState::Missing)
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        ctx.run(
            Invocation::new("git")
                .arg("clone")
                .arg(&self.url)
                .arg(self.dir.display().to_string()),
        )?;
        Ok(ResourceChange::Applied)
    }
}
