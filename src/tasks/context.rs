//! Shared state handed to every stage.
use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::TaskResult;
use crate::config::RunConfig;
use crate::exec::{ExecResult, Executor, Invocation};
use crate::logging::Log;
use crate::platform::{HostProbe, Platform};
use crate::prompt::{self, Prompt};

/// Search path used when the process has no `PATH` at all.
const FALLBACK_SEARCH_PATH: &str = "/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";

/// Host files read when checking the login shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFiles {
    /// List of permitted login shells.
    pub shells: PathBuf,
    /// Local user database.
    pub passwd: PathBuf,
}

impl Default for SystemFiles {
    fn default() -> Self {
        Self {
            shells: PathBuf::from("/etc/shells"),
            passwd: PathBuf::from("/etc/passwd"),
        }
    }
}

/// Shared context for stage execution.
///
/// Owns the execution shim: every side-effecting command goes through
/// [`run`](Self::run), which prints instead of executing under `--dry-run`.
pub struct Context {
    /// Resolved run configuration.
    pub config: Arc<RunConfig>,
    /// Detected platform.
    pub platform: Platform,
    /// Logger for output and stage recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Answers confirmation questions when `--yes` was not given.
    pub prompt: Arc<dyn Prompt>,
    /// Login name of the invoking user.
    pub user: String,
    /// Locations of `/etc/shells` and `/etc/passwd`.
    pub system_files: SystemFiles,
    /// Where Homebrew lives, or will be installed, on this host.
    pub homebrew_prefix: PathBuf,
    /// Directories searched for programs, exported as `PATH` to children.
    search_path: RefCell<OsString>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("prompt", &"<dyn Prompt>")
            .field("user", &self.user)
            .field("system_files", &self.system_files)
            .field("homebrew_prefix", &self.homebrew_prefix)
            .field("search_path", &self.search_path)
            .finish()
    }
}

impl Context {
    /// Create a context seeded from the process environment (`USER`, `PATH`).
    #[must_use]
    pub fn new(
        config: Arc<RunConfig>,
        platform: Platform,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        let user = std::env::var("USER")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(whoami::username);
        let search_path = std::env::var_os("PATH")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| OsString::from(FALLBACK_SEARCH_PATH));

        Self {
            config,
            platform,
            log,
            executor,
            prompt,
            user,
            system_files: SystemFiles::default(),
            homebrew_prefix: platform.homebrew_prefix(&HostProbe::default()).to_path_buf(),
            search_path: RefCell::new(search_path),
        }
    }

    /// Replace the user name.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Replace the initial search path.
    #[must_use]
    pub fn with_search_path(self, search_path: impl Into<OsString>) -> Self {
        self.search_path.replace(search_path.into());
        self
    }

    /// Replace the source of confirmation answers.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Use the Homebrew prefix detected for this host.
    #[must_use]
    pub fn with_homebrew_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.homebrew_prefix = prefix.into();
        self
    }

    /// Read `/etc/shells` and `/etc/passwd` from other locations.
    #[must_use]
    pub fn with_system_files(mut self, system_files: SystemFiles) -> Self {
        self.system_files = system_files;
        self
    }

    /// Whether side-effecting commands are only printed.
    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// [`TaskResult`] for a stage that changed (or would change) the host.
    #[must_use]
    pub fn changed(&self) -> TaskResult {
        if self.dry_run() {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }

    /// Current search path.
    #[must_use]
    pub fn search_path(&self) -> OsString {
        self.search_path.borrow().clone()
    }

    /// Put `dir` at the front of the search path unless it is already on it.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be represented in a `PATH` value.
    pub fn extend_search_path(&self, dir: &Path) -> Result<()> {
        let current = self.search_path();
        let mut dirs: Vec<PathBuf> = std::env::split_paths(&current)
            .filter(|d| !d.as_os_str().is_empty())
            .collect();
        if dirs.iter().any(|d| d == dir) {
            return Ok(());
        }
        dirs.insert(0, dir.to_path_buf());
        let joined = std::env::join_paths(dirs)
            .with_context(|| format!("cannot add {} to the search path", dir.display()))?;
        self.log
            .debug(&format!("search path extended with {}", dir.display()));
        self.search_path.replace(joined);
        Ok(())
    }

    /// Resolve `program` on the search path.
    #[must_use]
    pub fn which(&self, program: &str) -> Option<PathBuf> {
        self.executor.which(program, &self.search_path())
    }

    fn with_path(&self, inv: Invocation) -> Invocation {
        if inv.get_env("PATH").is_some() {
            inv
        } else {
            inv.env("PATH", self.search_path())
        }
    }

    /// Run a side-effecting command attached to the terminal.
    ///
    /// In dry-run mode the command line is logged and nothing is executed.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`](crate::error::CommandError) if the command
    /// cannot be spawned or exits non-zero.
    pub fn run(&self, inv: Invocation) -> Result<()> {
        if self.dry_run() {
            self.log.dry_run(&inv.to_string());
            return Ok(());
        }
        self.log.debug(&format!("running: {inv}"));
        self.executor.run_interactive(&self.with_path(inv))
    }

    /// Run a read-only command with captured output. Runs even in dry-run.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`](crate::error::CommandError) if the command
    /// cannot be spawned or exits non-zero.
    pub fn probe(&self, inv: Invocation) -> Result<ExecResult> {
        self.log.debug(&format!("probing: {inv}"));
        self.executor.run(&self.with_path(inv))
    }

    /// Like [`probe`](Self::probe) but returns the result whatever the exit status.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`](crate::error::CommandError::Spawn) if
    /// the command cannot be started.
    pub fn probe_unchecked(&self, inv: Invocation) -> Result<ExecResult> {
        self.log.debug(&format!("probing: {inv}"));
        self.executor.run_unchecked(&self.with_path(inv))
    }

    /// Ask a yes/no question. Always yes under `--yes`.
    ///
    /// An unreadable stdin counts as "no".
    pub fn confirm(&self, question: &str) -> bool {
        if self.config.assume_yes {
            return true;
        }
        match self.prompt.ask(question) {
            Ok(answer) => prompt::is_yes(&answer),
            Err(e) => {
                self.log.debug(&format!("could not read answer: {e}"));
                false
            }
        }
    }
}
