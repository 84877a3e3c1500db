// Shared helpers for integration tests.
//
// Provides a scripted fake host (executor + prompt) and a fluent builder for
// a temporary home directory, so each integration test can run the real
// stage list against an isolated, fully controlled machine.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bootstrap_cli::config::RunConfig;
use bootstrap_cli::error::CommandError;
use bootstrap_cli::exec::{ExecResult, Executor, Invocation};
use bootstrap_cli::logging::{Log, MemoryLog};
use bootstrap_cli::platform::Platform;
use bootstrap_cli::prompt::Prompt;
use bootstrap_cli::tasks::{Context, SystemFiles};

/// Side effect applied to the fake host when a command runs.
type Hook = Box<dyn Fn()>;

/// Scripted executor standing in for a real machine.
///
/// Commands are matched by their rendered command line; unscripted commands
/// succeed with no output. Programs resolve only when their directory is on
/// the search path handed to [`Executor::which`].
#[derive(Default)]
pub struct FakeHost {
    responses: RefCell<HashMap<String, VecDeque<(bool, String)>>>,
    programs: RefCell<HashMap<String, PathBuf>>,
    installs: RefCell<HashMap<String, (String, PathBuf)>>,
    hooks: RefCell<HashMap<String, Hook>>,
    runs: RefCell<Vec<String>>,
}

impl std::fmt::Debug for FakeHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeHost")
            .field("programs", &self.programs)
            .field("runs", &self.runs)
            .finish_non_exhaustive()
    }
}

impl FakeHost {
    /// Queue a response for `command`; the last one repeats.
    pub fn respond(&self, command: &str, success: bool, stdout: &str) {
        self.responses
            .borrow_mut()
            .entry(command.to_string())
            .or_default()
            .push_back((success, stdout.to_string()));
    }

    /// Make `program` resolvable at `path`.
    pub fn provide(&self, program: &str, path: impl Into<PathBuf>) {
        self.programs
            .borrow_mut()
            .insert(program.to_string(), path.into());
    }

    /// Make `program` resolvable once `command` has run.
    pub fn provide_after(&self, command: &str, program: &str, path: impl Into<PathBuf>) {
        self.installs
            .borrow_mut()
            .insert(command.to_string(), (program.to_string(), path.into()));
    }

    /// Apply `hook` every time `command` runs successfully.
    pub fn on_run(&self, command: &str, hook: impl Fn() + 'static) {
        self.hooks
            .borrow_mut()
            .insert(command.to_string(), Box::new(hook));
    }

    /// Side-effecting commands executed so far, rendered.
    pub fn commands(&self) -> Vec<String> {
        self.runs.borrow().clone()
    }

    /// Forget the recorded commands.
    pub fn clear_commands(&self) {
        self.runs.borrow_mut().clear();
    }

    fn respond_to(&self, key: &str) -> (bool, String) {
        if let Some((program, path)) = self.installs.borrow_mut().remove(key) {
            self.provide(&program, path);
        }
        let mut responses = self.responses.borrow_mut();
        match responses.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => (true, String::new()),
        }
    }
}

impl Executor for FakeHost {
    fn run_unchecked(&self, inv: &Invocation) -> anyhow::Result<ExecResult> {
        let (success, stdout) = self.respond_to(&inv.to_string());
        Ok(ExecResult {
            stdout,
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        })
    }

    fn run_interactive(&self, inv: &Invocation) -> anyhow::Result<()> {
        let key = inv.to_string();
        self.runs.borrow_mut().push(key.clone());
        let (success, _) = self.respond_to(&key);
        if !success {
            return Err(CommandError::Failed {
                command: key,
                code: Some(1),
                stderr: String::new(),
            }
            .into());
        }
        if let Some(hook) = self.hooks.borrow().get(&key) {
            hook();
        }
        Ok(())
    }

    fn which(&self, program: &str, search_path: &OsStr) -> Option<PathBuf> {
        let path = self.programs.borrow().get(program).cloned()?;
        let dir = path.parent()?;
        std::env::split_paths(search_path)
            .any(|d| d == dir)
            .then_some(path)
    }
}

/// Prompt with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrompt(pub &'static str);

impl Prompt for FixedPrompt {
    fn ask(&self, _question: &str) -> std::io::Result<String> {
        Ok(format!("{}\n", self.0))
    }
}

/// Write an executable file at `path`, creating parent directories.
pub fn write_executable(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write executable");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod executable");
}

/// An isolated home directory backed by a [`tempfile::TempDir`].
pub struct TestHome {
    /// Temporary directory used as `$HOME`.
    pub root: tempfile::TempDir,
}

impl TestHome {
    /// Create an empty home directory with an `etc/` for shells and passwd.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("etc")).expect("create etc dir");
        Self { root }
    }

    /// Path to the home directory.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Stand-in for `/etc/shells`.
    pub fn shells_file(&self) -> PathBuf {
        self.path().join("etc").join("shells")
    }

    /// Stand-in for `/etc/passwd`.
    pub fn passwd_file(&self) -> PathBuf {
        self.path().join("etc").join("passwd")
    }

    /// Default run configuration for this home.
    pub fn config(&self) -> RunConfig {
        let repo_dir = self.path().join(".dotfiles");
        RunConfig {
            assume_yes: true,
            dry_run: false,
            skip_dotfiles: false,
            skip_packages: false,
            skip_settings: false,
            verbose: false,
            repo_url: "https://example.com/dotfiles.git".to_string(),
            manifest_path: repo_dir.join("Brewfile"),
            repo_dir,
            home: self.path().to_path_buf(),
        }
    }

    /// Replace `home` in `line` with `$HOME` so transcripts are stable.
    pub fn redact(&self, line: &str) -> String {
        line.replace(&self.path().display().to_string(), "$HOME")
    }
}

/// Build a [`Context`] for `platform` against `host`, as user `tester`.
pub fn make_context(
    home: &TestHome,
    config: RunConfig,
    platform: Platform,
    host: &Arc<FakeHost>,
) -> (Context, Arc<MemoryLog>) {
    let log = Arc::new(MemoryLog::new());
    let ctx = Context::new(
        Arc::new(config),
        platform,
        Arc::clone(&log) as Arc<dyn Log>,
        Arc::clone(host) as Arc<dyn Executor>,
        Arc::new(FixedPrompt("n")),
    )
    .with_user("tester")
    .with_search_path("/usr/bin:/bin")
    .with_system_files(SystemFiles {
        shells: home.shells_file(),
        passwd: home.passwd_file(),
    });
    (ctx, log)
}
