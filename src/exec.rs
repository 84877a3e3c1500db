//! Typed process invocation and the [`Executor`] seam.
//!
//! Every external program is described by an [`Invocation`] (program,
//! argument list, extra environment, optional stdin) rather than a string
//! handed to a shell, so no quoting is ever involved. The dry-run switch
//! lives one layer up in [`Context`](crate::tasks::Context); executors
//! always execute.
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::Result;

use crate::error::CommandError;

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, OsString)>,
    dir: Option<PathBuf>,
    stdin: Option<String>,
    discard_stdout: bool,
}

impl Invocation {
    /// Start describing a call to `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            dir: None,
            stdin: None,
            discard_stdout: false,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        let key = key.into();
        self.envs.retain(|(k, _)| *k != key);
        self.envs.push((key, value.into()));
        self
    }

    /// Run the child in `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Feed `data` to the child's standard input.
    #[must_use]
    pub fn stdin(mut self, data: impl Into<String>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// Send the child's standard output to the null device when it runs
    /// attached to the terminal.
    #[must_use]
    pub const fn discard_stdout(mut self) -> Self {
        self.discard_stdout = true;
        self
    }

    /// Program name or path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument list.
    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Value of an extra environment variable, if one was set.
    #[must_use]
    pub fn get_env(&self, key: &str) -> Option<&OsStr> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    /// Working directory override.
    #[must_use]
    pub fn get_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Data piped to standard input.
    #[must_use]
    pub fn get_stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Whether standard output is discarded.
    #[must_use]
    pub const fn discards_stdout(&self) -> bool {
        self.discard_stdout
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Render the invocation as a readable command line.
///
/// Only used for display (dry-run transcript, error messages); arguments are
/// quoted when they contain whitespace or shell metacharacters. Extra
/// environment variables are not shown, stdin is shown as a here-string.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        if let Some(input) = &self.stdin {
            write!(f, " <<< {}", quote(input.trim_end()))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    let needs_quotes = s.is_empty()
        || s.chars()
            .any(|c| c.is_whitespace() || "\"'$`\\|&;<>()*?!#~".contains(c));
    if needs_quotes {
        format!("'{}'", s.replace('\'', r"'\''"))
    } else {
        s.to_string()
    }
}

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over running external programs, injectable for tests.
pub trait Executor: fmt::Debug {
    /// Run with captured output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the program cannot be spawned or fails.
    fn run(&self, inv: &Invocation) -> Result<ExecResult> {
        let result = self.run_unchecked(inv)?;
        if !result.success {
            return Err(CommandError::Failed {
                command: inv.to_string(),
                code: result.code,
                stderr: result.stderr,
            }
            .into());
        }
        Ok(result)
    }

    /// Run with captured output, returning the result whatever the exit status.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the program cannot be started.
    fn run_unchecked(&self, inv: &Invocation) -> Result<ExecResult>;

    /// Run attached to the terminal (inherited stdout/stderr, and stdin
    /// unless the invocation pipes data in). Fails on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the program cannot be spawned or fails.
    fn run_interactive(&self, inv: &Invocation) -> Result<()>;

    /// Resolve `program` against the directories in `search_path`.
    fn which(&self, program: &str, search_path: &OsStr) -> Option<PathBuf>;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(&self, inv: &Invocation) -> Result<ExecResult> {
        let mut cmd = inv.to_command();
        let output = if let Some(input) = inv.get_stdin() {
            let mut child = cmd
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|source| spawn_error(inv, source))?;
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())
                    .map_err(|source| spawn_error(inv, source))?;
            }
            child
                .wait_with_output()
                .map_err(|source| spawn_error(inv, source))?
        } else {
            cmd.output().map_err(|source| spawn_error(inv, source))?
        };
        Ok(ExecResult::from(output))
    }

    fn run_interactive(&self, inv: &Invocation) -> Result<()> {
        let mut cmd = inv.to_command();
        if inv.discards_stdout() {
            cmd.stdout(Stdio::null());
        }
        let status = if let Some(input) = inv.get_stdin() {
            let mut child = cmd
                .stdin(Stdio::piped())
                .spawn()
                .map_err(|source| spawn_error(inv, source))?;
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())
                    .map_err(|source| spawn_error(inv, source))?;
            }
            child.wait().map_err(|source| spawn_error(inv, source))?
        } else {
            cmd.status().map_err(|source| spawn_error(inv, source))?
        };
        if !status.success() {
            return Err(CommandError::Failed {
                command: inv.to_string(),
                code: status.code(),
                stderr: String::new(),
            }
            .into());
        }
        Ok(())
    }

    fn which(&self, program: &str, search_path: &OsStr) -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        which::which_in(program, Some(search_path), cwd).ok()
    }
}

/// Whether `path` is a regular file with an execute bit set.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        metadata.is_file()
    }
}

fn spawn_error(inv: &Invocation, source: std::io::Error) -> CommandError {
    CommandError::Spawn {
        command: inv.to_string(),
        source,
    }
}
