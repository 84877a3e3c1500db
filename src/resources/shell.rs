//! `/etc/shells` registration and login shell resources.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Invocation;
use crate::platform::Platform;
use crate::tasks::Context;

/// A shell listed in `/etc/shells`, which `chsh` requires.
#[derive(Debug, Clone)]
pub struct ShellRegistration {
    shell: PathBuf,
    shells_file: PathBuf,
}

impl ShellRegistration {
    /// Describe the registration of `shell` in `shells_file`.
    #[must_use]
    pub fn new(shell: impl Into<PathBuf>, shells_file: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            shells_file: shells_file.into(),
        }
    }
}

/// Whether `shell` appears as a whole line of `content`.
fn is_listed(content: &str, shell: &Path) -> bool {
    content
        .lines()
        .map(str::trim)
        .any(|line| Path::new(line) == shell)
}

impl Resource for ShellRegistration {
    fn description(&self) -> String {
        format!("{} in {}", self.shell.display(), self.shells_file.display())
    }

    fn current_state(&self, _ctx: &Context) -> Result<ResourceState> {
        match std::fs::read_to_string(&self.shells_file) {
            Ok(content) if is_listed(&content, &self.shell) => Ok(ResourceState::Correct),
            Ok(_) => Ok(ResourceState::Missing),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(e)
                .with_context(|| format!("reading {}", self.shells_file.display())),
        }
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        ctx.run(
            Invocation::new("sudo")
                .args(["tee", "-a"])
                .arg(self.shells_file.display().to_string())
                .stdin(format!("{}\n", self.shell.display()))
                .discard_stdout(),
        )?;
        Ok(ResourceChange::Applied)
    }
}

/// The invoking user's login shell.
///
/// Read from the directory service on macOS and from the passwd file
/// elsewhere; changed with `chsh`.
#[derive(Debug, Clone)]
pub struct LoginShell {
    shell: PathBuf,
    user: String,
    platform: Platform,
    passwd_file: PathBuf,
}

impl LoginShell {
    /// Describe `user`'s login shell being `shell`.
    #[must_use]
    pub fn new(
        shell: impl Into<PathBuf>,
        user: impl Into<String>,
        platform: Platform,
        passwd_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            shell: shell.into(),
            user: user.into(),
            platform,
            passwd_file: passwd_file.into(),
        }
    }

    /// The user's current login shell, if it can be determined.
    ///
    /// # Errors
    ///
    /// Returns an error if the passwd file exists but cannot be read.
    pub fn current(&self, ctx: &Context) -> Result<Option<String>> {
        if self.platform.is_macos() {
            let result = ctx.probe_unchecked(
                Invocation::new("dscl")
                    .args([".", "-read"])
                    .arg(format!("/Users/{}", self.user))
                    .arg("UserShell"),
            )?;
            if !result.success {
                return Ok(None);
            }
            return Ok(parse_dscl_shell(&result.stdout));
        }
        match std::fs::read_to_string(&self.passwd_file) {
            Ok(content) => Ok(passwd_shell(&content, &self.user)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.passwd_file.display())),
        }
    }
}

/// Extract the value from `dscl . -read /Users/<u> UserShell` output.
fn parse_dscl_shell(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("UserShell:"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// The seventh field of `user`'s line in passwd-format `content`.
fn passwd_shell(content: &str, user: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let fields: Vec<&str> = line.split(':').collect();
        match fields.as_slice() {
            [name, _, _, _, _, _, shell, ..] if *name == user => Some((*shell).to_string()),
            _ => None,
        }
    })
}

impl Resource for LoginShell {
    fn description(&self) -> String {
        format!("login shell of {} → {}", self.user, self.shell.display())
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        Ok(match self.current(ctx)? {
            Some(current) if Path::new(&current) == self.shell => ResourceState::Correct,
            Some(current) => ResourceState::Incorrect { current },
            None => ResourceState::Missing,
        })
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        let shell = self.shell.display().to_string();
        let inv = if self.platform.is_macos() {
            Invocation::new("chsh").args(["-s", &shell])
        } else {
            Invocation::new("sudo").args(["chsh", "-s", &shell, &self.user])
        };
        ctx.run(inv)?;
        Ok(ResourceChange::Applied)
    }
}
