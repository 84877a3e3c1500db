//! Run configuration: CLI flags plus environment and config-file overrides.
//!
//! The three location values (repository URL, clone directory, manifest
//! path) are resolved in this order:
//!
//! 1. `REPO_URL` / `REPO_DIR` / `BREWFILE`, when set and non-empty
//! 2. `repo_url` / `repo_dir` / `manifest` from
//!    `$XDG_CONFIG_HOME/bootstrap/config.toml`
//! 3. built-in defaults
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::ConfigError;

/// Repository cloned when `REPO_URL` is not set.
pub const DEFAULT_REPO_URL: &str = "https://github.com/dotfiles/dotfiles.git";

/// Clone directory, relative to `$HOME`, used when `REPO_DIR` is not set.
pub const DEFAULT_REPO_DIR: &str = ".dotfiles";

/// Manifest file name inside the clone directory.
pub const DEFAULT_MANIFEST: &str = "Brewfile";

/// Immutable configuration for one run.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// `--yes`: answer every confirmation with yes.
    pub assume_yes: bool,
    /// `--dry-run`: print side-effecting commands instead of running them.
    pub dry_run: bool,
    /// `--skip-dotfiles`: no clone and no install script.
    pub skip_dotfiles: bool,
    /// `--skip-packages`: no `brew bundle`.
    pub skip_packages: bool,
    /// `--skip-settings`: leave OS preferences alone.
    pub skip_settings: bool,
    /// `--verbose`: debug output on the console.
    pub verbose: bool,
    /// Configuration repository to clone.
    pub repo_url: String,
    /// Local clone directory.
    pub repo_dir: PathBuf,
    /// Package manifest passed to `brew bundle`.
    pub manifest_path: PathBuf,
    /// User's home directory.
    pub home: PathBuf,
}

/// Optional on-disk overrides. Every key may be omitted.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Overrides the default repository URL.
    pub repo_url: Option<String>,
    /// Overrides the clone directory; `~` is expanded.
    pub repo_dir: Option<String>,
    /// Overrides the manifest path; `~` is expanded.
    pub manifest: Option<String>,
}

impl FileConfig {
    /// Load the config file at `path`. A missing file yields the empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::InvalidSyntax {
            path: path.display().to_string(),
            message: e.message().to_string(),
        })
    }
}

impl RunConfig {
    /// Resolve the configuration from parsed flags and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `HOME` is unset or the config file is invalid.
    pub fn from_env(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration using `env` as the environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `HOME` is unset or the config file is invalid.
    pub fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let home = lookup("HOME")
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingHome)?;
        let file = FileConfig::load(&config_file_path(&home, lookup("XDG_CONFIG_HOME")))?;

        let repo_url = lookup("REPO_URL")
            .or(file.repo_url)
            .unwrap_or_else(|| DEFAULT_REPO_URL.to_string());
        let repo_dir = lookup("REPO_DIR")
            .or(file.repo_dir)
            .map_or_else(|| home.join(DEFAULT_REPO_DIR), |d| expand_home(&d, &home));
        let manifest_path = lookup("BREWFILE")
            .or(file.manifest)
            .map_or_else(|| repo_dir.join(DEFAULT_MANIFEST), |m| expand_home(&m, &home));

        Ok(Self {
            assume_yes: cli.yes,
            dry_run: cli.dry_run,
            skip_dotfiles: cli.skip_dotfiles,
            skip_packages: cli.skip_packages,
            skip_settings: cli.skip_settings,
            verbose: cli.verbose,
            repo_url,
            repo_dir,
            manifest_path,
            home,
        })
    }
}

/// Path of the optional config file.
#[must_use]
pub fn config_file_path(home: &Path, xdg_config_home: Option<String>) -> PathBuf {
    xdg_config_home
        .map_or_else(|| home.join(".config"), PathBuf::from)
        .join("bootstrap")
        .join("config.toml")
}

/// Expand a leading `~` or `~/` against `home`.
fn expand_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        home.to_path_buf()
    } else if let Some(rest) = value.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(value)
    }
}
