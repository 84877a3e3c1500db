//! Domain-specific error types for the bootstrap engine.
//!
//! Stages and the executor raise [`EnvironmentError`] and [`CommandError`]
//! directly as [`anyhow::Error`], so the install command can attach stage
//! context while callers can still `downcast_ref` to the typed cause.
//! [`BootstrapError`] groups the three kinds into one type; the binary
//! reports configuration failures through it. Every variant is fatal:
//! advisory conditions are reported as skipped stages, never as errors.
//!
//! # Error hierarchy
//!
//! ```text
//! BootstrapError
//! ├── Config(ConfigError)            configuration that cannot be resolved
//! ├── Environment(EnvironmentError)  host preconditions that are not met
//! └── Command(CommandError)          external commands that failed
//! ```

use thiserror::Error;

/// Top-level error type for the bootstrap engine.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A host precondition is not met.
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// An external command could not be run or exited non-zero.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors raised while resolving the run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `HOME` is not set, so no default path can be derived.
    #[error("HOME environment variable is not set")]
    MissingHome,

    /// The optional config file exists but could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The optional config file is not valid TOML for the expected schema.
    #[error("Invalid config file {path}: {message}")]
    InvalidSyntax {
        /// Path to the offending file.
        path: String,
        /// Parser message.
        message: String,
    },
}

/// Host preconditions that abort the run mid-way.
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// A privilege-escalation helper is required but missing.
    #[error("'{0}' is required but was not found on PATH")]
    MissingPrivilegeHelper(String),

    /// A download tool is required to fetch a remote installer.
    #[error("'{0}' is required to download the Homebrew installer but was not found")]
    MissingDownloadTool(String),

    /// The package manager is still unresolvable after its installer ran.
    #[error("'{0}' is still not on PATH after installation")]
    PackageManagerUnavailable(String),
}

/// Failures of external commands.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program could not be started at all.
    #[error("failed to execute: {command}: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{command} failed (exit {}){}", exit_label(.code), stderr_suffix(.stderr))]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error (empty for interactive commands).
        stderr: String,
    },
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
