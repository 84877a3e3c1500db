//! Machine bootstrap engine for macOS and WSL.
//!
//! Takes a fresh host from nothing to a working environment: OS
//! prerequisites, Homebrew, a cloned configuration repository and its
//! install script, the packages declared in a Brewfile, and Homebrew's zsh
//! as the login shell.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]** resolves flags, environment and the optional config file
//! - **[`resources`]** are idempotent `check + apply` primitives
//! - **[`tasks`]** are the named stages, wired to resources through [`tasks::Context`]
//! - **[`commands`]** runs the stages in order and reports the summary
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod prompt;
pub mod resources;
pub mod tasks;
