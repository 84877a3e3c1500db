//! Idempotent resource primitives (check + apply pattern).
//!
//! A resource reads the host's current state with read-only probes and, when
//! that state differs from the desired one, changes it through
//! [`Context::run`](crate::tasks::Context::run). Routing every mutation
//! through the context is what makes `--dry-run` print the exact command a
//! real run would execute.
pub mod defaults;
pub mod repository;
pub mod shell;

use anyhow::Result;

use crate::tasks::Context;

/// State of a resource on the host.
///
/// # Examples
///
/// ```
/// use bootstrap_cli::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let wrong = ResourceState::Incorrect { current: "/bin/bash".into() };
///
/// assert_ne!(missing, ResourceState::Correct);
/// assert_ne!(wrong, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist or is not present.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// The current value of the resource.
        current: String,
    },
    /// Resource cannot be checked or applied.
    Invalid {
        /// Reason why the resource cannot be applied.
        reason: String,
    },
}

/// Result of applying a resource change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated (or would be, in dry-run mode).
    Applied,
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
}

/// A piece of host state that can be checked and brought into line.
pub trait Resource {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Check the current state of the resource.
    ///
    /// Only read-only probes are allowed here; they run even in dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self, ctx: &Context) -> Result<ResourceState>;

    /// Change the host so the resource reaches its desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if a mutating command fails.
    fn apply(&self, ctx: &Context) -> Result<ResourceChange>;
}
