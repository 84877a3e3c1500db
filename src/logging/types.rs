//! Core logging types: stage entries, status, and the [`Log`] trait.

/// Stage execution result for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Human-readable stage name.
    pub name: String,
    /// Final status of the stage.
    pub status: TaskStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage does not apply to the current platform.
    NotApplicable,
    /// Stage was skipped (flag given, optional artifact missing, user declined).
    Skipped,
    /// Stage ran in dry-run mode; no changes were applied.
    DryRun,
    /// Stage failed and aborted the run.
    Failed,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) writes through `tracing`;
/// [`MemoryLog`](super::memory::MemoryLog) keeps entries in memory so tests
/// can assert on what a stage reported.
pub trait Log {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a stage result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}
