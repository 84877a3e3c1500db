//! Named bootstrap stages, run in a fixed order by the install command.
mod context;
pub mod homebrew;
pub mod packages;
pub mod prerequisites;
pub mod repository;
pub mod settings;
pub mod shell;

pub use context::{Context, SystemFiles};

use anyhow::Result;

use crate::logging::TaskStatus;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Result of a single stage execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Stage completed; the host is in the desired state.
    Ok,
    /// Stage was skipped with a reason (flag, missing artifact, declined).
    Skipped(String),
    /// Stage ran in dry-run mode and printed the commands it would run.
    DryRun,
}

/// A named, executable stage.
pub trait Task {
    /// Human-readable stage name.
    fn name(&self) -> &str;

    /// Whether this stage applies to the current platform.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the stage.
    ///
    /// # Errors
    ///
    /// Returns an error if a required tool is missing or a command fails;
    /// the orchestrator aborts the run on the first error.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The stages run by the install command, in execution order.
///
/// The OS-settings stage is only included when `include_settings` is set.
#[must_use]
pub fn all_install_tasks(include_settings: bool) -> Vec<Box<dyn Task>> {
    let mut tasks: Vec<Box<dyn Task>> = vec![
        Box::new(prerequisites::InstallPrerequisites),
        Box::new(homebrew::InstallHomebrew),
        Box::new(repository::CloneRepository),
        Box::new(packages::InstallBundle),
        Box::new(repository::RunInstallScript),
        Box::new(shell::ConfigureShell),
    ];
    if include_settings {
        tasks.push(Box::new(settings::ApplySettings));
    }
    tasks
}

/// Execute a stage, recording the result in the logger.
///
/// # Errors
///
/// Returns the stage's error after recording it as failed.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping stage: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
            Ok(())
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e)
        }
    }
}

/// Check a resource and apply it when it is not already correct.
///
/// # Errors
///
/// Returns an error if the state cannot be read, the resource is invalid, or
/// applying it fails.
pub fn apply_resource<R: Resource + ?Sized>(ctx: &Context, resource: &R) -> Result<ResourceChange> {
    let desc = resource.description();
    match resource.current_state(ctx)? {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            Ok(ResourceChange::AlreadyCorrect)
        }
        ResourceState::Invalid { reason } => {
            anyhow::bail!("cannot apply {desc}: {reason}")
        }
        ResourceState::Incorrect { current } => {
            ctx.log.debug(&format!("{desc} (currently {current})"));
            resource.apply(ctx)
        }
        ResourceState::Missing => resource.apply(ctx),
    }
}
