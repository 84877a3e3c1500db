//! Configuration repository stages: clone and run its install script.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::exec::{self, Invocation};
use crate::resources::repository::RepositoryClone;
use crate::resources::{Resource, ResourceState};

/// Entry point run from the root of the configuration repository.
const INSTALL_SCRIPT: &str = "install.sh";

/// Clone the configuration repository, or reuse an existing clone.
#[derive(Debug)]
pub struct CloneRepository;

impl Task for CloneRepository {
    fn name(&self) -> &'static str {
        "Clone configuration repository"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.config.skip_dotfiles {
            return Ok(TaskResult::Skipped("--skip-dotfiles".to_string()));
        }

        let clone = RepositoryClone::new(&ctx.config.repo_url, &ctx.config.repo_dir);
        match clone.current_state(ctx)? {
            ResourceState::Correct => {
                already_cloned(ctx, &clone);
                Ok(TaskResult::Ok)
            }
            ResourceState::Incorrect { current } => {
                ctx.log.warn(&format!(
                    "origin of {} is {current}, not {}; reusing it as-is",
                    clone.dir().display(),
                    ctx.config.repo_url
                ));
                already_cloned(ctx, &clone);
                Ok(TaskResult::Ok)
            }
            ResourceState::Invalid { reason } => {
                if ctx.dry_run() {
                    ctx.log.warn(&reason);
                    return Ok(TaskResult::DryRun);
                }
                anyhow::bail!("cannot clone {}: {reason}", ctx.config.repo_url)
            }
            ResourceState::Missing => {
                clone.apply(ctx)?;
                Ok(ctx.changed())
            }
        }
    }
}

fn already_cloned(ctx: &Context, clone: &RepositoryClone) {
    ctx.log.info(&format!(
        "configuration repository already cloned at {}",
        clone.dir().display()
    ));
}

/// Run the configuration repository's `install.sh`.
#[derive(Debug)]
pub struct RunInstallScript;

impl Task for RunInstallScript {
    fn name(&self) -> &'static str {
        "Run configuration install script"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.config.skip_dotfiles {
            return Ok(TaskResult::Skipped("--skip-dotfiles".to_string()));
        }

        let repo_dir = &ctx.config.repo_dir;
        let script = repo_dir.join(INSTALL_SCRIPT);
        if !exec::is_executable(&script) {
            ctx.log.warn(&format!(
                "no executable {INSTALL_SCRIPT} found in {}",
                repo_dir.display()
            ));
            return Ok(TaskResult::Skipped(format!("no {INSTALL_SCRIPT}")));
        }

        ctx.run(Invocation::new(script.display().to_string()).current_dir(repo_dir))?;
        Ok(ctx.changed())
    }
}
