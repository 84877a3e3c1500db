//! Default login shell stage.
use std::path::PathBuf;

use anyhow::Result;

use super::{Context, Task, TaskResult, apply_resource};
use crate::exec::{self, Invocation};
use crate::resources::shell::{LoginShell, ShellRegistration};
use crate::resources::{Resource, ResourceState};

/// Make Homebrew's zsh the user's login shell.
#[derive(Debug)]
pub struct ConfigureShell;

impl Task for ConfigureShell {
    fn name(&self) -> &'static str {
        "Configure default shell"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(target) = target_shell(ctx) else {
            return Ok(TaskResult::Skipped("Homebrew zsh not available".to_string()));
        };

        let login = LoginShell::new(
            &target,
            &ctx.user,
            ctx.platform,
            &ctx.system_files.passwd,
        );
        if login.current_state(ctx)? == ResourceState::Correct {
            ctx.log
                .info(&format!("default shell already set to {}", target.display()));
            return Ok(TaskResult::Ok);
        }

        apply_resource(ctx, &ShellRegistration::new(&target, &ctx.system_files.shells))?;
        login.apply(ctx)?;
        ctx.log
            .info(&format!("default shell set to {}", target.display()));
        Ok(ctx.changed())
    }
}

/// `$(brew --prefix)/bin/zsh`, if `brew` resolves and the file is executable.
fn target_shell(ctx: &Context) -> Option<PathBuf> {
    if ctx.which("brew").is_none() {
        ctx.log
            .warn("brew not found; skipping default shell configuration");
        return None;
    }
    let prefix = match ctx.probe(Invocation::new("brew").arg("--prefix")) {
        Ok(result) => PathBuf::from(result.stdout.trim()),
        Err(e) => {
            ctx.log.warn(&format!("cannot determine Homebrew prefix: {e:#}"));
            return None;
        }
    };
    let target = prefix.join("bin").join("zsh");
    if !exec::is_executable(&target) {
        ctx.log.warn(&format!(
            "{} not found; add zsh to the Brewfile to make it the default shell",
            target.display()
        ));
        return None;
    }
    Some(target)
}
