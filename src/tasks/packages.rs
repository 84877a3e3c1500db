//! Manifest-driven package installation.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::exec::Invocation;

/// Install the packages declared in the manifest with `brew bundle`.
#[derive(Debug)]
pub struct InstallBundle;

impl Task for InstallBundle {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.config.skip_packages {
            return Ok(TaskResult::Skipped("--skip-packages".to_string()));
        }

        let manifest = &ctx.config.manifest_path;
        if !manifest.is_file() {
            ctx.log.warn(&format!(
                "no manifest at {}; place a Brewfile there (or set BREWFILE) to install packages",
                manifest.display()
            ));
            return Ok(TaskResult::Skipped("no manifest".to_string()));
        }

        ctx.run(Invocation::new("brew").arg("update"))?;
        ctx.run(
            Invocation::new("brew")
                .args(["bundle", "--file"])
                .arg(manifest.display().to_string()),
        )?;
        Ok(ctx.changed())
    }
}
