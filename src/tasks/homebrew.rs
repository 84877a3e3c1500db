//! Homebrew installation and search-path setup.
use std::path::Path;

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::error::EnvironmentError;
use crate::exec::Invocation;

/// Official Homebrew installer script.
pub const INSTALLER_URL: &str = "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// Ensure `brew` is installed and on the search path.
#[derive(Debug)]
pub struct InstallHomebrew;

impl Task for InstallHomebrew {
    fn name(&self) -> &'static str {
        "Install Homebrew"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if let Some(brew) = ctx.which("brew") {
            report_installed(ctx, &brew);
            return Ok(TaskResult::Ok);
        }

        let bin = ctx.homebrew_prefix.join("bin");
        ctx.extend_search_path(&bin)?;
        if let Some(brew) = ctx.which("brew") {
            report_installed(ctx, &brew);
            return Ok(TaskResult::Ok);
        }

        if ctx.which("curl").is_none() {
            let err = EnvironmentError::MissingDownloadTool("curl".to_string());
            if !ctx.dry_run() {
                return Err(err.into());
            }
            ctx.log.warn(&err.to_string());
        }

        ctx.log.info("Homebrew not found, running the official installer");
        ctx.run(installer(ctx.config.assume_yes))?;
        ctx.extend_search_path(&bin)?;

        let Some(brew) = ctx.which("brew") else {
            let err = EnvironmentError::PackageManagerUnavailable("brew".to_string());
            if ctx.dry_run() {
                ctx.log.warn(&err.to_string());
                return Ok(TaskResult::DryRun);
            }
            return Err(err.into());
        };
        ctx.log
            .info(&format!("Homebrew installed at {}", brew.display()));
        log_version(ctx);
        Ok(ctx.changed())
    }
}

/// The installer one-liner, evaluated by `bash`.
fn installer(assume_yes: bool) -> Invocation {
    let inv = Invocation::new("/bin/bash")
        .arg("-c")
        .arg(format!(r#"/bin/bash -c "$(curl -fsSL {INSTALLER_URL})""#));
    if assume_yes {
        inv.env("NONINTERACTIVE", "1")
    } else {
        inv
    }
}

fn report_installed(ctx: &Context, brew: &Path) {
    ctx.log
        .info(&format!("Homebrew already installed at {}", brew.display()));
    log_version(ctx);
}

fn log_version(ctx: &Context) {
    match ctx.probe(Invocation::new("brew").arg("--version")) {
        Ok(result) => {
            if let Some(line) = result.stdout.lines().next() {
                ctx.log.info(line.trim());
            }
        }
        Err(e) => ctx.log.debug(&format!("brew --version: {e:#}")),
    }
}
