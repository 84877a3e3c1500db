//! OS-level prerequisites: Xcode command line tools or apt packages.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::error::EnvironmentError;
use crate::exec::Invocation;
use crate::platform::Platform;

/// Packages Homebrew needs on Debian/Ubuntu.
const APT_PACKAGES: &[&str] = &[
    "build-essential",
    "procps",
    "curl",
    "file",
    "git",
    "ca-certificates",
];

/// Install the OS-level dependencies Homebrew needs.
#[derive(Debug)]
pub struct InstallPrerequisites;

impl Task for InstallPrerequisites {
    fn name(&self) -> &'static str {
        "Install prerequisites"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        match ctx.platform {
            Platform::MacOs => install_command_line_tools(ctx),
            Platform::Wsl => install_apt_packages(ctx),
            Platform::UnknownLinux => {
                ctx.log.warn(&format!(
                    "no prerequisites known for {}; install them manually",
                    ctx.platform
                ));
                Ok(TaskResult::Skipped(format!("unsupported platform: {}", ctx.platform)))
            }
        }
    }
}

fn install_command_line_tools(ctx: &Context) -> Result<TaskResult> {
    let installed = ctx
        .probe_unchecked(Invocation::new("xcode-select").arg("-p"))
        .is_ok_and(|r| r.success);
    if installed {
        ctx.log.info("Xcode command line tools already installed");
        return Ok(TaskResult::Ok);
    }

    ctx.log.warn("Xcode command line tools are not installed");
    if !ctx.confirm("Install the Xcode command line tools?") {
        return Ok(TaskResult::Skipped("declined".to_string()));
    }

    if let Err(e) = ctx.run(Invocation::new("xcode-select").arg("--install")) {
        ctx.log.debug(&format!("xcode-select --install: {e:#}"));
    }
    ctx.log
        .warn("finish the Xcode installer window before continuing");
    Ok(ctx.changed())
}

fn install_apt_packages(ctx: &Context) -> Result<TaskResult> {
    if ctx.which("sudo").is_none() {
        let err = EnvironmentError::MissingPrivilegeHelper("sudo".to_string());
        if !ctx.dry_run() {
            return Err(err.into());
        }
        ctx.log.warn(&err.to_string());
    }

    ctx.run(Invocation::new("sudo").args(["apt-get", "update"]))?;
    ctx.run(
        Invocation::new("sudo")
            .args(["apt-get", "install", "-y"])
            .args(APT_PACKAGES.iter().copied()),
    )?;
    Ok(ctx.changed())
}
