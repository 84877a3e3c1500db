//! The install command: runs every stage in order.
use std::sync::Arc;

use anyhow::Result;

use crate::config::RunConfig;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::platform::{HostProbe, Platform};
use crate::prompt::StdinPrompt;
use crate::tasks::{self, Context, Task};

/// The OS-settings stage exists but is not part of the default sequence.
const INCLUDE_SETTINGS: bool = false;

/// Run the bootstrap sequence on this host.
///
/// # Errors
///
/// Returns the error of the first stage that fails.
pub fn run(config: RunConfig, log: &Arc<Logger>) -> Result<()> {
    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
    let probe = HostProbe::collect(executor.as_ref());
    let platform = Platform::classify(&probe);
    let ctx = Context::new(
        Arc::new(config),
        platform,
        Arc::clone(log) as Arc<dyn Log>,
        executor,
        Arc::new(StdinPrompt),
    )
    .with_homebrew_prefix(platform.homebrew_prefix(&probe));

    let result = run_stages(&ctx, &tasks::all_install_tasks(INCLUDE_SETTINGS));
    log.print_summary();
    result
}

/// Log the error that ended the run, unless a failed stage already did.
pub fn report_error(log: &Logger, err: &anyhow::Error) {
    if log.failure_count() == 0 {
        log.error(&format!("{err:#}"));
    }
}

/// Run `stages` in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the error of the first stage that fails.
pub fn run_stages(ctx: &Context, stages: &[Box<dyn Task>]) -> Result<()> {
    let version = option_env!("BOOTSTRAP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    ctx.log.info(&format!("bootstrap {version}"));
    ctx.log.info(&format!("platform: {}", ctx.platform));
    if ctx.platform == Platform::UnknownLinux {
        ctx.log
            .warn("unrecognized platform; only macOS and WSL are fully supported");
    }
    if ctx.dry_run() {
        ctx.log.info("dry run: no changes will be made");
    }

    for stage in stages {
        tasks::execute(stage.as_ref(), ctx)?;
    }

    if ctx.dry_run() {
        ctx.log.info("dry run complete");
    } else {
        ctx.log
            .info("bootstrap complete; open a new terminal to use the new shell");
    }
    Ok(())
}
