//! macOS preference tweaks.
use anyhow::Result;

use super::{Context, Task, TaskResult, apply_resource};
use crate::exec::Invocation;
use crate::platform::Platform;
use crate::resources::ResourceChange;
use crate::resources::defaults::PreferenceKey;

/// Boolean preferences set to `true`, as `(domain, key)`.
const PREFERENCES: &[(&str, &str)] = &[
    ("NSGlobalDomain", "AppleShowAllExtensions"),
    ("com.apple.finder", "AppleShowAllFiles"),
    ("com.apple.finder", "ShowPathbar"),
    ("com.apple.finder", "ShowStatusBar"),
];

/// Processes restarted so changed preferences take effect.
const RESTART: &[&str] = &["Finder", "SystemUIServer"];

/// Apply Finder and global macOS preference tweaks.
#[derive(Debug)]
pub struct ApplySettings;

impl Task for ApplySettings {
    fn name(&self) -> &'static str {
        "Apply macOS settings"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform != Platform::UnknownLinux
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.config.skip_settings {
            return Ok(TaskResult::Skipped("--skip-settings".to_string()));
        }
        if ctx.platform.is_wsl() {
            ctx.log.info("no OS settings are managed on WSL");
            return Ok(TaskResult::Skipped("nothing to apply on WSL".to_string()));
        }

        let mut changed = false;
        for (domain, key) in PREFERENCES {
            let pref = PreferenceKey::new(*domain, *key);
            if apply_resource(ctx, &pref)? == ResourceChange::Applied {
                changed = true;
            }
        }

        if !changed {
            ctx.log.info("macOS settings already applied");
            return Ok(TaskResult::Ok);
        }

        for process in RESTART {
            if let Err(e) = ctx.run(Invocation::new("killall").arg(*process)) {
                ctx.log.debug(&format!("killall {process}: {e:#}"));
            }
        }
        Ok(ctx.changed())
    }
}
