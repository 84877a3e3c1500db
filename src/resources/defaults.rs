//! Boolean keys in the macOS `defaults` store.
use anyhow::Result;

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Invocation;
use crate::tasks::Context;

/// A boolean macOS preference that should be `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceKey {
    /// Preference domain, e.g. `com.apple.finder`.
    pub domain: String,
    /// Key inside the domain.
    pub key: String,
}

impl PreferenceKey {
    /// Describe `domain` / `key`.
    #[must_use]
    pub fn new(domain: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            key: key.into(),
        }
    }
}

/// Whether `defaults read` output denotes boolean true.
fn is_true(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "YES")
}

impl Resource for PreferenceKey {
    fn description(&self) -> String {
        format!("{} {} = true", self.domain, self.key)
    }

    fn current_state(&self, ctx: &Context) -> Result<ResourceState> {
        let result = ctx.probe_unchecked(Invocation::new("defaults").args([
            "read",
            &self.domain,
            &self.key,
        ]))?;
        if !result.success {
            return Ok(ResourceState::Missing);
        }
        Ok(if is_true(&result.stdout) {
            ResourceState::Correct
        } else {
            ResourceState::Incorrect {
                current: result.stdout.trim().to_string(),
            }
        })
    }

    fn apply(&self, ctx: &Context) -> Result<ResourceChange> {
        ctx.run(Invocation::new("defaults").args([
            "write",
            &self.domain,
            &self.key,
            "-bool",
            "true",
        ]))?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::tasks::test_helpers::{make_context, test_config};

    #[test]
    fn true_values() {
        assert!(is_true("1\n"));
        assert!(is_true("true"));
        assert!(!is_true("0\n"));
        assert!(!is_true(""));
    }

    #[test]
    fn state_from_defaults_read() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, exec, _log) = make_context(test_config(tmp.path()), Platform::MacOs);
        let key = PreferenceKey::new("com.apple.finder", "ShowPathbar");

        exec.respond("defaults read com.apple.finder ShowPathbar", false, "");
        assert_eq!(key.current_state(&ctx).unwrap(), ResourceState::Missing);
    }

    #[test]
    fn state_correct_and_incorrect() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, exec, _log) = make_context(test_config(tmp.path()), Platform::MacOs);
        let key = PreferenceKey::new("NSGlobalDomain", "AppleShowAllExtensions");

        exec.respond("defaults read NSGlobalDomain AppleShowAllExtensions", true, "0\n");
        exec.respond("defaults read NSGlobalDomain AppleShowAllExtensions", true, "1\n");
        assert_eq!(
            key.current_state(&ctx).unwrap(),
            ResourceState::Incorrect {
                current: "0".to_string()
            }
        );
        assert_eq!(key.current_state(&ctx).unwrap(), ResourceState::Correct);
    }

    #[test]
    fn apply_writes_bool() {
        let tmp = tempfile::tempdir().unwrap();
        let (ctx, exec, _log) = make_context(test_config(tmp.path()), Platform::MacOs);
        PreferenceKey::new("com.apple.finder", "ShowStatusBar")
            .apply(&ctx)
            .unwrap();
        assert_eq!(
            exec.commands(),
            vec!["defaults write com.apple.finder ShowStatusBar -bool true"]
        );
    }
}
