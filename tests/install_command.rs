#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the install sequence.
//!
//! These tests run the real stage list from [`tasks::all_install_tasks`]
//! against a scripted [`FakeHost`](common::FakeHost) and check the order
//! of the commands it receives, the dry-run transcript, the `--skip-*`
//! flags and idempotence on an already configured machine.

mod common;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use bootstrap_cli::commands::install::run_stages;
use bootstrap_cli::error::{CommandError, EnvironmentError};
use bootstrap_cli::logging::TaskStatus;
use bootstrap_cli::platform::Platform;
use bootstrap_cli::tasks::{self, homebrew::INSTALLER_URL};
use common::*;

const REPO_URL: &str = "https://example.com/dotfiles.git";
const LINUXBREW: &str = "/home/linuxbrew/.linuxbrew/bin/brew";

const APT_UPDATE: &str = "sudo apt-get update";
const APT_INSTALL: &str =
    "sudo apt-get install -y build-essential procps curl file git ca-certificates";

fn installer() -> String {
    format!(r#"/bin/bash -c '/bin/bash -c "$(curl -fsSL {INSTALLER_URL})"'"#)
}

fn zsh(home: &TestHome) -> PathBuf {
    home.path().join("linuxbrew").join("bin").join("zsh")
}

/// A fresh WSL machine: `sudo` and `curl` present, no Homebrew, no clone,
/// bash as the login shell. Commands change the fake host the way the real
/// ones would change a machine.
fn fresh_wsl(home: &TestHome) -> Arc<FakeHost> {
    let host = Arc::new(FakeHost::default());
    host.provide("sudo", "/usr/bin/sudo");
    host.provide("curl", "/usr/bin/curl");
    host.provide_after(&installer(), "brew", LINUXBREW);

    let zsh = zsh(home);
    write_executable(&zsh, "");
    let prefix = home.path().join("linuxbrew");
    host.respond("brew --prefix", true, &format!("{}\n", prefix.display()));

    std::fs::write(home.shells_file(), "/bin/bash\n").unwrap();
    std::fs::write(
        home.passwd_file(),
        "tester:x:1000:1000::/home/tester:/bin/bash\n",
    )
    .unwrap();

    let repo_dir = home.path().join(".dotfiles");
    let clone = format!("git clone {REPO_URL} {}", repo_dir.display());
    host.on_run(&clone, move || {
        let repo = git2::Repository::init(&repo_dir).unwrap();
        repo.remote("origin", REPO_URL).unwrap();
        write_executable(&repo_dir.join("install.sh"), "#!/bin/sh\n");
        std::fs::write(repo_dir.join("Brewfile"), "brew \"zsh\"\n").unwrap();
    });

    let shells = home.shells_file();
    let tee = format!("sudo tee -a {} <<< {}", shells.display(), zsh.display());
    let line = format!("{}\n", zsh.display());
    host.on_run(&tee, move || {
        let mut content = std::fs::read_to_string(&shells).unwrap();
        content.push_str(&line);
        std::fs::write(&shells, content).unwrap();
    });

    let passwd = home.passwd_file();
    let chsh = format!("sudo chsh -s {} tester", zsh.display());
    let entry = format!("tester:x:1000:1000::/home/tester:{}\n", zsh.display());
    host.on_run(&chsh, move || {
        std::fs::write(&passwd, &entry).unwrap();
    });

    host
}

fn redacted(home: &TestHome, lines: Vec<String>) -> Vec<String> {
    lines.iter().map(|l| home.redact(l)).collect()
}

// ---------------------------------------------------------------------------
// Snapshot: stage list
// ---------------------------------------------------------------------------

/// Snapshot of the default stage names in execution order.
///
/// Any addition, removal, reordering or rename of a stage fails this test,
/// prompting a deliberate snapshot update.
#[test]
fn install_stage_names() {
    let stages = tasks::all_install_tasks(false);
    let names: Vec<&str> = stages.iter().map(|t| t.name()).collect();
    insta::assert_snapshot!("install_stage_names", names.join("\n"));
}

#[test]
fn install_stage_names_are_unique() {
    let stages = tasks::all_install_tasks(true);
    let mut seen: HashSet<&str> = HashSet::new();
    for stage in &stages {
        assert!(
            seen.insert(stage.name()),
            "duplicate stage name: '{}'",
            stage.name()
        );
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn fresh_wsl_command_order() {
    let home = TestHome::new();
    let host = fresh_wsl(&home);
    let (ctx, log) = make_context(&home, home.config(), Platform::Wsl, &host);

    run_stages(&ctx, &tasks::all_install_tasks(false)).unwrap();

    assert_eq!(
        redacted(&home, host.commands()),
        vec![
            APT_UPDATE.to_string(),
            APT_INSTALL.to_string(),
            installer(),
            format!("git clone {REPO_URL} $HOME/.dotfiles"),
            "brew update".to_string(),
            "brew bundle --file $HOME/.dotfiles/Brewfile".to_string(),
            "$HOME/.dotfiles/install.sh".to_string(),
            "sudo tee -a $HOME/etc/shells <<< $HOME/linuxbrew/bin/zsh".to_string(),
            "sudo chsh -s $HOME/linuxbrew/bin/zsh tester".to_string(),
        ]
    );
    assert!(
        log.task_entries()
            .iter()
            .all(|e| e.status == TaskStatus::Ok),
        "every stage should succeed: {:?}",
        log.task_entries()
    );
}

#[test]
fn second_run_only_reports_already_configured() {
    let home = TestHome::new();
    let host = fresh_wsl(&home);
    let (ctx, _log) = make_context(&home, home.config(), Platform::Wsl, &host);
    run_stages(&ctx, &tasks::all_install_tasks(false)).unwrap();
    host.clear_commands();

    let (ctx, log) = make_context(&home, home.config(), Platform::Wsl, &host);
    run_stages(&ctx, &tasks::all_install_tasks(false)).unwrap();

    assert_eq!(
        redacted(&home, host.commands()),
        vec![
            APT_UPDATE,
            APT_INSTALL,
            "brew update",
            "brew bundle --file $HOME/.dotfiles/Brewfile",
            "$HOME/.dotfiles/install.sh",
        ]
    );
    assert!(log.contains("Homebrew already installed"));
    assert!(log.contains("configuration repository already cloned"));
    assert!(log.contains("default shell already set"));
}

#[test]
fn dry_run_transcript_on_fresh_wsl() {
    let home = TestHome::new();
    let host = Arc::new(FakeHost::default());
    let mut config = home.config();
    config.dry_run = true;
    let (ctx, log) = make_context(&home, config, Platform::Wsl, &host);

    run_stages(&ctx, &tasks::all_install_tasks(false)).unwrap();

    assert!(host.commands().is_empty(), "dry run must not execute anything");
    assert!(!home.path().join(".dotfiles").exists());
    let transcript = redacted(&home, log.dry_run_lines());
    insta::assert_snapshot!("dry_run_transcript_wsl", transcript.join("\n"));
}

#[test]
fn skip_flags_suppress_their_stages() {
    let home = TestHome::new();
    let host = fresh_wsl(&home);
    let mut config = home.config();
    config.skip_dotfiles = true;
    config.skip_packages = true;
    let (ctx, log) = make_context(&home, config, Platform::Wsl, &host);

    run_stages(&ctx, &tasks::all_install_tasks(false)).unwrap();

    let commands = redacted(&home, host.commands());
    assert_eq!(
        commands,
        vec![
            APT_UPDATE.to_string(),
            APT_INSTALL.to_string(),
            installer(),
            "sudo tee -a $HOME/etc/shells <<< $HOME/linuxbrew/bin/zsh".to_string(),
            "sudo chsh -s $HOME/linuxbrew/bin/zsh tester".to_string(),
        ]
    );
    let skipped: Vec<String> = log
        .task_entries()
        .into_iter()
        .filter(|e| e.status == TaskStatus::Skipped)
        .map(|e| e.name)
        .collect();
    assert_eq!(
        skipped,
        vec![
            "Clone configuration repository",
            "Install packages",
            "Run configuration install script",
        ]
    );
}

#[test]
fn failing_stage_aborts_the_run() {
    let home = TestHome::new();
    let host = fresh_wsl(&home);
    let bundle = format!(
        "brew bundle --file {}",
        home.path().join(".dotfiles").join("Brewfile").display()
    );
    host.respond(&bundle, false, "");
    let (ctx, log) = make_context(&home, home.config(), Platform::Wsl, &host);

    let err = run_stages(&ctx, &tasks::all_install_tasks(false)).unwrap_err();

    assert!(
        matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Failed { .. })
        ),
        "expected a typed command failure, got {err:#}"
    );
    let entries = log.task_entries();
    let last = entries.last().unwrap();
    assert_eq!(last.name, "Install packages");
    assert_eq!(last.status, TaskStatus::Failed);
    assert!(
        !host.commands().iter().any(|c| c.ends_with("install.sh")),
        "stages after the failure must not run"
    );
}

#[test]
fn missing_sudo_is_fatal_on_wsl() {
    let home = TestHome::new();
    let host = Arc::new(FakeHost::default());
    let (ctx, log) = make_context(&home, home.config(), Platform::Wsl, &host);

    let err = run_stages(&ctx, &tasks::all_install_tasks(false)).unwrap_err();

    assert!(err.to_string().contains("sudo"));
    assert!(matches!(
        err.downcast_ref::<EnvironmentError>(),
        Some(EnvironmentError::MissingPrivilegeHelper(_))
    ));
    assert!(host.commands().is_empty());
    assert_eq!(log.task_entries().len(), 1);
}

#[test]
fn unknown_linux_skips_prerequisites() {
    let home = TestHome::new();
    let host = Arc::new(FakeHost::default());
    host.provide("brew", "/usr/bin/brew");
    let mut config = home.config();
    config.skip_dotfiles = true;
    config.skip_packages = true;
    let (ctx, log) = make_context(&home, config, Platform::UnknownLinux, &host);

    run_stages(&ctx, &tasks::all_install_tasks(false)).unwrap();

    let first = &log.task_entries()[0];
    assert_eq!(first.name, "Install prerequisites");
    assert_eq!(first.status, TaskStatus::Skipped);
    assert!(host.commands().is_empty());
}
