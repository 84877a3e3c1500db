//! Command-line flags.
use clap::Parser;

/// Command-line flags for the bootstrap orchestrator.
///
/// Repository URL, clone directory and manifest path are deliberately not
/// flags; they come from `REPO_URL`, `REPO_DIR` and `BREWFILE` (see
/// [`RunConfig`](crate::config::RunConfig)).
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "bootstrap",
    about = "Bootstrap a macOS or WSL machine: Homebrew, dotfiles, packages and login shell",
    version = option_env!("BOOTSTRAP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
    after_help = "Environment:\n  REPO_URL   configuration repository to clone\n  REPO_DIR   local clone directory (default ~/.dotfiles)\n  BREWFILE   package manifest (default $REPO_DIR/Brewfile)"
)]
pub struct Cli {
    /// Answer yes to every confirmation prompt
    #[arg(long)]
    pub yes: bool,

    /// Print the commands that would run without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip cloning the configuration repository and running its installer
    #[arg(long)]
    pub skip_dotfiles: bool,

    /// Skip installing packages from the manifest
    #[arg(long)]
    pub skip_packages: bool,

    /// Skip applying OS preference settings
    #[arg(long)]
    pub skip_settings: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
