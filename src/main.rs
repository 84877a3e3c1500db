//! `bootstrap` entry point.
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use bootstrap_cli::cli::Cli;
use bootstrap_cli::config::RunConfig;
use bootstrap_cli::error::BootstrapError;
use bootstrap_cli::{commands, logging};
use clap::error::ErrorKind;
use clap::{CommandFactory as _, Parser as _};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return usage_error(&e),
    };

    logging::init_subscriber(cli.verbose, "install");
    let log = Arc::new(logging::Logger::new("install"));

    match run(&cli, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::install::report_error(&log, &e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, log: &Arc<logging::Logger>) -> Result<()> {
    let config = RunConfig::from_env(cli).map_err(BootstrapError::from)?;
    commands::install::run(config, log)
}

/// `--help` and `--version` exit 0; anything else prints the error on
/// stderr, the usage on stdout, and exits 1.
#[allow(clippy::print_stdout)]
fn usage_error(err: &clap::Error) -> ExitCode {
    let _ = err.print();
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => {
            println!("{}", Cli::command().render_help());
            ExitCode::FAILURE
        }
    }
}
