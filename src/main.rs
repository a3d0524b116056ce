//! Binary entry point for the runlog CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;

use runlog::strategy::{self, InitStrategy, InteractiveInit};
use runlog::{FsRunStore, InitError, InitOrchestrator, InitOutcome, InitRequest, TrackerConfig};

mod cli;

use cli::{Cli, InitCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Init(#[from] InitError),
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Init(command) => init_command(command),
    }
}

fn init_command(args: InitCommand) -> Result<i32, CliError> {
    let config =
        TrackerConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let request = InitRequest::from_config(&config, args.project.as_deref())
        .map_err(InitError::from)?
        .sync_tensorboard(args.sync_tensorboard);

    let selected: Box<dyn InitStrategy> = if args.show_error {
        // Force the interactive path so its real failure is observable.
        Box::new(InteractiveInit::new())
    } else {
        strategy::select(config.strategy)
    };

    let store = FsRunStore::from_config(&config);
    let outcome = InitOrchestrator::new(config, selected, store).execute(&request)?;
    report_outcome(io::stdout(), &outcome);
    Ok(0)
}

fn report_outcome(mut target: impl Write, outcome: &InitOutcome) {
    let line = match outcome.run_dir.as_deref() {
        Some(dir) => format!(
            "initialised run {} ({}) at {dir}",
            outcome.run_id, outcome.mode
        ),
        None => format!("tracking disabled; run {} not recorded", outcome.run_id),
    };
    writeln!(target, "{line}").ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
