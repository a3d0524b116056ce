//! Command-line interface definitions for the `runlog` binary.
//!
//! This module centralises the clap parser structures so both the main
//! binary and the build script can reuse them when generating the manual
//! page.

use clap::Parser;

/// Top-level CLI for the `runlog` binary.
#[derive(Debug, Parser)]
#[command(
    name = "runlog",
    about = "Record experiment runs locally or against a tracking server",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Initialise a new tracked run.
    #[command(name = "init", about = "Initialise a new tracked run")]
    Init(InitCommand),
}

/// Arguments for the `runlog init` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct InitCommand {
    /// Project the run belongs to (falls back to RUNLOG_PROJECT).
    #[arg(long, value_name = "NAME")]
    pub(crate) project: Option<String>,
    /// Record that tensorboard event synchronisation was requested.
    #[arg(long)]
    pub(crate) sync_tensorboard: bool,
    /// Skip the headless fallback and force the interactive strategy so its
    /// unmodified error path surfaces.
    #[arg(long)]
    pub(crate) show_error: bool,
}
