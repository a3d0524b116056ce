//! Core library for the runlog experiment-tracking client.
//!
//! The crate exposes the `init` workflow that creates a tracked run: an
//! explicit configuration object loaded from `RUNLOG_*` environment
//! variables and `runlog.toml`, pluggable init strategies (interactive or
//! headless), and local persistence of the resulting run record. Offline
//! "dry run" mode records runs without any network synchronisation.

pub mod config;
pub mod init;
pub mod run;
pub mod store;
pub mod strategy;
pub mod test_support;

pub use config::{ConfigError, Mode, StrategyKind, TrackerConfig};
pub use init::{InitError, InitOrchestrator, InitOutcome, InitRequest, InitRequestError, init};
pub use run::RunHandle;
pub use store::{FsRunStore, RunStore, StoreError};
pub use strategy::{HeadlessInit, InitStrategy, InteractiveInit, StrategyError};
