//! Run initialisation orchestration.
//!
//! `init` is the tracker's public entry point: it validates configuration,
//! creates a run handle under the configured run root, bootstraps it via
//! the injected [`InitStrategy`], and persists the run record. Errors are
//! never recovered here; they propagate to the caller.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::config::{ConfigError, Mode, TrackerConfig};
use crate::run::RunHandle;
use crate::store::{FsRunStore, RunStore, StoreError};
use crate::strategy::{self, InitStrategy, StrategyError};

/// Inputs required to initialise a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitRequest {
    /// Project the new run belongs to.
    pub project: String,
    /// Whether tensorboard event synchronisation was requested. Recorded on
    /// the run record; no patching of tensorboard internals happens here.
    pub sync_tensorboard: bool,
}

impl InitRequest {
    /// Builds a request for the given project.
    #[must_use]
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_owned(),
            sync_tensorboard: false,
        }
    }

    /// Sets the tensorboard-sync flag.
    #[must_use]
    pub const fn sync_tensorboard(mut self, enabled: bool) -> Self {
        self.sync_tensorboard = enabled;
        self
    }

    /// Builds a request from configuration, preferring an explicit project
    /// override over the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`InitRequestError::MissingProject`] when neither source
    /// names a project.
    pub fn from_config(
        config: &TrackerConfig,
        project_override: Option<&str>,
    ) -> Result<Self, InitRequestError> {
        let project = project_override
            .or(config.project.as_deref())
            .ok_or(InitRequestError::MissingProject)?;
        let request = Self::new(project);
        request.validate()?;
        Ok(request)
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InitRequestError::InvalidProject`] when the project name is
    /// blank.
    pub fn validate(&self) -> Result<(), InitRequestError> {
        if self.project.trim().is_empty() {
            return Err(InitRequestError::InvalidProject);
        }
        Ok(())
    }
}

/// Errors raised while preparing an init request.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum InitRequestError {
    /// Raised when no project name is available.
    #[error("no project name given: pass --project or set RUNLOG_PROJECT")]
    MissingProject,
    /// Raised when the project name is blank.
    #[error("project name must not be blank")]
    InvalidProject,
}

/// Outcome returned after a successful init.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitOutcome {
    /// Identifier of the new run.
    pub run_id: String,
    /// Directory holding the run record, absent in disabled mode.
    pub run_dir: Option<Utf8PathBuf>,
    /// Mode the run was created under.
    pub mode: Mode,
}

/// Errors raised while initialising a run.
#[derive(Debug, Error)]
pub enum InitError {
    /// Raised when configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Raised when the request is invalid.
    #[error("invalid init request: {0}")]
    Request(#[from] InitRequestError),
    /// Raised when the init strategy cannot bootstrap the run.
    #[error("initialisation failed: {0}")]
    Strategy(#[from] StrategyError),
    /// Raised when persisting the run record fails.
    #[error("failed to record run: {0}")]
    Store(#[from] StoreError),
}

/// Coordinates strategy bootstrap and run persistence.
#[derive(Debug)]
pub struct InitOrchestrator<S, P> {
    config: TrackerConfig,
    strategy: S,
    store: P,
}

impl<S, P> InitOrchestrator<S, P>
where
    S: InitStrategy,
    P: RunStore,
{
    /// Creates a new orchestrator.
    #[must_use]
    pub const fn new(config: TrackerConfig, strategy: S, store: P) -> Self {
        Self {
            config,
            strategy,
            store,
        }
    }

    /// Initialises a run for the supplied request.
    ///
    /// Disabled mode short-circuits before the strategy runs: the outcome
    /// carries an id but no directory, and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`InitError`] when validation, the strategy, or persistence
    /// fail.
    pub fn execute(&self, request: &InitRequest) -> Result<InitOutcome, InitError> {
        self.config.validate()?;
        request.validate()?;

        let mode = self.config.mode;
        let mut run = RunHandle::new(&request.project, mode, &self.config.run_root());

        if mode == Mode::Disabled {
            return Ok(InitOutcome {
                run_id: run.id,
                run_dir: None,
                mode,
            });
        }

        let cloud = mode == Mode::Online;
        self.strategy.bootstrap(&mut run, cloud)?;
        self.store.persist(&run, request)?;

        Ok(InitOutcome {
            run_id: run.id,
            run_dir: Some(run.dir),
            mode,
        })
    }
}

/// Initialises a run using configuration loaded from the environment.
///
/// The strategy is selected from the `strategy` configuration field and the
/// record is written through [`FsRunStore`]. Library callers wanting a
/// different strategy or store should build an [`InitOrchestrator`]
/// directly.
///
/// # Errors
///
/// Returns [`InitError`] when configuration loading, validation, the
/// strategy, or persistence fail.
pub fn init(request: &InitRequest) -> Result<InitOutcome, InitError> {
    let config = TrackerConfig::load_without_cli_args()?;
    let strategy = strategy::select(config.strategy);
    let store = FsRunStore::from_config(&config);
    InitOrchestrator::new(config, strategy, store).execute(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;

    fn dryrun_config() -> TrackerConfig {
        TrackerConfig {
            mode: Mode::Dryrun,
            dir: Some(String::from("/tmp/unused")),
            config_dir: None,
            project: Some(String::from("configured-project")),
            api_key: None,
            base_url: String::from("https://api.runlog.dev"),
            strategy: StrategyKind::Headless,
        }
    }

    #[test]
    fn request_from_config_prefers_override() {
        let request = InitRequest::from_config(&dryrun_config(), Some("explicit"))
            .unwrap_or_else(|err| panic!("request build failed: {err}"));
        assert_eq!(request.project, "explicit");
    }

    #[test]
    fn request_from_config_falls_back_to_configured_project() {
        let request = InitRequest::from_config(&dryrun_config(), None)
            .unwrap_or_else(|err| panic!("request build failed: {err}"));
        assert_eq!(request.project, "configured-project");
    }

    #[test]
    fn request_without_project_is_rejected() {
        let mut cfg = dryrun_config();
        cfg.project = None;
        let err = InitRequest::from_config(&cfg, None).expect_err("no project available");
        assert_eq!(err, InitRequestError::MissingProject);
    }

    #[test]
    fn blank_project_is_rejected() {
        let err = InitRequest::new("   ")
            .validate()
            .expect_err("blank project must fail validation");
        assert_eq!(err, InitRequestError::InvalidProject);
    }

    #[test]
    fn sync_tensorboard_builder_sets_flag() {
        let request = InitRequest::new("demo").sync_tensorboard(true);
        assert!(request.sync_tensorboard);
    }
}
