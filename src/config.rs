//! Configuration loading via `ortho-config`.
//!
//! All tracker settings live in one explicit parameter object rather than
//! being read from ambient process state at the point of use. Values merge
//! defaults, `runlog.toml`, `RUNLOG_*` environment variables, and CLI flags.

use std::fmt::{self, Display};
use std::str::FromStr;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory created under the current working directory when no run root
/// is configured.
pub const DEFAULT_RUN_ROOT: &str = "runlog";

/// Synchronisation mode for new runs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Runs synchronise to the tracking server.
    #[default]
    Online,
    /// Runs are recorded locally and never leave the machine.
    Dryrun,
    /// Tracking is switched off entirely; nothing is recorded.
    Disabled,
}

impl Mode {
    /// Returns `true` when the mode performs no network synchronisation.
    #[must_use]
    pub const fn is_offline(self) -> bool {
        !matches!(self, Self::Online)
    }

    /// Directory prefix used when naming run directories.
    #[must_use]
    pub const fn run_prefix(self) -> &'static str {
        match self {
            Self::Online => "run",
            Self::Dryrun | Self::Disabled => "dryrun",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Online => "online",
            Self::Dryrun => "dryrun",
            Self::Disabled => "disabled",
        };
        formatter.write_str(label)
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "dryrun" => Ok(Self::Dryrun),
            "disabled" => Ok(Self::Disabled),
            other => Err(ConfigError::Parse(format!(
                "unknown mode '{other}': expected online, dryrun, or disabled"
            ))),
        }
    }
}

/// Selects how `init` attaches to the invoking process.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Probe the attached streams and pick interactive or headless.
    #[default]
    Auto,
    /// Require terminal streams; fail when none are attached.
    Interactive,
    /// Never touch terminal streams; capture the environment silently.
    Headless,
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "interactive" => Ok(Self::Interactive),
            "headless" => Ok(Self::Headless),
            other => Err(ConfigError::Parse(format!(
                "unknown strategy '{other}': expected auto, interactive, or headless"
            ))),
        }
    }
}

/// Tracker configuration derived from environment variables, configuration
/// files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "RUNLOG",
    discovery(
        app_name = "runlog",
        env_var = "RUNLOG_CONFIG_PATH",
        config_file_name = "runlog.toml",
        dotfile_name = ".runlog.toml",
        project_file_name = "runlog.toml"
    )
)]
pub struct TrackerConfig {
    /// Synchronisation mode for new runs. Defaults to `online`.
    #[ortho_config(default = Mode::Online)]
    pub mode: Mode,
    /// Root directory receiving run directories (`RUNLOG_DIR`).
    pub dir: Option<String>,
    /// Directory receiving tracker settings files (`RUNLOG_CONFIG_DIR`).
    pub config_dir: Option<String>,
    /// Default project assigned to runs when the caller supplies none.
    pub project: Option<String>,
    /// API key used to authenticate against the tracking server. Required
    /// in online mode only.
    pub api_key: Option<String>,
    /// Base URL of the tracking server.
    #[ortho_config(default = "https://api.runlog.dev".to_owned())]
    pub base_url: String,
    /// Init strategy selector. Defaults to `auto`.
    #[ortho_config(default = StrategyKind::Auto)]
    pub strategy: StrategyKind,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl TrackerConfig {
    fn require_field(value: Option<&str>, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.is_none_or(|raw| raw.trim().is_empty()) {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to runlog.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    fn require_nonblank_when_set(
        value: Option<&str>,
        metadata: &FieldMetadata,
    ) -> Result<(), ConfigError> {
        match value {
            Some(raw) if raw.trim().is_empty() => Err(ConfigError::MissingField(format!(
                "blank {}: set {} to a real path or remove {} from runlog.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            ))),
            _ => Ok(()),
        }
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags
    /// in that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("runlog")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Root directory that receives per-run directories.
    #[must_use]
    pub fn run_root(&self) -> Utf8PathBuf {
        self.dir
            .as_deref()
            .map_or_else(|| Utf8PathBuf::from(DEFAULT_RUN_ROOT), Utf8PathBuf::from)
    }

    /// Settings directory, when one is configured.
    #[must_use]
    pub fn settings_dir(&self) -> Option<Utf8PathBuf> {
        self.config_dir.as_deref().map(Utf8PathBuf::from)
    }

    /// Performs semantic validation. Error messages include guidance on how
    /// to provide missing values via environment variables or configuration
    /// files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when online mode lacks an API
    /// key, or when a configured directory is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == Mode::Online {
            Self::require_field(
                self.api_key.as_deref(),
                &FieldMetadata::new("tracking server API key", "RUNLOG_API_KEY", "api_key"),
            )?;
        }
        Self::require_nonblank_when_set(
            self.dir.as_deref(),
            &FieldMetadata::new("run root directory", "RUNLOG_DIR", "dir"),
        )?;
        Self::require_nonblank_when_set(
            self.config_dir.as_deref(),
            &FieldMetadata::new("settings directory", "RUNLOG_CONFIG_DIR", "config_dir"),
        )?;
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
