//! Local persistence for run records.
//!
//! Offline runs leave a small JSON record behind so later tooling can find
//! them. The full upstream storage format is deliberately out of scope;
//! this module records only what init itself produced.

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::Serialize;
use thiserror::Error;

use crate::config::{Mode, TrackerConfig};
use crate::init::InitRequest;
use crate::run::RunHandle;

const RUN_RECORD_FILE: &str = "run.json";
const SETTINGS_FILE: &str = "settings.json";

/// Errors raised while persisting run records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Raised when file system operations fail.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Path that could not be accessed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when rendering a record to JSON fails.
    #[error("failed to serialise {path}: {message}")]
    Serialise {
        /// Path the record was destined for.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

/// Abstraction over run persistence for dependency injection.
pub trait RunStore {
    /// Writes the run record and returns the path it was written to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be written.
    fn persist(&self, run: &RunHandle, request: &InitRequest) -> Result<Utf8PathBuf, StoreError>;
}

/// JSON shape of the persisted run record.
#[derive(Debug, Serialize)]
struct RunRecord<'a> {
    id: &'a str,
    project: &'a str,
    mode: Mode,
    sync_tensorboard: bool,
    environment: &'a BTreeMap<String, String>,
}

/// JSON shape of the persisted settings file.
#[derive(Debug, Serialize)]
struct SettingsRecord<'a> {
    mode: Mode,
    base_url: &'a str,
}

/// Writes run records and settings beneath the configured directories.
#[derive(Clone, Debug)]
pub struct FsRunStore {
    settings_dir: Option<Utf8PathBuf>,
    base_url: String,
}

impl FsRunStore {
    /// Builds a store from the tracker configuration.
    #[must_use]
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            settings_dir: config.settings_dir(),
            base_url: config.base_url.clone(),
        }
    }

    fn write_settings(&self, mode: Mode) -> Result<(), StoreError> {
        let Some(dir) = self.settings_dir.as_deref() else {
            return Ok(());
        };
        let record = SettingsRecord {
            mode,
            base_url: &self.base_url,
        };
        let rendered = render_json(dir.join(SETTINGS_FILE), &record)?;
        write_file(dir, SETTINGS_FILE, &rendered)
    }
}

impl RunStore for FsRunStore {
    fn persist(&self, run: &RunHandle, request: &InitRequest) -> Result<Utf8PathBuf, StoreError> {
        self.write_settings(run.mode)?;

        let record = RunRecord {
            id: &run.id,
            project: &run.project,
            mode: run.mode,
            sync_tensorboard: request.sync_tensorboard,
            environment: &run.environment,
        };
        let record_path = run.dir.join(RUN_RECORD_FILE);
        let rendered = render_json(record_path.clone(), &record)?;
        write_file(&run.dir, RUN_RECORD_FILE, &rendered)?;
        Ok(record_path)
    }
}

fn render_json<T: Serialize>(path: Utf8PathBuf, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|err| StoreError::Serialise {
        path,
        message: err.to_string(),
    })
}

fn write_file(dir_path: &Utf8Path, file_name: &str, contents: &str) -> Result<(), StoreError> {
    Dir::create_ambient_dir_all(dir_path, ambient_authority()).map_err(|err| StoreError::Io {
        path: dir_path.to_path_buf(),
        message: err.to_string(),
    })?;

    let dir = open_dir(dir_path)?;
    dir.write(file_name, contents)
        .map_err(|err| StoreError::Io {
            path: dir_path.join(file_name),
            message: err.to_string(),
        })
}

fn open_dir(path: &Utf8Path) -> Result<Dir, StoreError> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(dir),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StoreError::Io {
            path: path.to_path_buf(),
            message: String::from("directory disappeared after creation"),
        }),
        Err(err) => Err(StoreError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }),
    }
}
