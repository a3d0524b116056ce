//! Run handles created by `runlog init`.

use std::collections::BTreeMap;
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use uuid::Uuid;

use crate::config::Mode;

const RUN_ID_LEN: usize = 8;

/// A single tracked run and the state captured during initialisation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunHandle {
    /// Short unique identifier for the run.
    pub id: String,
    /// Project the run belongs to.
    pub project: String,
    /// Synchronisation mode the run was created under.
    pub mode: Mode,
    /// Directory receiving the run's files.
    pub dir: Utf8PathBuf,
    /// Environment snapshot applied by the init strategy.
    pub environment: BTreeMap<String, String>,
}

impl RunHandle {
    /// Creates a new run handle rooted under `root`.
    ///
    /// The directory name follows `<prefix>-<epoch-secs>-<id>` where the
    /// prefix is `dryrun` for offline modes and `run` otherwise.
    #[must_use]
    pub fn new(project: &str, mode: Mode, root: &Utf8Path) -> Self {
        let id = generate_run_id();
        let dir = root.join(format!(
            "{}-{}-{id}",
            mode.run_prefix(),
            epoch_seconds_now()
        ));
        Self {
            id,
            project: project.to_owned(),
            mode,
            dir,
            environment: BTreeMap::new(),
        }
    }

    /// Replaces the captured environment snapshot with the supplied pairs.
    pub fn set_environment<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
    }

    /// Captures the live process environment onto the run handle.
    ///
    /// Non-UTF-8 names and values are converted lossily; the snapshot is a
    /// record, not a round-trippable copy.
    pub fn capture_process_environment(&mut self) {
        self.set_environment(env::vars_os().map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        }));
    }
}

fn generate_run_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(RUN_ID_LEN)
        .collect()
}

fn epoch_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
