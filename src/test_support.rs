//! Test support utilities shared across unit and integration tests.
//!
//! Environment mutation is process-wide state, so every helper that touches
//! it holds [`ENV_LOCK`] for its whole scope and undoes its changes on drop,
//! on every exit path including unwinding.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;
use std::rc::Rc;

use camino::Utf8PathBuf;
use tokio::sync::{Mutex, MutexGuard};

use crate::init::InitRequest;
use crate::run::RunHandle;
use crate::store::{RunStore, StoreError};
use crate::strategy::{InitStrategy, StrategyError};

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores named variables on drop.
///
/// [`ENV_LOCK`] is not reentrant, so guards must never be nested within one
/// task; a scope needing further variables calls [`EnvGuard::set`] on the
/// guard it already holds.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    ///
    /// On drop each variable is restored to its prior value, or removed if
    /// it was previously unset.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }

    /// Sets a single environment variable while holding the global mutex.
    pub async fn set_var(key: &str, value: &str) -> Self {
        Self::set_vars(&[(key, value)]).await
    }

    /// Sets an additional variable under the lock this guard already holds.
    ///
    /// The value in place beforehand is recorded and reinstated on drop, so
    /// re-setting a key already managed by this guard layers correctly.
    pub fn set(&mut self, key: &str, value: &str) {
        let old = env::var_os(key);
        // SAFETY: Environment mutation is serialised by holding `_guard`.
        unsafe { env::set_var(key, value) };
        self.previous.push((key.to_owned(), old));
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // Restore newest-first so layered writes to one key unwind cleanly.
        for (key, old) in self.previous.iter().rev() {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Guard that snapshots the whole process environment and restores it
/// exactly on drop.
///
/// Unlike [`EnvGuard`] this does not need to know which keys the scope will
/// touch: variables added during the scope are removed, and variables
/// changed or removed are reinstated from the snapshot. The same
/// non-nesting rule applies: never hold two env guards in one task.
pub struct EnvSnapshot {
    saved: Vec<(OsString, OsString)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvSnapshot {
    /// Captures the current environment while holding the global mutex.
    pub async fn capture() -> Self {
        let guard = ENV_LOCK.lock().await;
        Self {
            saved: env::vars_os().collect(),
            _guard: guard,
        }
    }

    /// Sets a variable within the snapshot's scope.
    pub fn set(&self, key: &str, value: &str) {
        // SAFETY: Environment mutation is serialised by holding `_guard`.
        unsafe { env::set_var(key, value) };
    }

    /// Removes a variable within the snapshot's scope.
    pub fn remove(&self, key: &str) {
        // SAFETY: Environment mutation is serialised by holding `_guard`.
        unsafe { env::remove_var(key) };
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        let saved_keys: BTreeSet<&OsString> = self.saved.iter().map(|(key, _)| key).collect();
        for (key, _) in env::vars_os() {
            if !saved_keys.contains(&key) {
                // SAFETY: Environment mutation is serialised by holding `_guard`.
                unsafe { env::remove_var(&key) };
            }
        }
        for (key, value) in &self.saved {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe { env::set_var(key, value) };
        }
    }
}

/// Guard that temporarily replaces the value held in a [`RefCell`].
///
/// The original value is reinstated on drop, including while unwinding
/// from a panic inside the scope.
pub struct ScopedOverride<'a, T> {
    cell: &'a RefCell<T>,
    original: Option<T>,
}

impl<'a, T> ScopedOverride<'a, T> {
    /// Installs `replacement` into `cell`, returning a guard that restores
    /// the previous value when dropped.
    pub fn install(cell: &'a RefCell<T>, replacement: T) -> Self {
        let original = cell.replace(replacement);
        Self {
            cell,
            original: Some(original),
        }
    }
}

impl<T> Drop for ScopedOverride<'_, T> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            self.cell.replace(original);
        }
    }
}

/// Records a single `bootstrap` invocation made through [`RecordingStrategy`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BootstrapCall {
    /// Project of the run being bootstrapped.
    pub project: String,
    /// Cloud flag the orchestrator passed down.
    pub cloud: bool,
}

/// Scripted init strategy recording invocations for assertions.
///
/// Used to drive deterministic init outcomes without touching the real
/// process streams.
#[derive(Clone, Debug, Default)]
pub struct RecordingStrategy {
    calls: Rc<RefCell<Vec<BootstrapCall>>>,
    failure: Rc<RefCell<Option<StrategyError>>>,
}

impl RecordingStrategy {
    /// Creates a strategy that succeeds on every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `bootstrap` call fail with `error`.
    pub fn fail_with(&self, error: StrategyError) {
        *self.failure.borrow_mut() = Some(error);
    }

    /// Returns a snapshot of all recorded invocations.
    #[must_use]
    pub fn calls(&self) -> Vec<BootstrapCall> {
        self.calls.borrow().clone()
    }
}

impl InitStrategy for RecordingStrategy {
    fn bootstrap(&self, run: &mut RunHandle, cloud: bool) -> Result<(), StrategyError> {
        self.calls.borrow_mut().push(BootstrapCall {
            project: run.project.clone(),
            cloud,
        });
        if let Some(error) = self.failure.borrow().clone() {
            return Err(error);
        }
        run.set_environment([("RUNLOG_RECORDED_BY", "recording-strategy")]);
        Ok(())
    }
}

/// Records a run persisted through [`MemoryRunStore`].
#[derive(Clone, Debug)]
pub struct PersistedRun {
    /// The run handle as persisted.
    pub run: RunHandle,
    /// The request that produced the run.
    pub request: InitRequest,
}

/// In-memory run store for orchestration tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryRunStore {
    persisted: Rc<RefCell<Vec<PersistedRun>>>,
    fail: Rc<Cell<bool>>,
}

impl MemoryRunStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `persist` call fail.
    pub fn fail_persist(&self) {
        self.fail.set(true);
    }

    /// Returns a snapshot of all persisted runs.
    #[must_use]
    pub fn persisted(&self) -> Vec<PersistedRun> {
        self.persisted.borrow().clone()
    }
}

impl RunStore for MemoryRunStore {
    fn persist(&self, run: &RunHandle, request: &InitRequest) -> Result<Utf8PathBuf, StoreError> {
        if self.fail.get() {
            return Err(StoreError::Io {
                path: run.dir.clone(),
                message: String::from("simulated store failure"),
            });
        }
        self.persisted.borrow_mut().push(PersistedRun {
            run: run.clone(),
            request: request.clone(),
        });
        Ok(run.dir.join("run.json"))
    }
}
