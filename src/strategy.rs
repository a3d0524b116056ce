//! Pluggable init strategies.
//!
//! The original client selected its initialisation path by replacing an
//! internal hook at runtime. Here the strategy is an injected collaborator:
//! callers (and the configuration layer, via [`StrategyKind`]) choose
//! between an interactive bootstrap that requires terminal streams and a
//! headless one that never touches them.

use std::io::{IsTerminal, stderr, stdin};

use thiserror::Error;

use crate::config::StrategyKind;
use crate::run::RunHandle;

/// Probe reporting whether interactive terminal streams are attached.
pub type TerminalProbe = fn() -> bool;

/// Errors raised while bootstrapping a run.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StrategyError {
    /// Raised when the headless strategy is asked to talk to the server.
    #[error("headless init does not support cloud mode; set RUNLOG_MODE=dryrun or use the interactive strategy")]
    CloudModeUnsupported,
    /// Raised when the interactive strategy finds no terminal attached.
    #[error("interactive init requires a terminal; none is attached to stdin/stderr")]
    NoTerminal,
}

/// Strategy invoked by the orchestrator to attach a new run to the process.
pub trait InitStrategy {
    /// Bootstraps `run`, with `cloud` signalling that the run will
    /// synchronise to the tracking server.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError`] when the strategy cannot operate in the
    /// current process (wrong mode, missing terminal).
    fn bootstrap(&self, run: &mut RunHandle, cloud: bool) -> Result<(), StrategyError>;
}

impl<S: InitStrategy + ?Sized> InitStrategy for Box<S> {
    fn bootstrap(&self, run: &mut RunHandle, cloud: bool) -> Result<(), StrategyError> {
        (**self).bootstrap(run, cloud)
    }
}

/// Bootstrap that never opens terminal streams.
///
/// Refuses cloud mode outright; offline runs get the current process
/// environment applied to the handle and nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessInit;

impl InitStrategy for HeadlessInit {
    fn bootstrap(&self, run: &mut RunHandle, cloud: bool) -> Result<(), StrategyError> {
        if cloud {
            return Err(StrategyError::CloudModeUnsupported);
        }
        run.capture_process_environment();
        Ok(())
    }
}

/// Bootstrap that attaches to the invoking terminal.
#[derive(Clone, Copy, Debug)]
pub struct InteractiveInit {
    probe: TerminalProbe,
}

impl InteractiveInit {
    /// Creates an interactive strategy probing the real stdio streams.
    #[must_use]
    pub fn new() -> Self {
        Self {
            probe: stdio_is_terminal,
        }
    }

    /// Creates an interactive strategy with an injected terminal probe.
    ///
    /// Tests use this to exercise the no-terminal failure deterministically.
    #[must_use]
    pub const fn with_probe(probe: TerminalProbe) -> Self {
        Self { probe }
    }
}

impl Default for InteractiveInit {
    fn default() -> Self {
        Self::new()
    }
}

impl InitStrategy for InteractiveInit {
    fn bootstrap(&self, run: &mut RunHandle, _cloud: bool) -> Result<(), StrategyError> {
        if !(self.probe)() {
            return Err(StrategyError::NoTerminal);
        }
        run.capture_process_environment();
        Ok(())
    }
}

/// Reports whether both stdin and stderr are terminals.
#[must_use]
pub fn stdio_is_terminal() -> bool {
    stdin().is_terminal() && stderr().is_terminal()
}

/// Maps a configured [`StrategyKind`] to a concrete strategy.
///
/// `auto` picks the interactive bootstrap only when a terminal is attached,
/// so test harnesses and batch jobs fall through to the headless path.
#[must_use]
pub fn select(kind: StrategyKind) -> Box<dyn InitStrategy> {
    match kind {
        StrategyKind::Interactive => Box::new(InteractiveInit::new()),
        StrategyKind::Headless => Box::new(HeadlessInit),
        StrategyKind::Auto => {
            if stdio_is_terminal() {
                Box::new(InteractiveInit::new())
            } else {
                Box::new(HeadlessInit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;

    use super::*;
    use crate::config::Mode;

    fn handle() -> RunHandle {
        RunHandle::new("demo", Mode::Dryrun, Utf8Path::new("/tmp/root"))
    }

    #[test]
    fn headless_refuses_cloud_mode() {
        let mut run = handle();
        let err = HeadlessInit
            .bootstrap(&mut run, true)
            .expect_err("cloud mode must be refused");
        assert_eq!(err, StrategyError::CloudModeUnsupported);
        assert!(run.environment.is_empty());
    }

    #[test]
    fn headless_applies_process_environment_offline() {
        let mut run = handle();
        HeadlessInit
            .bootstrap(&mut run, false)
            .unwrap_or_else(|err| panic!("headless bootstrap failed: {err}"));
        assert!(!run.environment.is_empty());
    }

    #[test]
    fn interactive_fails_without_terminal() {
        let mut run = handle();
        let strategy = InteractiveInit::with_probe(|| false);
        let err = strategy
            .bootstrap(&mut run, false)
            .expect_err("probe reports no terminal");
        assert_eq!(err, StrategyError::NoTerminal);
    }

    #[test]
    fn interactive_succeeds_with_terminal() {
        let mut run = handle();
        let strategy = InteractiveInit::with_probe(|| true);
        strategy
            .bootstrap(&mut run, true)
            .unwrap_or_else(|err| panic!("interactive bootstrap failed: {err}"));
        assert!(!run.environment.is_empty());
    }

    #[test]
    fn boxed_strategies_delegate() {
        let mut run = handle();
        let strategy: Box<dyn InitStrategy> = Box::new(HeadlessInit);
        let err = strategy
            .bootstrap(&mut run, true)
            .expect_err("boxed headless must still refuse cloud mode");
        assert_eq!(err, StrategyError::CloudModeUnsupported);
    }
}
