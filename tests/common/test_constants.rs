//! Constants used by more than one behavioural test binary.
//!
//! Cargo builds each top-level file under `tests/` as its own crate, so this
//! file lives in a subdirectory where it is not picked up as a test binary.
//! Each consumer pulls it in with a `#[path = "common/test_constants.rs"]`
//! module declaration.

/// Project name used by behavioural scenarios.
pub const TEST_PROJECT: &str = "test-project";

/// Wire value selecting the offline dry-run mode.
pub const DRYRUN_MODE: &str = "dryrun";
