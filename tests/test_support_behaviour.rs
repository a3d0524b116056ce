//! Restore guarantees of the scoped-override test helpers.
//!
//! Each test uses its own variable names so the scenarios stay independent
//! when the harness runs them in parallel.

use std::cell::RefCell;
use std::env;
use std::panic::{AssertUnwindSafe, catch_unwind};

use runlog::test_support::{ENV_LOCK, EnvGuard, EnvSnapshot, ScopedOverride};

#[tokio::test]
async fn env_guard_restores_previous_values_and_absence() {
    const PRESET: &str = "RUNLOG_TEST_GUARD_PRESET";
    const FRESH: &str = "RUNLOG_TEST_GUARD_FRESH";

    // Seed one variable outside any guard so both restore paths are
    // exercised. The lock is not reentrant, so a single guard covers the
    // whole scope; seeding and cleanup take the lock directly.
    {
        let _lock = ENV_LOCK.lock().await;
        // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
        unsafe { env::set_var(PRESET, "before") };
    }

    {
        let _guard = EnvGuard::set_vars(&[(PRESET, "during"), (FRESH, "during")]).await;
        assert_eq!(env::var(PRESET).as_deref(), Ok("during"));
        assert_eq!(env::var(FRESH).as_deref(), Ok("during"));
    }

    let _lock = ENV_LOCK.lock().await;
    assert_eq!(env::var(PRESET).as_deref(), Ok("before"));
    assert!(env::var_os(FRESH).is_none());
    // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
    unsafe { env::remove_var(PRESET) };
}

#[tokio::test]
async fn env_guard_set_layers_writes_and_unwinds_them_in_lifo_order() {
    const KEY: &str = "RUNLOG_TEST_GUARD_LAYERED";
    const EXTRA: &str = "RUNLOG_TEST_GUARD_EXTRA";

    {
        let mut guard = EnvGuard::set_var(KEY, "first").await;
        guard.set(KEY, "second");
        guard.set(EXTRA, "added");
        assert_eq!(env::var(KEY).as_deref(), Ok("second"));
        assert_eq!(env::var(EXTRA).as_deref(), Ok("added"));
    }

    let _lock = ENV_LOCK.lock().await;
    assert!(env::var_os(KEY).is_none(), "layered writes must unwind fully");
    assert!(env::var_os(EXTRA).is_none());
}

#[tokio::test]
async fn env_guard_restores_while_unwinding() {
    const KEY: &str = "RUNLOG_TEST_GUARD_PANIC";

    let guard = EnvGuard::set_var(KEY, "during").await;
    let outcome = catch_unwind(AssertUnwindSafe(move || {
        let _guard = guard;
        assert_eq!(env::var(KEY).as_deref(), Ok("during"));
        panic!("scope failed");
    }));
    assert!(outcome.is_err(), "scope must have panicked");

    let _lock = ENV_LOCK.lock().await;
    assert!(env::var_os(KEY).is_none(), "variable must be removed after unwind");
}

#[tokio::test]
async fn env_snapshot_restores_while_unwinding() {
    const KEY: &str = "RUNLOG_TEST_SNAPSHOT_PANIC";

    let snapshot = EnvSnapshot::capture().await;
    let outcome = catch_unwind(AssertUnwindSafe(move || {
        snapshot.set(KEY, "during");
        assert_eq!(env::var(KEY).as_deref(), Ok("during"));
        panic!("scope failed");
    }));
    assert!(outcome.is_err(), "scope must have panicked");

    let _lock = ENV_LOCK.lock().await;
    assert!(env::var_os(KEY).is_none(), "added key must be removed after unwind");
}

#[tokio::test]
async fn env_snapshot_undoes_arbitrary_mutation() {
    const ADDED: &str = "RUNLOG_TEST_SNAPSHOT_ADDED";

    // No other test touches HOME, so reading it unguarded is safe.
    let home_before = env::var_os("HOME");

    {
        let snapshot = EnvSnapshot::capture().await;
        snapshot.set(ADDED, "added");
        snapshot.remove("HOME");
        assert_eq!(env::var(ADDED).as_deref(), Ok("added"));
        assert!(env::var_os("HOME").is_none());
    }

    assert!(env::var_os(ADDED).is_none(), "added key must be removed");
    assert_eq!(env::var_os("HOME"), home_before);
}

#[test]
fn scoped_override_restores_on_normal_exit() {
    let cell = RefCell::new(String::from("original"));
    {
        let _guard = ScopedOverride::install(&cell, String::from("replacement"));
        assert_eq!(cell.borrow().as_str(), "replacement");
    }
    assert_eq!(cell.borrow().as_str(), "original");
}

#[test]
fn scoped_override_restores_while_unwinding() {
    let cell = RefCell::new(7_u32);
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let _guard = ScopedOverride::install(&cell, 42);
        assert_eq!(*cell.borrow(), 42);
        panic!("scope failed");
    }));
    assert!(outcome.is_err(), "scope must have panicked");
    assert_eq!(*cell.borrow(), 7);
}

#[test]
fn scoped_overrides_nest_in_lifo_order() {
    let cell = RefCell::new(1_i32);
    {
        let _outer = ScopedOverride::install(&cell, 2);
        {
            let _inner = ScopedOverride::install(&cell, 3);
            assert_eq!(*cell.borrow(), 3);
        }
        assert_eq!(*cell.borrow(), 2);
    }
    assert_eq!(*cell.borrow(), 1);
}
