//! Shared helpers for bgdl-bridge integration tests.

pub mod fake_native;

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("bgdl=debug")
        .with_test_writer()
        .try_init();
}
