//! Logging setup.
//!
//! `tracing` events from both crates go through one `fmt` subscriber.
//! The level filter comes from `RUST_LOG` and defaults to `info`, e.g.
//! `RUST_LOG=attrition_engine=debug` for per-month phase summaries.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Call once, at process start.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Subscriber for tests: debug level, captured by the test harness.
/// Safe to call from every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
