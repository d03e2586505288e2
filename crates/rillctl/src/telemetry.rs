//! Tracing initialization for the control tool.

use tracing_subscriber::EnvFilter;

/// Initialize the console tracing subscriber.
///
/// Call this once at startup, before any `tracing` events are emitted.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
