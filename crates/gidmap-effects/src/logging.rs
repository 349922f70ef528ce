//! Tracing subscriber setup
//!
//! gidmap libraries only emit `tracing` events; binaries and test harnesses
//! install a subscriber here. `RUST_LOG` wins over the default level.

use gidmap_core::GidError;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber filtered by `RUST_LOG`, else `default_level`.
///
/// Fails if the filter is malformed or a global subscriber already exists.
pub fn init_tracing(default_level: &str) -> Result<(), GidError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| GidError::config(format!("Invalid log filter '{default_level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| GidError::config(format!("Failed to install tracing subscriber: {e}")))
}

/// Install the subscriber for tests, ignoring an already-installed one
pub fn init_test_tracing() {
    let _ = init_tracing("warn");
}
