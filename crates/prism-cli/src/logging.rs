//! Diagnostic logging setup.
//!
//! Events go to stderr so stdout stays clean for generated text and JSON.
//! `RUST_LOG` wins when set; otherwise the `-v` count picks the level.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Build the filter for a verbosity directive such as `"info"`.
///
/// Falls back to `default_level` when `RUST_LOG` is unset or unparseable.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Subsequent calls are no-ops.
pub fn init(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
