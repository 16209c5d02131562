//! Log initialisation
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.
//! The filter comes from `BUILD_WATCH_LOG` (same syntax as `RUST_LOG`),
//! defaulting to `info`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "BUILD_WATCH_LOG";

/// Filter used when the environment does not specify one
pub fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(env_filter(verbose))
        .try_init();
}
