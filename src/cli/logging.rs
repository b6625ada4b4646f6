//! cli::logging
//!
//! Installs the `tracing` subscriber for the binary.
//!
//! Events go to stderr so stdout carries only command output. The filter is
//! taken from `GITVER_LOG`, then `RUST_LOG`, then defaults to `warn`
//! (`debug` with `--debug`).

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "GITVER_LOG";

/// Build the filter for the given debug flag.
pub fn filter(debug: bool) -> EnvFilter {
    let fallback = if debug { "debug" } else { "warn" };

    if debug {
        return EnvFilter::new(fallback);
    }

    match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!(
                "invalid {} directive ({}); defaulting to {} logging",
                LOG_ENV, err, fallback
            );
            EnvFilter::new(fallback)
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(debug: bool) {
    fmt()
        .with_env_filter(filter(debug))
        .with_writer(std::io::stderr)
        .with_target(debug)
        .without_time()
        .try_init()
        .ok();
}
