//! Log setup
//!
//! Logs go to stderr so that CSV written to stdout stays clean. The level is
//! read from `RUST_LOG` and defaults to `info`.

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
