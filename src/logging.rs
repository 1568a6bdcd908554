//! Diagnostic logging for the binary
//!
//! The library only emits `tracing` events; this installs the subscriber.
//! User-facing output goes to stdout through `console`, diagnostics to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber
///
/// Reads `RUST_LOG`. Defaults to `agentkit=warn`, or `agentkit=debug` when
/// `verbose` is set.
///
/// ```bash
/// RUST_LOG=agentkit=trace agentkit install --source ./dist
/// ```
pub fn init(verbose: bool) {
    let default = if verbose { "agentkit=debug" } else { "agentkit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
