//! Tracing setup for the `grove` binary.
//!
//! Diagnostics go to stderr so stdout stays clean for rendered forests.
//! At `info` the CLI logs each script step it applies. At `debug` the
//! session reports expands of unknown ids, generated child ids and loads
//! that settle after their node was removed, and the load coordinator
//! reports load start and settle, duplicate triggers, cache hits and source
//! fetches. Failed loads are logged at `warn`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to `warn`. Compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=grove=debug grove apply forest.json --script intents.json
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
