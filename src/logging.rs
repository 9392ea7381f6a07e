// Logging setup for binaries. The library only emits `tracing` events.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// RUST_LOG wins over `filter`; `verbose` raises the crate to debug.
pub fn init(filter: &str, verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive(filter, verbose)))
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", filter, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}

fn directive(filter: &str, verbose: bool) -> String {
    if verbose {
        format!("{},user_registry=debug", filter)
    } else {
        filter.to_string()
    }
}
