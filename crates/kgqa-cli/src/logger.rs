//! Logging initialisation via tracing-subscriber.
//!
//! Logs go to stderr so stdout stays clean for answers and reports.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// `level` is an `EnvFilter` directive such as `"warn"` or
/// `"kgqa_query=debug"`. When `prefer_level` is `true` (the level came from
/// the command line) it wins over `RUST_LOG`; otherwise `RUST_LOG` wins and
/// `level` is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<()> {
    let filter = if prefer_level {
        EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level '{level}': {e}"))?
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to set subscriber: {e}"))
}
