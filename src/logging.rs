//! Logging setup for memscan
//!
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a global stderr subscriber.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init(config: &LoggingConfig) {
    let filter = filter_for(config);

    let layer = fmt::layer()
        .with_target(config.target)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

fn filter_for(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
