//! Tracing setup for hosts embedding the core
//!
//! The library itself only emits `tracing` events. Host binaries call
//! [`init_tracing`] once at startup; `RUST_LOG` takes precedence over the
//! configured default filter.

use crate::config::CoreConfig;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &CoreConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_from(config))
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

fn filter_from(config: &CoreConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
}
