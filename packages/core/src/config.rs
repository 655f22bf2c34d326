//! Runtime configuration
//!
//! `CoreConfig` carries the tunables of the store and repositories. It has
//! sensible defaults, can be deserialized from a settings file by the host
//! application, and can be overridden from the environment:
//!
//! - `SPACENOTES_SNAPSHOT_BUFFER` - snapshots buffered per subscription
//! - `SPACENOTES_CHANGE_CAPACITY` - store change broadcast capacity
//! - `SPACENOTES_DEFAULT_TEMPLATE` - template for spaces stored without one
//! - `SPACENOTES_LOG` - default tracing filter when `RUST_LOG` is unset

use crate::models::SpaceTemplate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for per-subscription buffers; snapshots are full replacements,
/// so deep buffers only delay consumers.
const MAX_SNAPSHOT_BUFFER: usize = 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Snapshots buffered per live subscription before the store waits
    pub snapshot_buffer: usize,

    /// Capacity of the store change broadcast channel
    pub change_channel_capacity: usize,

    /// Template assumed for space documents without a `template` field
    pub default_template: SpaceTemplate,

    /// Default tracing filter directive
    pub log_filter: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            snapshot_buffer: 16,
            change_channel_capacity: 256,
            default_template: SpaceTemplate::Dated,
            log_filter: "info".to_string(),
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `SPACENOTES_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, settings map, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("SPACENOTES_SNAPSHOT_BUFFER") {
            config.snapshot_buffer = parse_usize("SPACENOTES_SNAPSHOT_BUFFER", &raw)?;
        }
        if let Some(raw) = lookup("SPACENOTES_CHANGE_CAPACITY") {
            config.change_channel_capacity = parse_usize("SPACENOTES_CHANGE_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("SPACENOTES_DEFAULT_TEMPLATE") {
            config.default_template = raw
                .parse()
                .map_err(|reason| ConfigError::invalid("SPACENOTES_DEFAULT_TEMPLATE", reason))?;
        }
        if let Some(raw) = lookup("SPACENOTES_LOG") {
            config.log_filter = raw;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_buffer == 0 {
            return Err(ConfigError::invalid(
                "snapshot_buffer",
                "must be greater than 0",
            ));
        }

        if self.snapshot_buffer > MAX_SNAPSHOT_BUFFER {
            return Err(ConfigError::invalid(
                "snapshot_buffer",
                format!("cannot exceed {}", MAX_SNAPSHOT_BUFFER),
            ));
        }

        if self.change_channel_capacity == 0 {
            return Err(ConfigError::invalid(
                "change_channel_capacity",
                "must be greater than 0",
            ));
        }

        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::invalid("log_filter", "cannot be empty"));
        }

        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a positive integer", raw)))
}
