//! Configuration management for the station.

use finishline_engine::{config::DEFAULT_MAX_EVENT_DURATION_MS, EngineConfig, Timestamp};
use std::env;
use std::path::PathBuf;

/// Station configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one JSON document per event
    pub data_dir: PathBuf,
    /// Finish times above this many milliseconds are rejected
    pub max_event_ms: u64,
    /// Creation time of the local event the binary works on
    pub event: Option<Timestamp>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("FINISHLINE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./finishline-data"));

        let max_event_ms = match lookup("FINISHLINE_MAX_EVENT_MS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidMaxEventMs)?,
            None => DEFAULT_MAX_EVENT_DURATION_MS,
        };

        let event = lookup("FINISHLINE_EVENT")
            .map(|value| value.trim().parse().map_err(|_| ConfigError::InvalidEvent))
            .transpose()?;

        Ok(Self {
            data_dir,
            max_event_ms,
            event,
        })
    }

    /// The event to open, required by the binary.
    pub fn require_event(&self) -> Result<Timestamp, ConfigError> {
        self.event.ok_or(ConfigError::MissingEvent)
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            max_event_duration_ms: self.max_event_ms,
        }
    }
}

/// Configuration errors.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("FINISHLINE_EVENT environment variable is required")]
    MissingEvent,

    #[error("Invalid FINISHLINE_EVENT value")]
    InvalidEvent,

    #[error("Invalid FINISHLINE_MAX_EVENT_MS value")]
    InvalidMaxEventMs,
}
