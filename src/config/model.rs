// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::log_buffer::DEFAULT_CAPACITY;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [scheduler]
/// initial_delay = "3s"
/// period = "60s"
///
/// [log]
/// capacity = 100
///
/// [client]
/// inbox = "queue/inbox"
/// outbox = "queue/outbox"
/// ```
///
/// All sections are optional. Without `[client]` the agent still runs but
/// every cycle reports that no client is configured.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub log: LogSection,

    #[serde(default)]
    pub client: Option<ClientConfig>,
}

/// `[scheduler]` section, durations still as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Delay before the first poll.
    #[serde(default = "default_initial_delay")]
    pub initial_delay: String,

    /// Delay between the end of one cycle and the start of the next.
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_initial_delay() -> String {
    "3s".to_string()
}

fn default_period() -> String {
    "60s".to_string()
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            period: default_period(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    /// Number of activity log entries kept.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// `[client]` section: where the spool client finds tasks and puts results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub inbox: PathBuf,
    pub outbox: PathBuf,
}

/// Parsed scheduler timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub initial_delay: Duration,
    pub period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            period: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Validated, immutable configuration.
///
/// Built from a [`RawConfigFile`] via `TryFrom`; see `validate.rs`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    pub scheduler: SchedulerConfig,
    pub log: LogConfig,
    pub client: Option<ClientConfig>,
}
