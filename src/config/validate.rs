// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::model::{
    ClientConfig, ConfigFile, LogConfig, RawConfigFile, SchedulerConfig, SchedulerSection,
};
use crate::errors::{Result, XbotError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = XbotError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let scheduler = validate_scheduler(&raw.scheduler)?;
        let log = validate_log(raw.log.capacity)?;
        if let Some(ref client) = raw.client {
            validate_client(client)?;
        }

        Ok(ConfigFile {
            scheduler,
            log,
            client: raw.client,
        })
    }
}

fn validate_scheduler(section: &SchedulerSection) -> Result<SchedulerConfig> {
    let initial_delay = parse_duration(&section.initial_delay).map_err(|e| {
        XbotError::ConfigError(format!("[scheduler].initial_delay: {e}"))
    })?;
    let period = parse_duration(&section.period)
        .map_err(|e| XbotError::ConfigError(format!("[scheduler].period: {e}")))?;

    if period.is_zero() {
        return Err(XbotError::ConfigError(
            "[scheduler].period must be > 0".to_string(),
        ));
    }

    Ok(SchedulerConfig {
        initial_delay,
        period,
    })
}

fn validate_log(capacity: usize) -> Result<LogConfig> {
    if capacity == 0 {
        return Err(XbotError::ConfigError(
            "[log].capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(LogConfig { capacity })
}

fn validate_client(client: &ClientConfig) -> Result<()> {
    if client.inbox.as_os_str().is_empty() {
        return Err(XbotError::ConfigError(
            "[client].inbox must not be empty".to_string(),
        ));
    }
    if client.outbox.as_os_str().is_empty() {
        return Err(XbotError::ConfigError(
            "[client].outbox must not be empty".to_string(),
        ));
    }
    Ok(())
}
