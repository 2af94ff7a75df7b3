// src/errors.rs

//! Crate-wide error types.
//!
//! - [`XbotError`] covers startup / configuration failures.
//! - [`ClientError`] is what a [`crate::client::TaskClient`] may fail with.
//! - [`FailureKind`] classifies anything caught at the cycle boundary so it
//!   can be logged with a human-readable prefix and surfaced as a failed
//!   status.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum XbotError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure kinds a task client reports for transport or protocol trouble.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("communication failure: {0}")]
    Communication(String),

    #[error("authentication rejected: {0}")]
    Authentication(String),
}

/// Classification used when a cycle fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Communication,
    Authentication,
    Unclassified,
}

impl FailureKind {
    /// Prefix prepended to the log line of a failed cycle.
    pub fn prefix(self) -> &'static str {
        match self {
            FailureKind::Communication => {
                "Error occurred during communication with the task server: "
            }
            FailureKind::Authentication => "Task server rejected the credentials: ",
            FailureKind::Unclassified => "Unhandled error: ",
        }
    }
}

impl From<&ClientError> for FailureKind {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Communication(_) => FailureKind::Communication,
            ClientError::Authentication(_) => FailureKind::Authentication,
        }
    }
}

impl ClientError {
    /// The bare message, without the `Display` prefix.
    pub fn message(&self) -> &str {
        match self {
            ClientError::Communication(msg) | ClientError::Authentication(msg) => msg,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, XbotError>;
