// src/config/mod.rs

//! Configuration loading and validation for xbot.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and convert the raw model into an immutable [`ConfigFile`]
//!   (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ClientConfig, ConfigFile, LogConfig, LogSection, RawConfigFile, SchedulerConfig,
    SchedulerSection,
};
