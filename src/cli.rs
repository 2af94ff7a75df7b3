// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `xbot`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "xbot",
    version,
    about = "Poll a task queue and run one task at a time under a timeout.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `xbot.toml` in the current working directory is used when
    /// it exists; otherwise the agent starts with defaults and no client.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Run a single poll cycle and exit.
    #[arg(long)]
    pub once: bool,

    /// Check that the configured task client can reach its queue, then exit.
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    pub validate: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `XBOT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config and print it, but don't poll.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
