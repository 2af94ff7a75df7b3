// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command_line`] splits a raw command line into argv.
//! - [`process`] runs one task under its deadline and captures output.
//! - [`artifacts`] selects the result files to upload.
//! - [`backend`] provides the `TaskExecutor` trait the cycle runner uses,
//!   implemented by `ProcessExecutor` and by test fakes.

pub mod artifacts;
pub mod backend;
pub mod command_line;
pub mod process;

pub use artifacts::select_artifacts;
pub use backend::TaskExecutor;
pub use command_line::{parse_command_line, working_dir_for};
pub use process::{Execution, ExecutionOutcome, ProcessExecutor};
