// src/types.rs

//! Values exchanged between the task client, the executor and the host.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Exit code reported when a process did not exit normally (timeout or
/// launch failure).
pub const EXIT_CODE_ABNORMAL: i32 = -1;

/// A unit of work fetched from the task queue.
///
/// ```toml
/// instance_id = "4711"
/// description = "nightly smoke"
/// command_line = "/opt/suite/run.sh --fast \"my profile\""
/// timeout_seconds = 600
/// results_path = "/opt/suite/results"
/// max_result_files = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Task {
    pub instance_id: String,

    #[serde(default)]
    pub description: String,

    /// Raw command line; single- and double-quoted spans form one argument.
    pub command_line: String,

    /// Wall-clock budget for the process. Must be > 0.
    pub timeout_seconds: u64,

    /// File or directory holding result artifacts. May be empty.
    #[serde(default)]
    pub results_path: String,

    #[serde(default)]
    pub max_result_files: usize,
}

impl Task {
    /// Check the invariants the queue is expected to uphold.
    pub fn validate(&self) -> Result<(), String> {
        if self.instance_id.trim().is_empty() {
            return Err("task has an empty instance_id".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err(format!(
                "task '{}' has timeout_seconds = 0 (must be > 0)",
                self.instance_id
            ));
        }
        Ok(())
    }

    /// Name used in log lines: `description [command_line]`.
    pub fn display_name(&self) -> String {
        format!("{} [{}]", self.description, self.command_line)
    }
}

/// Outcome of running a [`Task`], handed to the task client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    pub instance_id: String,

    /// [`EXIT_CODE_ABNORMAL`] when the process timed out or never launched.
    pub exit_code: i32,

    /// Merged stdout + stderr.
    pub captured_output: String,

    /// `None` when no artifacts were looked for or the results path was
    /// neither a file nor a directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_files: Option<Vec<PathBuf>>,
}

/// Coarse agent state exposed to the host (tray icon, status page).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    /// No task client is configured yet.
    NotConfigured,
    Idle,
    /// A task process is running or its result is being reported.
    Running,
    /// The last cycle failed.
    Failed,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::NotConfigured => "not configured",
            AgentStatus::Idle => "idle",
            AgentStatus::Running => "running",
            AgentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}
