#![allow(dead_code)]

use std::time::Duration;

use xbot::config::SchedulerConfig;
use xbot::exec::{Execution, ExecutionOutcome};
use xbot::types::Task;

/// Builder for `Task` to simplify test setup.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(instance_id: &str, command_line: &str) -> Self {
        Self {
            task: Task {
                instance_id: instance_id.to_string(),
                description: format!("task {instance_id}"),
                command_line: command_line.to_string(),
                timeout_seconds: 10,
                results_path: String::new(),
                max_result_files: 0,
            },
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.task.description = description.to_string();
        self
    }

    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.task.timeout_seconds = secs;
        self
    }

    pub fn results_path(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.task.results_path = path.as_ref().to_string_lossy().into_owned();
        self
    }

    pub fn max_result_files(mut self, max: usize) -> Self {
        self.task.max_result_files = max;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// A completed execution with the given exit code and output.
pub fn completed(code: i32, output: &str) -> Execution {
    Execution {
        outcome: ExecutionOutcome::Completed(code),
        output: output.to_string(),
        artifacts: None,
    }
}

/// Scheduler timing for tests: start right away, then poll every `period_ms`.
pub fn fast_schedule(period_ms: u64) -> SchedulerConfig {
    SchedulerConfig {
        initial_delay: Duration::ZERO,
        period: Duration::from_millis(period_ms),
    }
}
