// src/engine/cycle.rs

//! One scheduler cycle: poll → (execute → report)?.
//!
//! Every failure is caught here, logged with its classified prefix and
//! turned into [`AgentStatus::Failed`]; nothing escapes to the scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::client::{ClientSlot, TaskClient};
use crate::errors::{ClientError, FailureKind};
use crate::exec::{ExecutionOutcome, TaskExecutor};
use crate::log_buffer::LogBuffer;
use crate::types::AgentStatus;

use super::status::StatusChannel;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// No client was configured; nothing was polled.
    NotConfigured,
    /// The queue was empty.
    NoTask,
    /// A task ran and its result was accepted by the client.
    Reported {
        instance_id: String,
        outcome: ExecutionOutcome,
        location: String,
    },
    /// The cycle was aborted by a client or unexpected failure.
    Failed(FailureKind),
}

/// Runs cycles against the current client and executor.
pub struct CycleRunner {
    clients: ClientSlot,
    executor: Arc<dyn TaskExecutor>,
    log: Arc<LogBuffer>,
    status: StatusChannel,
}

impl std::fmt::Debug for CycleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleRunner")
            .field("clients", &self.clients)
            .field("status", &self.status.current())
            .finish_non_exhaustive()
    }
}

impl CycleRunner {
    pub fn new(
        clients: ClientSlot,
        executor: Arc<dyn TaskExecutor>,
        log: Arc<LogBuffer>,
        status: StatusChannel,
    ) -> Self {
        Self {
            clients,
            executor,
            log,
            status,
        }
    }

    /// Run one complete cycle. Never fails; see [`CycleReport`].
    pub async fn run_cycle(&self) -> CycleReport {
        info!("runner is awake");
        self.log.append("Runner is awake, getting next task to run");

        let report = match self.clients.current() {
            None => {
                warn!("task client is not yet configured");
                self.log.append("Task client is not yet configured");
                self.status.set(AgentStatus::NotConfigured);
                CycleReport::NotConfigured
            }
            Some(client) => match self.poll_and_run(client.as_ref()).await {
                Ok(report) => report,
                Err(err) => {
                    let kind = FailureKind::from(&err);
                    self.record_failure(kind, err.message());
                    CycleReport::Failed(kind)
                }
            },
        };

        info!("runner finished, going to sleep");
        self.log.append("Runner finished, going to sleep.");
        report
    }

    /// Log a cycle failure and flag it to the host.
    pub fn record_failure(&self, kind: FailureKind, message: &str) {
        error!(?kind, error = %message, "cycle failed");
        self.log.append(format!("{}{}", kind.prefix(), message));
        self.status.set(AgentStatus::Failed);
    }

    async fn poll_and_run(&self, client: &dyn TaskClient) -> Result<CycleReport, ClientError> {
        let Some(task) = client.next_task().await? else {
            info!("no task in the queue");
            self.log.append("There is no task to run in the queue");
            self.status.set(AgentStatus::Idle);
            return Ok(CycleReport::NoTask);
        };

        let name = task.display_name();
        info!(instance_id = %task.instance_id, task = %name, "running task");
        self.log.append(format!("Running {name}"));
        self.status.set(AgentStatus::Running);

        let execution = self.executor.execute(&task).await;

        match &execution.outcome {
            ExecutionOutcome::Completed(code) => {
                self.log
                    .append(format!("Task [{name}] finished with exit code {code}"));
            }
            ExecutionOutcome::TimedOut => {
                self.log.append(format!("Task [{name}] timed out"));
            }
            ExecutionOutcome::LaunchFailed(cause) => {
                self.log
                    .append(format!("Task [{name}] could not be launched: {cause}"));
            }
        }
        self.log
            .append(format!("Task [{name}] output: [{}]", execution.output));
        self.log.append(format!(
            "Uploading task results... {}",
            describe_artifacts(execution.artifacts.as_deref())
        ));

        let outcome = execution.outcome.clone();
        let instance_id = task.instance_id.clone();
        let location = client
            .upload_result(execution.into_result(task.instance_id))
            .await?;

        info!(%instance_id, %location, exit_code = outcome.exit_code(), "uploaded task result");
        self.log
            .append(format!("Finished uploading task results [{location}]."));

        // A timeout or launch failure is reported like any result, but the
        // host still sees the cycle as failed.
        self.status.set(if outcome.is_completed() {
            AgentStatus::Idle
        } else {
            AgentStatus::Failed
        });

        Ok(CycleReport::Reported {
            instance_id,
            outcome,
            location,
        })
    }
}

fn describe_artifacts(files: Option<&[PathBuf]>) -> String {
    match files {
        None => "[no result files]".to_string(),
        Some(files) => format!("{:?}", files),
    }
}
