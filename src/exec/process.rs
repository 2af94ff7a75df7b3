// src/exec/process.rs

//! Timeout-bounded execution of a single task process.
//!
//! One `execute` call owns three sibling activities:
//! - the wait on the child process,
//! - the deadline, raced against the wait in a `select!`,
//! - the drain task, which reads stdout and stderr into one buffer.
//!
//! The deadline future is dropped as soon as the wait wins, so it can never
//! fire into later work. The drain task is joined (bounded by a grace
//! period) or aborted before `execute` returns.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, info, warn};

use crate::exec::artifacts::select_artifacts;
use crate::exec::command_line::{parse_command_line, working_dir_for};
use crate::fs::FileSystem;
use crate::log_buffer::LogBuffer;
use crate::types::{Task, TaskResult, EXIT_CODE_ABNORMAL};

/// How long to keep reading output after the process is gone.
///
/// A grandchild that inherited the pipes can keep them open; after this
/// grace period the drain is abandoned and whatever was read is kept.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Stand-in deadline for timeouts too large to add to the current instant.
/// The timer clamps anything this far out anyway.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// How a task process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The process exited on its own before the deadline. Processes killed
    /// by a signal report [`EXIT_CODE_ABNORMAL`].
    Completed(i32),
    /// The deadline fired first and the process was killed.
    TimedOut,
    /// The process could not be started (or could not be waited on).
    LaunchFailed(String),
}

impl ExecutionOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutionOutcome::Completed(code) => *code,
            ExecutionOutcome::TimedOut | ExecutionOutcome::LaunchFailed(_) => EXIT_CODE_ABNORMAL,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed(_))
    }
}

/// Everything `execute` produces for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub outcome: ExecutionOutcome,
    /// Merged stdout + stderr, one `\n`-terminated line per line read.
    pub output: String,
    pub artifacts: Option<Vec<PathBuf>>,
}

impl Execution {
    pub fn launch_failed(cause: impl Into<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::LaunchFailed(cause.into()),
            output: String::new(),
            artifacts: None,
        }
    }

    pub fn into_result(self, instance_id: impl Into<String>) -> TaskResult {
        TaskResult {
            instance_id: instance_id.into(),
            exit_code: self.outcome.exit_code(),
            captured_output: self.output,
            artifact_files: self.artifacts,
        }
    }
}

/// Runs task command lines as OS processes.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    log: Arc<LogBuffer>,
    fs: Arc<dyn FileSystem>,
    drain_grace: Duration,
}

impl ProcessExecutor {
    pub fn new(log: Arc<LogBuffer>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            log,
            fs,
            drain_grace: DRAIN_GRACE,
        }
    }

    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Run `task` to completion or until its deadline, whichever is first.
    pub async fn execute(&self, task: &Task) -> Execution {
        let argv = parse_command_line(&task.command_line);
        info!(instance_id = %task.instance_id, ?argv, "running command");
        self.log.append(format!("Running command {:?}", argv));

        let Some((program, args)) = argv.split_first() else {
            return self.launch_failed(task, "command line is empty".to_string());
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down everything the task
        // started.
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = working_dir_for(program) {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return self.launch_failed(task, e.to_string()),
        };

        let deadline = deadline_after(Duration::from_secs(task.timeout_seconds));
        let sink = Arc::new(Mutex::new(String::new()));
        let drain = DrainTask(tokio::spawn(drain_merged(
            child.stdout.take(),
            child.stderr.take(),
            Arc::clone(&sink),
        )));

        let outcome = self.wait_with_deadline(task, &mut child, deadline).await;

        drain.finish(self.drain_grace, &task.instance_id).await;
        let output = std::mem::take(&mut *sink.lock().unwrap_or_else(PoisonError::into_inner));

        let artifacts = if outcome.is_completed() {
            self.collect_artifacts(task)
        } else {
            None
        };

        Execution {
            outcome,
            output,
            artifacts,
        }
    }

    async fn wait_with_deadline(
        &self,
        task: &Task,
        child: &mut Child,
        deadline: Instant,
    ) -> ExecutionOutcome {
        tokio::select! {
            // Prefer a normal exit if both are ready at once.
            biased;

            status_res = child.wait() => match status_res {
                Ok(status) => {
                    let code = status.code().unwrap_or(EXIT_CODE_ABNORMAL);
                    info!(
                        instance_id = %task.instance_id,
                        exit_code = code,
                        success = status.success(),
                        "task process exited"
                    );
                    self.log.append(format!(
                        "Process for [{}] exited with code {}",
                        task.description, code
                    ));
                    ExecutionOutcome::Completed(code)
                }
                Err(e) => {
                    warn!(
                        instance_id = %task.instance_id,
                        error = %e,
                        "failed waiting for task process"
                    );
                    self.log.append(format!(
                        "IO error while running [{}]: {}",
                        task.description, e
                    ));
                    if let Err(kill_err) = child.start_kill() {
                        debug!(error = %kill_err, "process already gone after wait failure");
                    }
                    ExecutionOutcome::LaunchFailed(format!("waiting for process: {e}"))
                }
            },

            () = sleep_until(deadline) => {
                warn!(
                    instance_id = %task.instance_id,
                    timeout_secs = task.timeout_seconds,
                    "timeout expired; killing task process"
                );
                self.log.append(format!("Timeout expired for [{}]", task.description));
                kill_process_group(child);
                if let Err(e) = child.kill().await {
                    warn!(
                        instance_id = %task.instance_id,
                        error = %e,
                        "failed to kill timed-out process"
                    );
                }
                ExecutionOutcome::TimedOut
            }
        }
    }

    fn collect_artifacts(&self, task: &Task) -> Option<Vec<PathBuf>> {
        match select_artifacts(self.fs.as_ref(), &task.results_path, task.max_result_files) {
            Ok(Some(files)) => {
                debug!(instance_id = %task.instance_id, ?files, "selected result files");
                self.log.append(format!(
                    "Selected {} result file(s) from [{}]",
                    files.len(),
                    task.results_path
                ));
                Some(files)
            }
            Ok(None) => {
                self.log.append(format!("No result files at [{}]", task.results_path));
                None
            }
            Err(e) => {
                warn!(
                    instance_id = %task.instance_id,
                    results_path = %task.results_path,
                    error = %e,
                    "failed to list result files"
                );
                self.log.append(format!(
                    "Failed to list result files at [{}]: {}",
                    task.results_path, e
                ));
                None
            }
        }
    }

    fn launch_failed(&self, task: &Task, cause: String) -> Execution {
        warn!(
            instance_id = %task.instance_id,
            error = %cause,
            "failed to launch task process"
        );
        self.log.append(format!(
            "Failed to launch [{}]: {}",
            task.description, cause
        ));
        Execution::launch_failed(cause)
    }
}

fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget).unwrap_or(now + FAR_FUTURE)
}

/// SIGKILL the child's whole process group. The child itself is still
/// reaped through `Child::kill`.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: plain syscall on a process group this executor created.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            pgid,
            error = %std::io::Error::last_os_error(),
            "process group already gone"
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

/// Drain task handle; aborted if dropped before it finished.
struct DrainTask(JoinHandle<()>);

impl DrainTask {
    async fn finish(mut self, grace: Duration, instance_id: &str) {
        match timeout(grace, &mut self.0).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(instance_id, error = %e, "output drain task failed");
            }
            Err(_) => {
                warn!(
                    instance_id,
                    grace_ms = grace.as_millis() as u64,
                    "output still open after process ended; keeping partial output"
                );
            }
        }
    }
}

impl Drop for DrainTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Read stdout and stderr line by line into `sink`, in arrival order, until
/// both reach end of stream.
async fn drain_merged(
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    sink: Arc<Mutex<String>>,
) {
    let mut out = stdout.map(|s| BufReader::new(s).split(b'\n'));
    let mut err = stderr.map(|s| BufReader::new(s).split(b'\n'));

    while out.is_some() || err.is_some() {
        let line = tokio::select! {
            line = next_line(&mut out), if out.is_some() => line,
            line = next_line(&mut err), if err.is_some() => line,
        };

        if let Some(line) = line {
            append_line(&sink, &line);
        }
    }
}

// `Split::next_segment` is cancel safe, so losing a select race drops no data.
async fn next_line<R>(stream: &mut Option<Split<R>>) -> Option<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let split = stream.as_mut()?;
    let read = split.next_segment().await;
    match read {
        Ok(Some(line)) => Some(line),
        Ok(None) => {
            *stream = None;
            None
        }
        Err(e) => {
            debug!(error = %e, "output stream read failed; closing it");
            *stream = None;
            None
        }
    }
}

fn append_line(sink: &Mutex<String>, raw: &[u8]) {
    let text = String::from_utf8_lossy(raw);
    let line = text.strip_suffix('\r').unwrap_or(text.as_ref());

    let mut buf = sink.lock().unwrap_or_else(PoisonError::into_inner);
    buf.push_str(line);
    buf.push('\n');
}
