use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use xbot::exec::{Execution, TaskExecutor};
use xbot::types::Task;

use crate::builders::completed;

/// A fake executor that:
/// - records which tasks were "run"
/// - optionally waits (a fixed delay, or until released) to simulate a
///   long-running process
/// - returns a canned `Execution`.
#[derive(Clone)]
pub struct FakeExecutor {
    execution: Execution,
    delay: Duration,
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
    executed: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            execution: completed(0, "ok\n"),
            delay: Duration::ZERO,
            gate: None,
            started: Arc::new(Notify::new()),
            executed: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn returning(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Block every execution until `release` is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one gated execution finish.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Resolves once an execution has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskExecutor for FakeExecutor {
    fn execute<'a>(
        &'a self,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Execution> + Send + 'a>> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            {
                let mut guard = self.executed.lock().unwrap();
                guard.push(task.instance_id.clone());
            }
            self.started.notify_one();

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.execution.clone()
        })
    }
}
