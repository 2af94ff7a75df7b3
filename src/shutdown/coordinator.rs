// src/shutdown/coordinator.rs

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::SchedulerHandle;
use crate::errors::Result;
use crate::log_buffer::LogBuffer;

use super::ShutdownSignal;

/// A background task that accepts requests from outside the agent
/// (OS signals, config reloads, status consumers).
#[derive(Debug)]
struct Listener {
    name: String,
    task: JoinHandle<()>,
}

/// Drives the ordered teardown once a stop is requested:
///
/// 1. stop every registered listener,
/// 2. cancel the scheduler so no new cycle starts,
/// 3. wait for the in-flight cycle (if any) to finish reporting.
///
/// The caller exits the process with a success status afterwards.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    listeners: Vec<Listener>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle used to request the shutdown from anywhere.
    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub fn register_listener(&mut self, name: impl Into<String>, task: JoinHandle<()>) {
        let name = name.into();
        debug!(listener = %name, "registered external listener");
        self.listeners.push(Listener { name, task });
    }

    /// Wait for the stop request, then tear down in order.
    pub async fn run(self, scheduler: SchedulerHandle, log: &LogBuffer) -> Result<()> {
        self.signal.wait().await;
        info!("shutdown requested");
        log.append("Shutdown requested");

        for listener in self.listeners {
            listener.task.abort();
            match listener.task.await {
                Ok(()) => debug!(listener = %listener.name, "listener had already finished"),
                Err(e) if e.is_cancelled() => {
                    debug!(listener = %listener.name, "listener stopped")
                }
                Err(e) => warn!(listener = %listener.name, error = %e, "listener failed"),
            }
        }
        info!("stopped external listeners");

        scheduler.cancel();
        scheduler.join().await?;

        info!("scheduler stopped; exiting");
        log.append("Agent stopped");
        Ok(())
    }
}
