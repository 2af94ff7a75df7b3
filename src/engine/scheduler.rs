// src/engine/scheduler.rs

//! Fixed-delay periodic driver for [`CycleRunner`].
//!
//! The delay is measured from the end of one cycle to the start of the
//! next, so a slow cycle pushes later cycles back instead of overlapping
//! with them. Cancelling only prevents new cycles; a running cycle is
//! always allowed to finish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::errors::{FailureKind, Result};
use crate::shutdown::ShutdownSignal;

use super::cycle::CycleRunner;

#[derive(Debug)]
pub struct Scheduler {
    runner: Arc<CycleRunner>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(runner: Arc<CycleRunner>, config: SchedulerConfig) -> Self {
        Self { runner, config }
    }

    /// Start the periodic loop on the Tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let stop = ShutdownSignal::new();
        let completed = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(run_loop(
            self.runner,
            self.config,
            stop.clone(),
            Arc::clone(&completed),
        ));

        SchedulerHandle {
            stop,
            task,
            completed,
        }
    }
}

/// Control handle for a spawned [`Scheduler`].
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: ShutdownSignal,
    task: JoinHandle<()>,
    completed: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Prevent any further cycle from starting. Idempotent.
    pub fn cancel(&self) {
        if self.stop.request() {
            info!("scheduler cancelled; no new cycle will start");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.is_requested()
    }

    /// Number of cycles that have run to completion.
    pub fn completed_cycles(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Wait for the loop to exit, i.e. for the in-flight cycle to finish
    /// after [`cancel`](Self::cancel).
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| anyhow::Error::new(e).context("scheduler task failed"))?;
        Ok(())
    }
}

async fn run_loop(
    runner: Arc<CycleRunner>,
    config: SchedulerConfig,
    stop: ShutdownSignal,
    completed: Arc<AtomicU64>,
) {
    info!(
        initial_delay_ms = config.initial_delay.as_millis() as u64,
        period_ms = config.period.as_millis() as u64,
        "scheduler started"
    );

    let mut delay = config.initial_delay;

    loop {
        tokio::select! {
            biased;

            () = stop.wait() => break,
            () = sleep(delay) => {}
        }

        // Each cycle runs in its own task so a panic inside it is caught
        // here instead of killing the loop.
        let cycle_runner = Arc::clone(&runner);
        let joined = tokio::spawn(async move { cycle_runner.run_cycle().await }).await;

        match joined {
            Ok(report) => debug!(?report, "cycle finished"),
            Err(e) => runner.record_failure(FailureKind::Unclassified, &format!("cycle aborted: {e}")),
        }

        completed.fetch_add(1, Ordering::SeqCst);
        delay = config.period;
    }

    info!(
        cycles = completed.load(Ordering::SeqCst),
        "scheduler stopped"
    );
}
