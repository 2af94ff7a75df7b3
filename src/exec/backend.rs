// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The cycle runner talks to a `TaskExecutor` instead of spawning processes
//! itself. Production code uses [`ProcessExecutor`]; tests can provide an
//! implementation that returns canned [`Execution`]s, optionally after a
//! delay, without touching the OS.

use std::future::Future;
use std::pin::Pin;

use crate::types::Task;

use super::process::{Execution, ProcessExecutor};

/// Trait abstracting how a fetched task is executed.
pub trait TaskExecutor: Send + Sync {
    /// Run `task` and report how it ended.
    ///
    /// Implementations never fail: launch failures and timeouts are part of
    /// the returned [`Execution`].
    fn execute<'a>(
        &'a self,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Execution> + Send + 'a>>;
}

impl TaskExecutor for ProcessExecutor {
    fn execute<'a>(
        &'a self,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Execution> + Send + 'a>> {
        Box::pin(ProcessExecutor::execute(self, task))
    }
}
