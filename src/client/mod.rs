// src/client/mod.rs

//! Contract with the remote task queue.
//!
//! The agent core only depends on [`TaskClient`]. Which implementation is
//! active can change at runtime (configuration reload), so the current one
//! lives in a [`ClientSlot`] that is swapped atomically; a cycle grabs the
//! current client once and keeps it until the cycle ends.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use crate::errors::ClientError;
use crate::types::{Task, TaskResult};

pub mod spool;

pub use spool::SpoolClient;

/// Boxed future returned by [`TaskClient`] methods.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait TaskClient: Send + Sync {
    /// Fetch the next task, or `None` when the queue is empty.
    fn next_task(&self) -> ClientFuture<'_, Result<Option<Task>, ClientError>>;

    /// Report a result; returns a reference to where it was stored.
    fn upload_result(&self, result: TaskResult) -> ClientFuture<'_, Result<String, ClientError>>;

    /// Connectivity / credential check. Not used on the polling path.
    fn validate(&self) -> ClientFuture<'_, bool>;
}

/// Holder for the currently configured client, if any.
#[derive(Clone, Default)]
pub struct ClientSlot {
    current: Arc<RwLock<Option<Arc<dyn TaskClient>>>>,
}

impl ClientSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Arc<dyn TaskClient>) -> Self {
        let slot = Self::new();
        slot.install(client);
        slot
    }

    /// Replace the current client; returns the previous one.
    pub fn install(&self, client: Arc<dyn TaskClient>) -> Option<Arc<dyn TaskClient>> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(client)
    }

    pub fn clear(&self) -> Option<Arc<dyn TaskClient>> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn current(&self) -> Option<Arc<dyn TaskClient>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_configured(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for ClientSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSlot")
            .field("configured", &self.is_configured())
            .finish()
    }
}
