// src/engine/status.rs

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::types::AgentStatus;

/// Publishes [`AgentStatus`] transitions to the host.
///
/// Receivers are only woken on an actual change.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    tx: Arc<watch::Sender<AgentStatus>>,
}

impl StatusChannel {
    pub fn new(initial: AgentStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Set the current status; returns whether it changed.
    pub fn set(&self, status: AgentStatus) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            debug!(%status, "agent status changed");
        }
        changed
    }

    pub fn current(&self) -> AgentStatus {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AgentStatus> {
        self.tx.subscribe()
    }
}
