// src/agent.rs

//! Host-facing surface of the agent and the built-in listeners.
//!
//! A host (tray icon, status page, CLI) gets an [`AgentHandle`] to render
//! the activity log, follow status transitions and request a shutdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::client::{ClientSlot, SpoolClient, TaskClient};
use crate::config::ConfigFile;
use crate::engine::StatusChannel;
use crate::fs::FileSystem;
use crate::log_buffer::{LogBuffer, LogEntry};
use crate::shutdown::ShutdownSignal;
use crate::types::AgentStatus;

#[derive(Debug, Clone)]
pub struct AgentHandle {
    log: Arc<LogBuffer>,
    status: StatusChannel,
    shutdown: ShutdownSignal,
}

impl AgentHandle {
    pub fn new(log: Arc<LogBuffer>, status: StatusChannel, shutdown: ShutdownSignal) -> Self {
        Self {
            log,
            status,
            shutdown,
        }
    }

    /// Activity log, newest first.
    pub fn log_snapshot(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    pub fn status(&self) -> AgentStatus {
        self.status.current()
    }

    pub fn subscribe_status(&self) -> tokio::sync::watch::Receiver<AgentStatus> {
        self.status.subscribe()
    }

    /// Ask the agent to stop. Only the first request has an effect.
    pub fn request_shutdown(&self) -> bool {
        self.shutdown.request()
    }
}

/// Build the client described by `config`, if any.
pub fn build_client(config: &ConfigFile, fs: Arc<dyn FileSystem>) -> Option<Arc<dyn TaskClient>> {
    config
        .client
        .as_ref()
        .map(|client| Arc::new(SpoolClient::new(client, fs)) as Arc<dyn TaskClient>)
}

/// Swap the client in `slot` for the one `config` describes.
///
/// Returns whether a client is configured afterwards.
pub fn apply_client_config(
    config: &ConfigFile,
    slot: &ClientSlot,
    fs: Arc<dyn FileSystem>,
    log: &LogBuffer,
) -> bool {
    match build_client(config, fs) {
        Some(client) => {
            slot.install(client);
            if let Some(ref c) = config.client {
                info!(inbox = ?c.inbox, outbox = ?c.outbox, "task client configured");
                log.append(format!(
                    "Task client configured with inbox {:?} and outbox {:?}",
                    c.inbox, c.outbox
                ));
            }
            true
        }
        None => {
            slot.clear();
            warn!("no [client] section; agent stays unconfigured");
            log.append("No task client configured");
            false
        }
    }
}

/// Run the current client's connectivity check. An empty slot fails.
pub async fn check_client(slot: &ClientSlot) -> bool {
    let Some(client) = slot.current() else {
        warn!("no task client configured; nothing to validate");
        return false;
    };
    let ok = client.validate().await;
    info!(ok, "task client validation finished");
    ok
}

/// Listen for Ctrl-C (and SIGTERM on Unix) and turn them into a shutdown
/// request.
pub fn spawn_signal_listener(handle: AgentHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_stop_signal().await;
        if handle.request_shutdown() {
            info!("stop signal received");
        }
    })
}

#[cfg(unix)]
async fn wait_for_stop_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGTERM; only Ctrl-C will stop the agent");
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!(error = %e, "failed to listen for Ctrl-C");
                term.recv().await;
            }
        }
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_stop_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Re-read the config file on SIGHUP and swap in the new client.
///
/// A config that fails to load or validate leaves the current client in
/// place.
#[cfg(unix)]
pub fn spawn_reload_listener(
    config_path: std::path::PathBuf,
    slot: ClientSlot,
    fs: Arc<dyn FileSystem>,
    log: Arc<LogBuffer>,
) -> JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    use crate::config::load_and_validate;

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGHUP; config reload disabled");
                return;
            }
        };

        while hangup.recv().await.is_some() {
            info!(path = ?config_path, "reloading configuration");
            match load_and_validate(&config_path) {
                Ok(config) => {
                    apply_client_config(&config, &slot, Arc::clone(&fs), &log);
                    log.append("Configuration reloaded");
                }
                Err(e) => {
                    error!(error = %e, "configuration reload failed; keeping current client");
                    log.append(format!("Configuration reload failed: {e}"));
                }
            }
        }
    })
}

/// Follow status transitions and log them, the way a tray icon would
/// switch images.
pub fn spawn_status_reporter(handle: AgentHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rx = handle.subscribe_status();
        while rx.changed().await.is_ok() {
            let status = *rx.borrow_and_update();
            match status {
                AgentStatus::Failed => warn!(%status, "agent status"),
                _ => info!(%status, "agent status"),
            }
        }
    })
}
