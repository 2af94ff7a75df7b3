// src/lib.rs

pub mod agent;
pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod log_buffer;
pub mod logging;
pub mod shutdown;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::agent::{
    apply_client_config, check_client, spawn_signal_listener, spawn_status_reporter, AgentHandle,
};
use crate::cli::CliArgs;
use crate::client::ClientSlot;
use crate::config::{default_config_path, load_and_validate, load_or_default, ConfigFile};
use crate::engine::{CycleRunner, Scheduler, StatusChannel};
use crate::exec::ProcessExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::log_buffer::LogBuffer;
use crate::shutdown::ShutdownCoordinator;
use crate::types::AgentStatus;

/// Version reported in the activity log.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - activity log, status channel and task client
/// - process executor and cycle runner
/// - scheduler
/// - listeners and the shutdown coordinator
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    // An explicit --config must exist; the default location may not.
    let cfg = if args.config.is_some() {
        load_and_validate(&config_path)
    } else {
        load_or_default(&config_path)
    }
    .with_context(|| format!("loading config from {:?}", config_path))?;

    if args.dry_run {
        print_dry_run(&config_path, &cfg);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let log = Arc::new(LogBuffer::new(cfg.log.capacity));
    log.append(format!("Running version {VERSION}"));
    info!(version = VERSION, config = ?config_path, "xbot starting");

    let clients = ClientSlot::new();
    let configured = apply_client_config(&cfg, &clients, Arc::clone(&fs), &log);

    if args.validate {
        return validate_connection(&clients).await;
    }

    let status = StatusChannel::new(if configured {
        AgentStatus::Idle
    } else {
        AgentStatus::NotConfigured
    });

    let executor = Arc::new(ProcessExecutor::new(Arc::clone(&log), Arc::clone(&fs)));
    let runner = Arc::new(CycleRunner::new(
        clients.clone(),
        executor,
        Arc::clone(&log),
        status.clone(),
    ));

    if args.once {
        let report = runner.run_cycle().await;
        info!(?report, "single cycle finished");
        return Ok(());
    }

    let mut coordinator = ShutdownCoordinator::new();
    let handle = AgentHandle::new(Arc::clone(&log), status, coordinator.signal());

    coordinator.register_listener("signals", spawn_signal_listener(handle.clone()));
    coordinator.register_listener("status", spawn_status_reporter(handle.clone()));
    #[cfg(unix)]
    coordinator.register_listener(
        "config-reload",
        crate::agent::spawn_reload_listener(
            config_path.clone(),
            clients.clone(),
            Arc::clone(&fs),
            Arc::clone(&log),
        ),
    );

    let scheduler = Scheduler::new(runner, cfg.scheduler).spawn();

    coordinator.run(scheduler, &log).await?;
    Ok(())
}

async fn validate_connection(clients: &ClientSlot) -> Result<()> {
    let ok = check_client(clients).await;
    println!("Connection status: {}", if ok { "OK" } else { "FAILED" });
    if ok {
        Ok(())
    } else {
        anyhow::bail!("task client validation failed")
    }
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(config_path: &std::path::Path, cfg: &ConfigFile) {
    println!("xbot dry-run");
    println!("  config = {}", config_path.display());
    println!("  scheduler.initial_delay = {:?}", cfg.scheduler.initial_delay);
    println!("  scheduler.period = {:?}", cfg.scheduler.period);
    println!("  log.capacity = {}", cfg.log.capacity);
    match cfg.client {
        Some(ref client) => {
            println!("  client.inbox = {}", client.inbox.display());
            println!("  client.outbox = {}", client.outbox.display());
        }
        None => println!("  client = (not configured)"),
    }

    debug!("dry-run complete (no polling)");
}
