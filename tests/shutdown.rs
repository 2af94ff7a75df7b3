// tests/shutdown.rs

mod common;

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use xbot::agent::AgentHandle;
use xbot::client::ClientSlot;
use xbot::engine::{CycleRunner, Scheduler, StatusChannel};
use xbot::log_buffer::LogBuffer;
use xbot::shutdown::{ShutdownCoordinator, ShutdownSignal};
use xbot::types::AgentStatus;

use crate::common::builders::{fast_schedule, TaskBuilder};
use crate::common::{init_tracing, messages, wait_until, with_timeout, FakeClient, FakeExecutor};

type TestResult = Result<(), Box<dyn Error>>;

fn runner(client: &FakeClient, executor: &FakeExecutor, log: &Arc<LogBuffer>) -> Arc<CycleRunner> {
    Arc::new(CycleRunner::new(
        ClientSlot::with_client(Arc::new(client.clone())),
        Arc::new(executor.clone()),
        Arc::clone(log),
        StatusChannel::new(AgentStatus::Idle),
    ))
}

/// Sets its flag when dropped, i.e. when the owning task is aborted.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn idle_listener(flag: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let _guard = DropFlag(flag);
        std::future::pending::<()>().await;
    })
}

#[tokio::test]
async fn request_before_wait_is_not_lost() -> TestResult {
    let signal = ShutdownSignal::new();
    assert!(signal.request());

    with_timeout(signal.wait()).await;
    assert!(signal.is_requested());
    Ok(())
}

#[tokio::test]
async fn only_the_first_request_counts() -> TestResult {
    let signal = ShutdownSignal::new();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let signal = signal.clone();
            tokio::spawn(async move { signal.request() })
        })
        .collect();

    let mut winners = 0;
    for h in handles {
        if h.await? {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert!(!signal.request());
    Ok(())
}

#[tokio::test]
async fn waiters_registered_before_the_request_are_woken() -> TestResult {
    let signal = ShutdownSignal::new();
    let waiter = {
        let signal = signal.clone();
        tokio::spawn(async move { signal.wait().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    signal.request();
    with_timeout(waiter).await?;
    Ok(())
}

#[tokio::test]
async fn shutdown_waits_for_the_in_flight_cycle_to_report() -> TestResult {
    init_tracing();
    let log = Arc::new(LogBuffer::new(100));
    let client = FakeClient::new().with_task(TaskBuilder::new("inflight", "true").build());
    let executor = FakeExecutor::new().gated();
    let scheduler = Scheduler::new(runner(&client, &executor, &log), fast_schedule(10)).spawn();

    with_timeout(executor.wait_started()).await;

    let listener_stopped = Arc::new(AtomicBool::new(false));
    let mut coordinator = ShutdownCoordinator::new();
    coordinator.register_listener("idle", idle_listener(Arc::clone(&listener_stopped)));
    let signal = coordinator.signal();

    let shutdown = {
        let log = Arc::clone(&log);
        tokio::spawn(async move { coordinator.run(scheduler, &log).await })
    };

    signal.request();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Listeners are stopped first, but the cycle is still running.
    assert!(listener_stopped.load(Ordering::SeqCst));
    assert!(!shutdown.is_finished());
    assert!(client.uploads().is_empty());

    executor.release();
    with_timeout(shutdown).await??;

    assert_eq!(client.uploads().len(), 1);
    assert_eq!(client.uploads()[0].instance_id, "inflight");

    let log = messages(&log);
    assert_eq!(log[0], "Agent stopped");
    let uploaded = log
        .iter()
        .position(|m| m == "Finished uploading task results [fake://inflight].")
        .expect("upload logged");
    let requested = log
        .iter()
        .position(|m| m == "Shutdown requested")
        .expect("request logged");
    // Newest first: the upload finished after the request was logged.
    assert!(uploaded < requested);
    Ok(())
}

#[tokio::test]
async fn shutdown_between_cycles_starts_no_new_cycle() -> TestResult {
    init_tracing();
    let log = Arc::new(LogBuffer::new(100));
    let client = FakeClient::new();
    let executor = FakeExecutor::new();
    let scheduler = Scheduler::new(
        runner(&client, &executor, &log),
        xbot::config::SchedulerConfig {
            initial_delay: Duration::ZERO,
            period: Duration::from_secs(60),
        },
    )
    .spawn();

    wait_until(|| client.polls() == 1).await;

    let coordinator = ShutdownCoordinator::new();
    let status = StatusChannel::new(AgentStatus::Idle);
    let handle = AgentHandle::new(Arc::clone(&log), status, coordinator.signal());

    assert!(handle.request_shutdown());
    assert!(!handle.request_shutdown());

    with_timeout(coordinator.run(scheduler, &log)).await?;

    assert_eq!(client.polls(), 1);
    assert_eq!(handle.log_snapshot()[0].message, "Agent stopped");
    Ok(())
}
