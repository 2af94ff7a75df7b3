use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use xbot::client::{ClientFuture, TaskClient};
use xbot::errors::ClientError;
use xbot::types::{Task, TaskResult};

/// Scripted task client.
///
/// - `next_task` pops scripted responses; once the script is exhausted the
///   queue is reported empty.
/// - `upload_result` records results and answers with a location reference
///   (`fake://<instance_id>`), optionally after a delay or with an error.
/// - Detects a poll that arrives while an upload is still in progress.
#[derive(Clone, Default)]
pub struct FakeClient {
    responses: Arc<Mutex<VecDeque<Result<Option<Task>, ClientError>>>>,
    upload_error: Arc<Mutex<Option<ClientError>>>,
    upload_delay: Duration,
    uploads: Arc<Mutex<Vec<TaskResult>>>,
    polls: Arc<AtomicUsize>,
    poll_times: Arc<Mutex<Vec<Instant>>>,
    upload_done_times: Arc<Mutex<Vec<Instant>>>,
    uploading: Arc<AtomicBool>,
    overlap: Arc<AtomicBool>,
    valid: bool,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    pub fn with_task(self, task: Task) -> Self {
        self.responses.lock().unwrap().push_back(Ok(Some(task)));
        self
    }

    pub fn with_empty_poll(self) -> Self {
        self.responses.lock().unwrap().push_back(Ok(None));
        self
    }

    pub fn with_poll_error(self, err: ClientError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_upload_error(self, err: ClientError) -> Self {
        *self.upload_error.lock().unwrap() = Some(err);
        self
    }

    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    pub fn uploads(&self) -> Vec<TaskResult> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// When each `next_task` call started.
    pub fn poll_times(&self) -> Vec<Instant> {
        self.poll_times.lock().unwrap().clone()
    }

    /// When each `upload_result` call returned, successful or not.
    pub fn upload_done_times(&self) -> Vec<Instant> {
        self.upload_done_times.lock().unwrap().clone()
    }

    /// True if `next_task` was ever called while an upload was running.
    pub fn saw_overlap(&self) -> bool {
        self.overlap.load(Ordering::SeqCst)
    }
}

impl TaskClient for FakeClient {
    fn next_task(&self) -> ClientFuture<'_, Result<Option<Task>, ClientError>> {
        Box::pin(async move {
            if self.uploading.load(Ordering::SeqCst) {
                self.overlap.store(true, Ordering::SeqCst);
            }
            self.poll_times.lock().unwrap().push(Instant::now());
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
        })
    }

    fn upload_result(&self, result: TaskResult) -> ClientFuture<'_, Result<String, ClientError>> {
        Box::pin(async move {
            self.uploading.store(true, Ordering::SeqCst);
            if !self.upload_delay.is_zero() {
                tokio::time::sleep(self.upload_delay).await;
            }
            let failure = self.upload_error.lock().unwrap().clone();
            let reply = match failure {
                Some(err) => Err(err),
                None => {
                    let location = format!("fake://{}", result.instance_id);
                    self.uploads.lock().unwrap().push(result);
                    Ok(location)
                }
            };
            self.upload_done_times.lock().unwrap().push(Instant::now());
            self.uploading.store(false, Ordering::SeqCst);
            reply
        })
    }

    fn validate(&self) -> ClientFuture<'_, bool> {
        Box::pin(async move { self.valid })
    }
}
