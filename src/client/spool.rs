// src/client/spool.rs

//! Spool-directory task queue.
//!
//! Tasks are TOML files dropped into an inbox directory; results are
//! written as TOML files into an outbox directory. Lets the agent run end
//! to end on a single machine, and is what `xbot.toml`'s `[client]` section
//! configures.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::{ClientFuture, TaskClient};
use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::fs::FileSystem;
use crate::types::{Task, TaskResult};

const TASK_EXTENSION: &str = "toml";
const REJECTED_EXTENSION: &str = "rejected";
const RESULT_SUFFIX: &str = ".result.toml";

#[derive(Debug, Clone)]
pub struct SpoolClient {
    inbox: PathBuf,
    outbox: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl SpoolClient {
    pub fn new(config: &ClientConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            inbox: config.inbox.clone(),
            outbox: config.outbox.clone(),
            fs,
        }
    }

    /// Task files waiting in the inbox, in the order they will be served.
    pub fn pending(&self) -> Result<Vec<PathBuf>, ClientError> {
        if !self.fs.is_dir(&self.inbox) {
            return Err(ClientError::Communication(format!(
                "inbox {:?} is not a directory",
                self.inbox
            )));
        }

        let mut files: Vec<PathBuf> = self
            .fs
            .read_dir(&self.inbox)
            .map_err(|e| ClientError::Communication(format!("{e:#}")))?
            .into_iter()
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == TASK_EXTENSION) && self.fs.is_file(path)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn claim_next(&self) -> Result<Option<Task>, ClientError> {
        let Some(path) = self.pending()?.into_iter().next() else {
            return Ok(None);
        };

        let parsed = self
            .fs
            .read_to_string(&path)
            .map_err(|e| format!("{e:#}"))
            .and_then(|contents| {
                toml::from_str::<Task>(&contents)
                    .map_err(|e| format!("parsing task file {:?}: {}", path, e))
            })
            .and_then(|task| task.validate().map(|()| task));

        match parsed {
            Ok(task) => {
                self.fs
                    .remove_file(&path)
                    .map_err(|e| ClientError::Communication(format!("{e:#}")))?;
                info!(instance_id = %task.instance_id, file = ?path, "claimed spooled task");
                Ok(Some(task))
            }
            Err(reason) => {
                let rejected = path.with_extension(REJECTED_EXTENSION);
                if let Err(e) = self.fs.rename(&path, &rejected) {
                    warn!(file = ?path, error = %e, "failed to set rejected task file aside");
                }
                Err(ClientError::Communication(format!(
                    "rejected task file {:?}: {}",
                    path, reason
                )))
            }
        }
    }

    fn store_result(&self, result: &TaskResult) -> Result<String, ClientError> {
        let body = toml::to_string(result)
            .map_err(|e| ClientError::Communication(format!("encoding result: {e}")))?;
        let path = self
            .outbox
            .join(format!("{}{}", file_stem_for(&result.instance_id), RESULT_SUFFIX));

        self.fs
            .write(&path, body.as_bytes())
            .map_err(|e| ClientError::Communication(format!("{e:#}")))?;

        debug!(instance_id = %result.instance_id, file = ?path, "stored task result");
        Ok(path.display().to_string())
    }
}

impl TaskClient for SpoolClient {
    fn next_task(&self) -> ClientFuture<'_, Result<Option<Task>, ClientError>> {
        Box::pin(async move { self.claim_next() })
    }

    fn upload_result(&self, result: TaskResult) -> ClientFuture<'_, Result<String, ClientError>> {
        Box::pin(async move { self.store_result(&result) })
    }

    fn validate(&self) -> ClientFuture<'_, bool> {
        Box::pin(async move { self.fs.is_dir(&self.inbox) && self.fs.is_dir(&self.outbox) })
    }
}

/// Hex digits of the id hash kept in result file names.
const ID_HASH_LEN: usize = 16;

/// File stem for a result: the id with unsafe characters replaced, plus a
/// hash of the raw id so distinct ids never share a file.
fn file_stem_for(instance_id: &str) -> String {
    let readable: String = instance_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let hash = blake3::hash(instance_id.as_bytes()).to_hex();
    format!("{readable}-{}", &hash.as_str()[..ID_HASH_LEN])
}
