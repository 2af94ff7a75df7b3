// src/exec/artifacts.rs

//! Selection of result artifacts after a task process completed.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;
use tracing::warn;

use crate::fs::FileSystem;

/// Pick the artifact files for `results_path`.
///
/// - Directory: regular files only, sorted by modification time ascending;
///   when there are more than `max_files`, the first `max_files` are kept.
///   NOTE: this keeps the *oldest* files, which is the queue's historical
///   contract; `tests/artifacts.rs` pins it.
/// - Single file: that file.
/// - Anything else (missing, empty path): `None`.
pub fn select_artifacts(
    fs: &dyn FileSystem,
    results_path: &str,
    max_files: usize,
) -> Result<Option<Vec<PathBuf>>> {
    if results_path.is_empty() {
        return Ok(None);
    }

    let path = Path::new(results_path);

    if fs.is_dir(path) {
        let mut files: Vec<(SystemTime, PathBuf)> = fs
            .read_dir(path)?
            .into_iter()
            .filter(|entry| fs.is_file(entry))
            .map(|entry| {
                let modified = fs.modified(&entry).unwrap_or_else(|e| {
                    warn!(file = ?entry, error = %e, "cannot read modification time; treating as epoch");
                    SystemTime::UNIX_EPOCH
                });
                (modified, entry)
            })
            .collect();

        // Ties fall back to the path so the order is deterministic.
        files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        if files.len() > max_files {
            files.truncate(max_files);
        }

        Ok(Some(files.into_iter().map(|(_, path)| path).collect()))
    } else if fs.is_file(path) {
        Ok(Some(vec![path.to_path_buf()]))
    } else {
        Ok(None)
    }
}
