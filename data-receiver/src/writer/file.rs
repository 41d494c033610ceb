//! File-backed writer.
//!
//! The file is opened in append mode at construction. A background task owns
//! the file handle and appends every message it receives from a bounded
//! channel of capacity one, so `write` waits whenever the task falls behind
//! and messages land in the file in hand-off order.
//!
//! `close` drops the sending side, lets the task drain what is left, and waits
//! for it to finish (bounded by a timeout).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::Writer;
use crate::error::ReceiverError;
use crate::services::Parameters;

/// Parameter naming the target file.
pub const FILEPATH_PARAM: &str = "filepath";
/// Optional parameter overriding the close timeout, in milliseconds.
pub const CLOSE_TIMEOUT_PARAM: &str = "close_timeout_ms";

pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Appends messages to a file through a private background task.
pub struct FileWriter {
    path: PathBuf,
    sender: Mutex<Option<mpsc::Sender<String>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    bytes_written: Arc<AtomicU64>,
    close_timeout: Duration,
}

impl FileWriter {
    /// Open (create or append) `path` and start the append task.
    pub async fn open(path: impl AsRef<Path>, close_timeout: Duration) -> Result<Self, ReceiverError> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let (sender, receiver) = mpsc::channel(1);
        let bytes_written = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(append_loop(
            file,
            receiver,
            Arc::clone(&bytes_written),
            path.clone(),
        ));

        info!(path = %path.display(), "file_writer_started");

        Ok(Self {
            path,
            sender: Mutex::new(Some(sender)),
            task: Mutex::new(Some(task)),
            bytes_written,
            close_timeout,
        })
    }

    /// Build from `filepath` and optional `close_timeout_ms` parameters.
    pub async fn from_params(params: &Parameters) -> Result<Self, ReceiverError> {
        let path = params
            .get(FILEPATH_PARAM)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                ReceiverError::Config(format!("{FILEPATH_PARAM} not received for FileWriter"))
            })?;

        let close_timeout = match params.get(CLOSE_TIMEOUT_PARAM) {
            Some(raw) => raw.parse().map(Duration::from_millis).map_err(|_| {
                ReceiverError::Config(format!("invalid {CLOSE_TIMEOUT_PARAM}: {raw:?}"))
            })?,
            None => DEFAULT_CLOSE_TIMEOUT,
        };

        Self::open(path, close_timeout).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total bytes appended so far, newlines included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Writer for FileWriter {
    async fn write(&self, content: String) -> Result<(), ReceiverError> {
        let sender = self
            .sender
            .lock()
            .await
            .clone()
            .ok_or(ReceiverError::WriterClosed)?;

        sender
            .send(content)
            .await
            .map_err(|_| ReceiverError::WriterClosed)
    }

    async fn close(&self) {
        info!(path = %self.path.display(), "file_writer_closing");

        // Dropping the last sender ends the append loop once it has drained.
        self.sender.lock().await.take();

        let Some(task) = self.task.lock().await.take() else {
            return;
        };

        match tokio::time::timeout(self.close_timeout, task).await {
            Ok(Ok(())) => info!(
                path = %self.path.display(),
                bytes_written = self.bytes_written(),
                "file_writer_closed"
            ),
            Ok(Err(e)) => error!(path = %self.path.display(), error = %e, "file_writer_task_failed"),
            Err(_) => warn!(
                path = %self.path.display(),
                timeout_ms = self.close_timeout.as_millis() as u64,
                "file_writer_close_timed_out"
            ),
        }
    }
}

/// Append every received message, adding a trailing newline where missing.
///
/// A failed append is logged and skipped so the loop keeps draining.
async fn append_loop(
    mut file: File,
    mut receiver: mpsc::Receiver<String>,
    bytes_written: Arc<AtomicU64>,
    path: PathBuf,
) {
    while let Some(mut message) = receiver.recv().await {
        if !message.ends_with('\n') {
            message.push('\n');
        }

        // Flush per message so a failure is reported against this message
        // rather than surfacing on the next write.
        let appended = match file.write_all(message.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        match appended {
            Ok(()) => {
                bytes_written.fetch_add(message.len() as u64, Ordering::Relaxed);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "file_writer_append_failed");
            }
        }
    }

    if let Err(e) = file.flush().await {
        error!(path = %path.display(), error = %e, "file_writer_flush_failed");
    }
}
