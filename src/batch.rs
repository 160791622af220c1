//! Batch processing on a bounded worker pool
//!
//! Every item runs on the blocking pool, at most `workers` at a time. Results
//! are tagged with their submission index and reassembled in that order, so
//! completion order never leaks into the output. A failed or timed out item
//! is recorded and the rest of the batch carries on.

use crate::{
    error::{Result, StudioError},
    processor::{BackgroundReplacementProcessor, ProcessedImage},
    services::{ArchiveService, BatchProgress, ImageIOService},
};
use instant::Instant;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, error, info, warn};

/// One unit of batch work
#[derive(Debug, Clone)]
pub enum BatchInput {
    /// Encoded image bytes with a display name
    Bytes { name: String, bytes: Vec<u8> },
    /// Image file read by the worker
    File(PathBuf),
}

impl BatchInput {
    #[must_use]
    pub fn bytes<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        Self::Bytes {
            name: name.into(),
            bytes,
        }
    }

    /// Display name used in reports
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Bytes { name, .. } => name.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }

    fn process(&self, processor: &BackgroundReplacementProcessor, index: usize) -> Result<ProcessedImage> {
        match self {
            Self::Bytes { bytes, .. } => processor.process_bytes(bytes, index),
            Self::File(path) => processor.process_file(path, index),
        }
    }
}

/// A successfully processed item
#[derive(Debug, Clone, Serialize)]
pub struct BatchSuccess {
    /// Input display name
    pub source: String,
    #[serde(flatten)]
    pub image: ProcessedImage,
}

/// A failed item
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// Submission index
    pub index: usize,
    /// Input display name
    pub source: String,
    /// Error message
    pub message: String,
    /// Whether retrying the item may succeed
    pub retryable: bool,
}

/// Result of a whole batch, both lists in submission order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub successes: Vec<BatchSuccess>,
    pub failures: Vec<BatchFailure>,
    /// Wall-clock time for the whole batch
    pub total_ms: u64,
}

impl BatchOutcome {
    /// Number of items submitted
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Processed images in submission order
    pub fn images(&self) -> impl Iterator<Item = &ProcessedImage> {
        self.successes.iter().map(|success| &success.image)
    }

    /// ZIP archive of every successful output
    pub fn archive_bytes(&self) -> Result<Vec<u8>> {
        ArchiveService::to_bytes(
            self.images()
                .map(|image| (image.file_name.as_str(), image.data.as_slice())),
        )
    }

    /// Write a ZIP archive of every successful output
    pub fn write_archive<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ArchiveService::write_to_path(
            path,
            self.images()
                .map(|image| (image.file_name.as_str(), image.data.as_slice())),
        )
    }

    /// Save every successful output into `dir`
    pub fn save_all<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        self.images().map(|image| image.save_to(dir.as_ref())).collect()
    }

    /// Write a JSON manifest of the batch (image bytes excluded)
    pub fn write_report<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(|e| {
            StudioError::processing_stage_error("report", &e.to_string(), None)
        })?;
        ImageIOService::save_bytes(&json, path)
    }

    /// Log a one-line summary plus each failure
    pub fn log_summary(&self) {
        info!(
            total = self.total(),
            succeeded = self.successes.len(),
            failed = self.failures.len(),
            total_ms = self.total_ms,
            "Batch complete"
        );
        for failure in &self.failures {
            warn!(
                index = failure.index,
                source = %failure.source,
                retryable = failure.retryable,
                "{}",
                failure.message
            );
        }
    }
}

/// Process every input on the processor's worker pool
///
/// Never fails as a whole: per-item errors, panics and timeouts land in
/// [`BatchOutcome::failures`].
pub async fn process_batch(
    processor: Arc<BackgroundReplacementProcessor>,
    inputs: Vec<BatchInput>,
) -> BatchOutcome {
    let batch_start = Instant::now();
    let total = inputs.len();
    let workers = processor.config().workers().max(1);
    let timeout = processor.config().item_timeout();
    let semaphore = Arc::new(Semaphore::new(workers));
    info!(items = total, workers, ?timeout, "Starting batch");

    let names: Vec<String> = inputs.iter().map(BatchInput::name).collect();
    let mut tasks = JoinSet::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let processor = Arc::clone(&processor);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let result = run_item(processor, semaphore, input, index, timeout).await;
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<ProcessedImage>>> = (0..total).map(|_| None).collect();
    let mut progress = BatchProgress {
        completed: 0,
        failed: 0,
        total,
    };
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                if let Err(e) = &result {
                    debug!(index, error = %e, "Item failed");
                    progress.failed += 1;
                }
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(result);
                }
            },
            Err(e) => {
                error!("Batch task aborted: {}", e);
                progress.failed += 1;
            },
        }
        progress.completed += 1;
        processor.reporter().report_batch_progress(progress);
    }

    let mut outcome = BatchOutcome::default();
    for (index, (slot, source)) in slots.into_iter().zip(names).enumerate() {
        match slot {
            Some(Ok(image)) => outcome.successes.push(BatchSuccess { source, image }),
            Some(Err(e)) => outcome.failures.push(BatchFailure {
                index,
                source,
                retryable: e.is_retryable(),
                message: e.to_string(),
            }),
            None => outcome.failures.push(BatchFailure {
                index,
                source,
                message: "task aborted before producing a result".to_string(),
                retryable: true,
            }),
        }
    }
    outcome.total_ms = batch_start.elapsed().as_millis() as u64;
    outcome
}

async fn run_item(
    processor: Arc<BackgroundReplacementProcessor>,
    semaphore: Arc<Semaphore>,
    input: BatchInput,
    index: usize,
    timeout: Option<Duration>,
) -> Result<ProcessedImage> {
    let permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| StudioError::processing_stage_error("scheduling", &e.to_string(), None))?;

    // The permit travels with the blocking work so a timed-out item keeps
    // its worker slot until the thread actually finishes.
    let work = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        input.process(&processor, index)
    });
    let joined = match timeout {
        // The blocking thread cannot be cancelled; its result is discarded.
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| StudioError::Timeout(limit))?,
        None => work.await,
    };

    joined.map_err(|e| {
        StudioError::processing_stage_error("worker", &format!("item panicked or was cancelled: {}", e), None)
    })?
}
