//! Sequential ingestion queue.
//!
//! One worker task runs submitted jobs strictly one after another against a shared
//! pipeline. Cancellation is checked only between jobs: a running ingestion always
//! finishes. Jobs still queued when the token fires are reported as skipped.

use ghoststream_core::IngestionResult;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::pipeline::{IngestPipeline, IngestRequest};
use crate::progress::ProgressListener;

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub source: PathBuf,
    pub result: IngestionResult,
}

#[derive(Debug, Clone, Default)]
pub struct QueueReport {
    /// One entry per attempted job, in submission order.
    pub completed: Vec<JobOutcome>,
    /// Jobs never started because the queue was cancelled.
    pub skipped: Vec<PathBuf>,
}

impl QueueReport {
    pub fn succeeded(&self) -> usize {
        self.completed.iter().filter(|o| o.result.success).count()
    }

    pub fn failed(&self) -> usize {
        self.completed.len() - self.succeeded()
    }
}

pub struct IngestQueue {
    sender: mpsc::UnboundedSender<IngestRequest>,
    worker: JoinHandle<QueueReport>,
    cancel: CancellationToken,
}

impl IngestQueue {
    /// Spawn the worker. Must be called inside a Tokio runtime.
    pub fn start(
        pipeline: Arc<IngestPipeline>,
        progress: Arc<dyn ProgressListener>,
        cancel: CancellationToken,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(Self::worker(pipeline, progress, receiver, cancel.clone()));
        Self {
            sender,
            worker,
            cancel,
        }
    }

    /// Queue a job. Returns it back if the worker is gone.
    pub fn submit(&self, request: IngestRequest) -> Result<(), IngestRequest> {
        self.sender.send(request).map_err(|e| e.0)
    }

    /// Stop after the job currently running, if any.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Close the queue and wait for every submitted job to be processed or skipped.
    pub async fn finish(self) -> Result<QueueReport, JoinError> {
        drop(self.sender);
        self.worker.await
    }

    /// Run `requests` in order and collect the report.
    pub async fn run_all(
        pipeline: Arc<IngestPipeline>,
        requests: Vec<IngestRequest>,
        progress: Arc<dyn ProgressListener>,
        cancel: CancellationToken,
    ) -> Result<QueueReport, JoinError> {
        let queue = Self::start(pipeline, progress, cancel);
        for request in requests {
            if let Err(request) = queue.submit(request) {
                tracing::error!(source = %request.source.display(), "Queue worker stopped early");
                break;
            }
        }
        queue.finish().await
    }

    async fn worker(
        pipeline: Arc<IngestPipeline>,
        progress: Arc<dyn ProgressListener>,
        mut receiver: mpsc::UnboundedReceiver<IngestRequest>,
        cancel: CancellationToken,
    ) -> QueueReport {
        let mut report = QueueReport::default();

        while let Some(request) = receiver.recv().await {
            if cancel.is_cancelled() {
                tracing::info!(source = %request.source.display(), "Queue cancelled, skipping job");
                report.skipped.push(request.source);
                continue;
            }

            tracing::info!(
                source = %request.source.display(),
                position = report.completed.len() + 1,
                "Starting queued ingestion"
            );
            let result = pipeline.ingest(&request, progress.as_ref()).await;
            report.completed.push(JobOutcome {
                source: request.source,
                result,
            });
        }

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped.len(),
            "Queue drained"
        );
        report
    }
}
