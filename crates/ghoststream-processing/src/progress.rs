//! Stage transition notifications.

use ghoststream_core::{IngestionPlan, ProbeResult, Stage};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Emitted after every state transition of one ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub source: PathBuf,
    pub stage: Stage,
    pub percent: u8,
    /// Error description when `stage` is `Failed`.
    pub message: Option<String>,
}

impl ProgressEvent {
    pub fn new(source: PathBuf, stage: Stage) -> Self {
        Self {
            source,
            stage,
            percent: stage.percent(),
            message: None,
        }
    }

    pub fn failed(source: PathBuf, message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::new(source, Stage::Failed)
        }
    }
}

/// Receives stage transitions. Must not block.
pub trait ProgressListener: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);

    /// Called once the plan is known, before transcoding starts.
    fn on_plan(&self, _source: &Path, _probe: &ProbeResult, _plan: &IngestionPlan) {}
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressListener for NoopProgress {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressListener for TracingProgress {
    fn on_event(&self, event: &ProgressEvent) {
        match &event.message {
            Some(message) => tracing::warn!(
                source = %event.source.display(),
                stage = %event.stage,
                percent = event.percent,
                error = %message,
                "Ingestion failed"
            ),
            None => tracing::info!(
                source = %event.source.display(),
                stage = %event.stage,
                percent = event.percent,
                "Ingestion stage"
            ),
        }
    }
}

/// Forwards events to a channel; a closed receiver is ignored.
impl ProgressListener for mpsc::UnboundedSender<ProgressEvent> {
    fn on_event(&self, event: &ProgressEvent) {
        let _ = self.send(event.clone());
    }
}
