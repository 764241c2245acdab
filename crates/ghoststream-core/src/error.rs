//! Error types module
//!
//! Every failure that can end an ingestion is an [`IngestError`]. All variants are
//! terminal for the current ingestion; the core never retries. Retry policy, if any,
//! belongs to whatever drives the pipeline.
//!
//! Process-driven variants carry the rendered command line and the captured
//! diagnostic stream so a failure can be reproduced by hand.

use std::io;
use std::path::PathBuf;

use crate::models::Stage;

/// Which spatial dimension broke the no-upscale invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Width => write!(f, "width"),
            Dimension::Height => write!(f, "height"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Probe failed: {message}")]
    Probe { message: String },

    #[error("Transcode failed: `{command}`\n\nSTDERR:\n{stderr}")]
    Transcode { command: String, stderr: String },

    #[error("NO-UPSCALE violated: output {dimension} {output} > input {dimension} {input}")]
    UpscaleViolation {
        dimension: Dimension,
        output: u32,
        input: u32,
    },

    #[error("Output {stream} codec not {expected}: {found}")]
    CodecViolation {
        stream: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Output container not MP4/MOV: {found}")]
    ContainerViolation { found: String },

    #[error("Thumbnail capture failed: `{command}`\n\nSTDERR:\n{stderr}")]
    Thumbnail { command: String, stderr: String },

    #[error("Key configuration error: {0}")]
    KeyConfiguration(String),

    #[error("No valid tags provided after normalization")]
    NoValidTags,

    #[error("Storage error for key {key}: {message}")]
    Storage { key: String, message: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid title envelope: {0}")]
    Envelope(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    /// Machine-readable error code, stable across releases.
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestError::Probe { .. } => "PROBE_ERROR",
            IngestError::Transcode { .. } => "TRANSCODE_ERROR",
            IngestError::UpscaleViolation { .. } => "UPSCALE_VIOLATION",
            IngestError::CodecViolation { .. } => "CODEC_VIOLATION",
            IngestError::ContainerViolation { .. } => "CONTAINER_VIOLATION",
            IngestError::Thumbnail { .. } => "THUMBNAIL_ERROR",
            IngestError::KeyConfiguration(_) => "KEY_CONFIGURATION_ERROR",
            IngestError::NoValidTags => "NO_VALID_TAGS",
            IngestError::Storage { .. } => "STORAGE_ERROR",
            IngestError::Catalog(_) => "CATALOG_ERROR",
            IngestError::Envelope(_) => "ENVELOPE_ERROR",
            IngestError::Config(_) => "CONFIG_ERROR",
            IngestError::Io { .. } => "IO_ERROR",
        }
    }

    /// Pipeline stage this kind of error originates from.
    ///
    /// `Io` can happen while preparing the workspace or reading artifacts, so it is
    /// attributed to the stage that touches the filesystem first.
    pub fn stage(&self) -> Stage {
        match self {
            IngestError::Probe { .. } | IngestError::Config(_) => Stage::Probing,
            IngestError::Transcode { .. } | IngestError::Io { .. } => Stage::Transcoding,
            IngestError::UpscaleViolation { .. }
            | IngestError::CodecViolation { .. }
            | IngestError::ContainerViolation { .. } => Stage::Validating,
            IngestError::Thumbnail { .. } => Stage::Thumbnailing,
            IngestError::KeyConfiguration(_)
            | IngestError::NoValidTags
            | IngestError::Envelope(_) => Stage::Protecting,
            IngestError::Storage { .. } => Stage::Uploading,
            IngestError::Catalog(_) => Stage::Committing,
        }
    }

    pub fn probe(message: impl Into<String>) -> Self {
        IngestError::Probe {
            message: message.into(),
        }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
