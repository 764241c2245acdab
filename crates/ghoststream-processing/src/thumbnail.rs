//! Thumbnail generator - one still frame per ingestion

use ghoststream_core::constants::{
    OUTPUT_THUMB_NAME, THUMBNAIL_HEIGHT, THUMBNAIL_MAX_SECONDS, THUMBNAIL_MIN_SECONDS,
    THUMBNAIL_POSITION_RATIO, THUMBNAIL_QUALITY,
};
use ghoststream_core::{IngestError, IngestResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::command::{render_command, CommandRunner};
use crate::validator::ValidatedMedia;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub path: PathBuf,
}

#[derive(Clone)]
pub struct ThumbnailGenerator {
    runner: Arc<dyn CommandRunner>,
    ffmpeg_path: String,
}

impl ThumbnailGenerator {
    pub fn new(runner: Arc<dyn CommandRunner>, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            runner,
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    #[tracing::instrument(skip(self, media, workspace), fields(
        process.executable.name = "ffmpeg",
        ffmpeg.operation = "thumbnail"
    ))]
    pub async fn generate(&self, media: &ValidatedMedia, workspace: &Path) -> IngestResult<Thumbnail> {
        let output = workspace.join(OUTPUT_THUMB_NAME);
        let timestamp = capture_timestamp(media.output().duration_seconds);
        let args = thumbnail_args(media.path(), &output, timestamp, media.output().height);
        let command = render_command(&self.ffmpeg_path, &args);

        let result = self
            .runner
            .run(&self.ffmpeg_path, &args)
            .await
            .map_err(|e| IngestError::Thumbnail {
                command: command.clone(),
                stderr: e.to_string(),
            })?;

        if !result.success {
            return Err(IngestError::Thumbnail {
                command,
                stderr: result.stderr,
            });
        }

        // ffmpeg exits 0 without writing when the seek lands past the last frame
        let written = tokio::fs::metadata(&output)
            .await
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false);
        if !written {
            tracing::error!(timestamp, output = %output.display(), "ffmpeg produced no thumbnail");
            let stderr = if result.stderr.trim().is_empty() {
                format!("No frame written at {:.2}s", timestamp)
            } else {
                result.stderr
            };
            return Err(IngestError::Thumbnail { command, stderr });
        }

        tracing::info!(timestamp, output = %output.display(), "Thumbnail captured");
        Ok(Thumbnail { path: output })
    }
}

/// 10% into the video, clamped to [0.5 s, 5 s].
pub fn capture_timestamp(duration_seconds: f64) -> f64 {
    (duration_seconds * THUMBNAIL_POSITION_RATIO).clamp(THUMBNAIL_MIN_SECONDS, THUMBNAIL_MAX_SECONDS)
}

/// Single-frame capture, downscaled to 360p only when the video is taller.
pub fn thumbnail_args(source: &Path, output: &Path, timestamp: f64, height: u32) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-ss".to_string(),
        format!("{:.2}", timestamp),
        "-i".to_string(),
        source.to_string_lossy().into_owned(),
        "-vframes".to_string(),
        "1".to_string(),
        "-q:v".to_string(),
        THUMBNAIL_QUALITY.to_string(),
    ];
    if height > THUMBNAIL_HEIGHT {
        args.extend(["-vf".to_string(), format!("scale=-2:{}", THUMBNAIL_HEIGHT)]);
    }
    args.push(output.to_string_lossy().into_owned());
    args
}
