//! Transcode engine - remux or re-encode into the delivered MP4 profile

use ghoststream_core::constants::{
    AUDIO_BITRATE, AUDIO_ENCODER, FASTSTART_FLAGS, OUTPUT_VIDEO_NAME, PIXEL_FORMAT, VIDEO_CRF,
    VIDEO_ENCODER, VIDEO_PRESET,
};
use ghoststream_core::{IngestError, IngestResult, IngestionPlan, ProbeResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::command::{render_command, CommandRunner};

/// Output of the transcode stage, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodedMedia {
    pub path: PathBuf,
    pub reencoded: bool,
}

#[derive(Clone)]
pub struct TranscodeEngine {
    runner: Arc<dyn CommandRunner>,
    ffmpeg_path: String,
}

impl TranscodeEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            runner,
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Produce `out.mp4` in `workspace` along the path chosen by `plan`.
    #[tracing::instrument(skip(self, probe, plan, workspace), fields(
        process.executable.name = "ffmpeg",
        ffmpeg.operation = "transcode",
        reencode = plan.reencode,
        cap = plan.cap,
        scale = ?plan.scale_filter
    ))]
    pub async fn transcode(
        &self,
        source: &Path,
        probe: &ProbeResult,
        plan: &IngestionPlan,
        workspace: &Path,
    ) -> IngestResult<TranscodedMedia> {
        let output = workspace.join(OUTPUT_VIDEO_NAME);
        let args = if plan.reencode {
            reencode_args(
                source,
                &output,
                plan.scale_filter.as_deref(),
                probe.audio_codec.is_some(),
            )
        } else {
            remux_args(source, &output)
        };

        let start = std::time::Instant::now();
        let command = render_command(&self.ffmpeg_path, &args);

        let result = self
            .runner
            .run(&self.ffmpeg_path, &args)
            .await
            .map_err(|e| IngestError::Transcode {
                command: command.clone(),
                stderr: e.to_string(),
            })?;

        if !result.success {
            tracing::error!(
                exit_code = ?result.code,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "ffmpeg transcode failed"
            );
            return Err(IngestError::Transcode {
                command,
                stderr: result.stderr,
            });
        }

        tracing::info!(
            output = %output.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Transcode complete"
        );

        Ok(TranscodedMedia {
            path: output,
            reencoded: plan.reencode,
        })
    }
}

/// Stream copy into a fast-start container.
pub fn remux_args(source: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        source.to_string_lossy().into_owned(),
        "-c".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        FASTSTART_FLAGS.to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Full re-encode to H.264/AAC with an optional downscale filter.
pub fn reencode_args(
    source: &Path,
    output: &Path,
    scale_filter: Option<&str>,
    has_audio: bool,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        source.to_string_lossy().into_owned(),
        "-c:v".to_string(),
        VIDEO_ENCODER.to_string(),
        "-preset".to_string(),
        VIDEO_PRESET.to_string(),
        "-crf".to_string(),
        VIDEO_CRF.to_string(),
        "-pix_fmt".to_string(),
        PIXEL_FORMAT.to_string(),
        "-movflags".to_string(),
        FASTSTART_FLAGS.to_string(),
    ];

    if let Some(filter) = scale_filter {
        args.extend(["-vf".to_string(), filter.to_string()]);
    }

    if has_audio {
        args.extend([
            "-c:a".to_string(),
            AUDIO_ENCODER.to_string(),
            "-b:a".to_string(),
            AUDIO_BITRATE.to_string(),
        ]);
    } else {
        args.push("-an".to_string());
    }

    args.push(output.to_string_lossy().into_owned());
    args
}
