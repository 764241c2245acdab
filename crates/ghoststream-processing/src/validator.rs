//! Invariant validator
//!
//! The encoder is not trusted to honour the delivered profile. Its output is probed
//! again and checked before anything leaves the workspace.

use ghoststream_core::constants::{APPROVED_AUDIO_CODEC, APPROVED_VIDEO_CODEC};
use ghoststream_core::{Dimension, IngestError, IngestResult, ProbeResult};
use std::path::{Path, PathBuf};

use crate::prober::MediaProber;
use crate::transcode::TranscodedMedia;

/// Transcoded output that passed every invariant.
///
/// Only [`InvariantValidator::validate`] can produce one, so later stages cannot be
/// reached with unchecked media.
#[derive(Debug, Clone)]
pub struct ValidatedMedia {
    path: PathBuf,
    input: ProbeResult,
    output: ProbeResult,
    reencoded: bool,
}

impl ValidatedMedia {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn input(&self) -> &ProbeResult {
        &self.input
    }

    pub fn output(&self) -> &ProbeResult {
        &self.output
    }

    pub fn reencoded(&self) -> bool {
        self.reencoded
    }

    /// Output duration rounded to the nearest second.
    pub fn rounded_duration(&self) -> i32 {
        self.output.duration_seconds.round() as i32
    }
}

#[derive(Clone)]
pub struct InvariantValidator {
    prober: MediaProber,
}

impl InvariantValidator {
    pub fn new(prober: MediaProber) -> Self {
        Self { prober }
    }

    #[tracing::instrument(skip(self, input, media), fields(path = %media.path.display()))]
    pub async fn validate(
        &self,
        input: &ProbeResult,
        media: TranscodedMedia,
    ) -> IngestResult<ValidatedMedia> {
        let output = self.prober.probe(&media.path).await?;
        check(input, &output)?;

        tracing::info!(
            input = %input.resolution(),
            output = %output.resolution(),
            video_codec = %output.video_codec,
            audio_codec = ?output.audio_codec,
            "Output passed invariant checks"
        );

        Ok(ValidatedMedia {
            path: media.path,
            input: input.clone(),
            output,
            reencoded: media.reencoded,
        })
    }
}

/// Check output against input, stopping at the first violation.
///
/// Order: height, width, video codec, audio codec, container.
pub fn check(input: &ProbeResult, output: &ProbeResult) -> IngestResult<()> {
    if output.height > input.height {
        return Err(IngestError::UpscaleViolation {
            dimension: Dimension::Height,
            output: output.height,
            input: input.height,
        });
    }
    if output.width > input.width {
        return Err(IngestError::UpscaleViolation {
            dimension: Dimension::Width,
            output: output.width,
            input: input.width,
        });
    }
    if !output.has_approved_video_codec() {
        return Err(IngestError::CodecViolation {
            stream: "video",
            expected: APPROVED_VIDEO_CODEC,
            found: output.video_codec.clone(),
        });
    }
    if !output.has_approved_audio_codec() {
        return Err(IngestError::CodecViolation {
            stream: "audio",
            expected: APPROVED_AUDIO_CODEC,
            found: output.audio_codec.clone().unwrap_or_default(),
        });
    }
    if !output.has_approved_container() {
        return Err(IngestError::ContainerViolation {
            found: output.container.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(width: u32, height: u32) -> ProbeResult {
        ProbeResult {
            duration_seconds: 120.0,
            width,
            height,
            video_codec: "h264".to_string(),
            audio_codec: Some("aac".to_string()),
            container: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
        }
    }

    #[test]
    fn accepts_downscaled_output() {
        assert!(check(&media(1920, 1080), &media(854, 480)).is_ok());
        assert!(check(&media(1280, 720), &media(1280, 720)).is_ok());
    }

    #[test]
    fn rejects_taller_output() {
        let err = check(&media(1280, 720), &media(1280, 1080)).unwrap_err();
        assert!(matches!(
            err,
            IngestError::UpscaleViolation {
                dimension: Dimension::Height,
                output: 1080,
                input: 720
            }
        ));
    }

    #[test]
    fn rejects_wider_output() {
        let err = check(&media(640, 720), &media(1280, 720)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "NO-UPSCALE violated: output width 1280 > input width 640"
        );
    }

    #[test]
    fn height_is_checked_before_codec() {
        let mut output = media(1920, 1440);
        output.video_codec = "hevc".to_string();
        let err = check(&media(1920, 1080), &output).unwrap_err();
        assert_eq!(err.error_code(), "UPSCALE_VIOLATION");
    }

    #[test]
    fn rejects_wrong_codecs_and_container() {
        let input = media(1920, 1080);

        let mut output = media(1280, 720);
        output.video_codec = "vp9".to_string();
        assert!(matches!(
            check(&input, &output),
            Err(IngestError::CodecViolation { stream: "video", .. })
        ));

        let mut output = media(1280, 720);
        output.audio_codec = Some("opus".to_string());
        assert!(matches!(
            check(&input, &output),
            Err(IngestError::CodecViolation { stream: "audio", .. })
        ));

        let mut output = media(1280, 720);
        output.audio_codec = None;
        assert!(check(&input, &output).is_ok());

        let mut output = media(1280, 720);
        output.container = "matroska,webm".to_string();
        assert!(matches!(
            check(&input, &output),
            Err(IngestError::ContainerViolation { .. })
        ));
    }
}
