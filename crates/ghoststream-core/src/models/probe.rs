use serde::{Deserialize, Serialize};

use crate::constants::{APPROVED_AUDIO_CODEC, APPROVED_CONTAINERS, APPROVED_VIDEO_CODEC};

/// Attributes of a media file as reported by the inspection process.
///
/// Produced fresh by every probe; the prober guarantees positive dimensions and
/// a positive duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    /// Lowercase codec name, e.g. `h264`.
    pub video_codec: String,
    /// Lowercase codec name; `None` when the file has no audio track.
    pub audio_codec: Option<String>,
    /// Lowercase format name, possibly a comma-joined alias list such as
    /// `mov,mp4,m4a,3gp,3g2,mj2`.
    pub container: String,
}

impl ProbeResult {
    /// Individual aliases of the container format name.
    pub fn container_aliases(&self) -> impl Iterator<Item = &str> {
        self.container.split(',').map(str::trim)
    }

    /// Container belongs to the MP4/MOV family.
    pub fn has_approved_container(&self) -> bool {
        self.container_aliases()
            .any(|alias| APPROVED_CONTAINERS.contains(&alias))
    }

    pub fn has_approved_video_codec(&self) -> bool {
        self.video_codec == APPROVED_VIDEO_CODEC
    }

    /// Audio is AAC or absent.
    pub fn has_approved_audio_codec(&self) -> bool {
        match self.audio_codec.as_deref() {
            None => true,
            Some(codec) => codec == APPROVED_AUDIO_CODEC,
        }
    }

    /// Already playable as delivered media: MP4/MOV container, H.264 video,
    /// AAC or no audio.
    pub fn is_compliant(&self) -> bool {
        self.has_approved_container()
            && self.has_approved_video_codec()
            && self.has_approved_audio_codec()
    }

    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
