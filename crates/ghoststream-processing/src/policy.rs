//! Resolution policy
//!
//! Short videos keep up to 720p, long ones up to 480p. Scaling is only ever a
//! downscale: no filter at all when the source already fits under the cap.

use ghoststream_core::constants::{
    LONG_VIDEO_CAP, LONG_VIDEO_THRESHOLD_SECONDS, SHORT_VIDEO_CAP,
};
use ghoststream_core::{IngestionPlan, ProbeResult};

/// Maximum output height for a given duration. Exactly 600 s is already "long".
pub fn choose_cap(duration_seconds: f64) -> u32 {
    if duration_seconds < LONG_VIDEO_THRESHOLD_SECONDS {
        SHORT_VIDEO_CAP
    } else {
        LONG_VIDEO_CAP
    }
}

/// Downscale filter for `input_height`, or `None` when it is within `cap`.
///
/// The height is bounded by `min(cap, ih)` so the filter cannot enlarge a frame
/// even if applied to a smaller input. `-2` keeps the aspect ratio with an even width.
pub fn plan_scale(input_height: u32, cap: u32) -> Option<String> {
    if input_height <= cap {
        None
    } else {
        Some(format!("scale=-2:'min({},ih)'", cap))
    }
}

/// MP4/MOV container, H.264 video, AAC or no audio.
pub fn is_compliant(probe: &ProbeResult) -> bool {
    probe.is_compliant()
}

/// Derive the ingestion plan from a probe.
///
/// Re-encoding is skipped only when the caller asks for it and the input is
/// already compliant.
pub fn plan(probe: &ProbeResult, skip_compress: bool) -> IngestionPlan {
    let cap = choose_cap(probe.duration_seconds);
    let reencode = !(skip_compress && is_compliant(probe));
    IngestionPlan {
        cap,
        skip_compress,
        reencode,
        scale_filter: plan_scale(probe.height, cap),
    }
}
