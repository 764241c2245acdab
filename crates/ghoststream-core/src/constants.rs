//! Fixed parameters of the delivered media profile and of the at-rest formats.

/// Durations strictly below this many seconds get the high cap.
pub const LONG_VIDEO_THRESHOLD_SECONDS: f64 = 600.0;
pub const SHORT_VIDEO_CAP: u32 = 720;
pub const LONG_VIDEO_CAP: u32 = 480;

pub const APPROVED_VIDEO_CODEC: &str = "h264";
pub const APPROVED_AUDIO_CODEC: &str = "aac";
/// Container aliases accepted as the MP4/MOV family.
pub const APPROVED_CONTAINERS: [&str; 2] = ["mp4", "mov"];

pub const VIDEO_ENCODER: &str = "libx264";
pub const VIDEO_PRESET: &str = "fast";
pub const VIDEO_CRF: &str = "23";
pub const PIXEL_FORMAT: &str = "yuv420p";
pub const AUDIO_ENCODER: &str = "aac";
pub const AUDIO_BITRATE: &str = "128k";
pub const FASTSTART_FLAGS: &str = "+faststart";

pub const THUMBNAIL_HEIGHT: u32 = 360;
pub const THUMBNAIL_QUALITY: &str = "4";
pub const THUMBNAIL_MIN_SECONDS: f64 = 0.5;
pub const THUMBNAIL_MAX_SECONDS: f64 = 5.0;
pub const THUMBNAIL_POSITION_RATIO: f64 = 0.1;

pub const ENVELOPE_VERSION: u8 = 1;
pub const ENVELOPE_ALGORITHM: &str = "A256GCM";
pub const AES_KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";
pub const DEFAULT_VIDEO_PREFIX: &str = "videos";
pub const DEFAULT_THUMB_PREFIX: &str = "thumbs";

pub const WORKSPACE_PREFIX: &str = "ghoststream_ingest_";
pub const OUTPUT_VIDEO_NAME: &str = "out.mp4";
pub const OUTPUT_THUMB_NAME: &str = "thumb.jpg";
