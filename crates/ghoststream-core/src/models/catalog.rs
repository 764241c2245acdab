use serde::{Deserialize, Serialize};

/// The committed `videos` row.
///
/// Holds only ciphertext for the title; tags live in a separate table as digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Base64 title envelope.
    pub title_enc: String,
    /// Validated output duration rounded to the nearest second.
    pub duration_seconds: i32,
    pub width: i32,
    pub height: i32,
    pub r2_bucket: String,
    pub r2_video_key: String,
    pub r2_thumb_key: String,
    pub published: bool,
}
