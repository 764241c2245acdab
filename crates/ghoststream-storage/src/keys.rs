//! Object key generation.
//!
//! Key format: `{video_prefix}/{id}.mp4` and `{thumb_prefix}/{id}.jpg`.

use uuid::Uuid;

/// Keys for one ingestion's artifacts, sharing a single identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKeys {
    pub id: Uuid,
    pub video_key: String,
    pub thumb_key: String,
}

impl ObjectKeys {
    /// Keys under a freshly generated identifier.
    pub fn generate(video_prefix: &str, thumb_prefix: &str) -> Self {
        Self::for_id(Uuid::new_v4(), video_prefix, thumb_prefix)
    }

    pub fn for_id(id: Uuid, video_prefix: &str, thumb_prefix: &str) -> Self {
        ObjectKeys {
            id,
            video_key: format!("{}/{}.mp4", video_prefix.trim_end_matches('/'), id),
            thumb_key: format!("{}/{}.jpg", thumb_prefix.trim_end_matches('/'), id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_share_identifier() {
        let keys = ObjectKeys::generate("videos", "thumbs");
        assert_eq!(keys.video_key, format!("videos/{}.mp4", keys.id));
        assert_eq!(keys.thumb_key, format!("thumbs/{}.jpg", keys.id));
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let id = Uuid::nil();
        let keys = ObjectKeys::for_id(id, "media/videos//", "thumbs/");
        assert_eq!(
            keys.video_key,
            "media/videos/00000000-0000-0000-0000-000000000000.mp4"
        );
        assert_eq!(
            keys.thumb_key,
            "thumbs/00000000-0000-0000-0000-000000000000.jpg"
        );
    }

    #[test]
    fn identifiers_are_fresh() {
        let a = ObjectKeys::generate("videos", "thumbs");
        let b = ObjectKeys::generate("videos", "thumbs");
        assert_ne!(a.id, b.id);
    }
}
