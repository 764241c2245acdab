//! Tag blind index
//!
//! Tags are never stored in plaintext. Each normalized tag is reduced to a
//! hex-encoded HMAC-SHA256 digest under a single key, which supports exact-match
//! lookup by hashing the search term the same way and nothing else.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{IngestError, IngestResult};
use crate::models::{TagIndexEntry, TagToken};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct TagIndexer {
    key: Vec<u8>,
}

impl std::fmt::Debug for TagIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagIndexer")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TagIndexer {
    pub fn from_key_bytes(key_bytes: &[u8]) -> IngestResult<Self> {
        if key_bytes.is_empty() {
            return Err(IngestError::KeyConfiguration(
                "Tag HMAC key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            key: key_bytes.to_vec(),
        })
    }

    pub fn from_base64(key_b64: &str) -> IngestResult<Self> {
        let key_bytes = general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|e| {
                IngestError::KeyConfiguration(format!("Tag HMAC key is not base64: {}", e))
            })?;
        Self::from_key_bytes(&key_bytes)
    }

    /// Split a comma-separated tag list and normalize every piece.
    ///
    /// Order and duplicates are kept. Fails when nothing survives normalization.
    pub fn normalize_tags(raw: &str) -> IngestResult<Vec<TagToken>> {
        let tokens: Vec<TagToken> = raw.split(',').filter_map(TagToken::normalize).collect();
        if tokens.is_empty() {
            return Err(IngestError::NoValidTags);
        }
        Ok(tokens)
    }

    /// One digest per token, in input order.
    pub fn index(&self, tokens: &[TagToken]) -> IngestResult<Vec<TagIndexEntry>> {
        tokens.iter().map(|token| self.hash(token)).collect()
    }

    /// Normalize then index a raw comma-separated list.
    pub fn index_tags(&self, raw: &str) -> IngestResult<Vec<TagIndexEntry>> {
        let tokens = Self::normalize_tags(raw)?;
        self.index(&tokens)
    }

    /// Lookup token for a single search term.
    pub fn digest(&self, tag: &str) -> IngestResult<TagIndexEntry> {
        let token = TagToken::normalize(tag).ok_or(IngestError::NoValidTags)?;
        self.hash(&token)
    }

    fn hash(&self, token: &TagToken) -> IngestResult<TagIndexEntry> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| IngestError::KeyConfiguration(format!("Invalid HMAC key: {}", e)))?;
        mac.update(token.as_str().as_bytes());
        Ok(TagIndexEntry::from_hex(hex::encode(
            mac.finalize().into_bytes(),
        )))
    }
}
