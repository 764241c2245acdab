use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A trimmed, lowercased, non-empty tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagToken(String);

impl TagToken {
    /// Normalize a raw tag. Returns `None` when nothing is left after trimming.
    pub fn normalize(raw: &str) -> Option<Self> {
        let token = raw.trim().to_lowercase();
        if token.is_empty() {
            None
        } else {
            Some(TagToken(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TagToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Hex-encoded keyed digest of one [`TagToken`]; the only form of a tag that is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagIndexEntry(String);

impl TagIndexEntry {
    pub fn from_hex(digest: String) -> Self {
        TagIndexEntry(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TagIndexEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
