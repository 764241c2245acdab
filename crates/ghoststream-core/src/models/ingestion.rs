use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IngestError;

/// What a successful ingestion produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Server-assigned catalog id; `None` for a dry run.
    pub video_id: Option<Uuid>,
    pub bucket: String,
    pub video_key: String,
    pub thumb_key: String,
    pub width: u32,
    pub height: u32,
    pub duration_seconds: i32,
    pub reencoded: bool,
    /// Base64 title envelope as stored in the catalog.
    pub title_enc: String,
    /// Hex tag digests in input order, duplicates included.
    pub tag_digests: Vec<String>,
    pub dry_run: bool,
}

/// Terminal value returned to any caller.
///
/// Carries no partial state: either a summary of a finished ingestion or the
/// description of the error that ended it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionResult {
    pub success: bool,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub summary: Option<IngestSummary>,
}

impl IngestSummary {
    pub fn tag_count(&self) -> usize {
        self.tag_digests.len()
    }
}

impl IngestionResult {
    pub fn succeeded(summary: IngestSummary) -> Self {
        Self {
            success: true,
            error: None,
            error_code: None,
            summary: Some(summary),
        }
    }

    pub fn failed(error: &IngestError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            error_code: Some(error.error_code().to_string()),
            summary: None,
        }
    }
}

impl From<Result<IngestSummary, IngestError>> for IngestionResult {
    fn from(result: Result<IngestSummary, IngestError>) -> Self {
        match result {
            Ok(summary) => IngestionResult::succeeded(summary),
            Err(err) => IngestionResult::failed(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_has_no_summary() {
        let result: IngestionResult = Err(IngestError::NoValidTags).into();
        assert!(!result.success);
        assert!(result.summary.is_none());
        assert_eq!(result.error_code.as_deref(), Some("NO_VALID_TAGS"));
        assert_eq!(
            result.error.as_deref(),
            Some("No valid tags provided after normalization")
        );
    }
}
