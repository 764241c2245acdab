use serde::{Deserialize, Serialize};

/// Decisions derived from a probe before any encoding happens.
///
/// A pure function of the probe and the skip-compress flag; see
/// `ghoststream_processing::policy::plan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionPlan {
    /// Maximum output height (720 or 480).
    pub cap: u32,
    pub skip_compress: bool,
    /// `false` only when skip-compress was requested and the input is already compliant.
    pub reencode: bool,
    /// Downscale expression; `None` when the source height is within the cap.
    pub scale_filter: Option<String>,
}
