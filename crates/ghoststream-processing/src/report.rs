//! Human-readable plan and analysis reports.

use ghoststream_core::{IngestionPlan, ProbeResult};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::policy;

/// The plan table printed before transcoding.
pub struct PlanReport<'a> {
    pub probe: &'a ProbeResult,
    pub plan: &'a IngestionPlan,
}

impl Display for PlanReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let rows = [
            (
                "Input duration (s)",
                format!("{:.2}", self.probe.duration_seconds),
            ),
            ("Input resolution", self.probe.resolution()),
            (
                "Input codecs",
                format!(
                    "v={}, a={}",
                    self.probe.video_codec,
                    self.probe.audio_codec.as_deref().unwrap_or("none")
                ),
            ),
            ("Input container", self.probe.container.clone()),
            ("Policy cap (height)", format!("{}p", self.plan.cap)),
            ("--skip-compress", self.plan.skip_compress.to_string()),
            ("Will re-encode", self.plan.reencode.to_string()),
        ];

        writeln!(f, "GhostStream Ingestion Plan")?;
        for (field, value) in rows {
            writeln!(f, "  {:<22}{}", field, value)?;
        }
        Ok(())
    }
}

/// Quick look at a file before ingesting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub resolution: String,
    pub duration: String,
    pub video_codec: String,
    pub cap: u32,
    /// Already H.264 in an MP4/MOV container.
    pub optimized: bool,
}

impl Analysis {
    pub fn from_probe(probe: &ProbeResult) -> Self {
        Analysis {
            resolution: probe.resolution(),
            duration: format_duration(probe.duration_seconds),
            video_codec: probe.video_codec.to_uppercase(),
            cap: policy::choose_cap(probe.duration_seconds),
            optimized: probe.has_approved_container() && probe.has_approved_video_codec(),
        }
    }
}

impl Display for Analysis {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} | {} | {} | Cap: {}p | {}",
            self.resolution,
            self.duration,
            self.video_codec,
            self.cap,
            if self.optimized {
                "already optimized"
            } else {
                "will be re-encoded"
            }
        )
    }
}

/// `m:ss`, truncating fractional seconds.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
