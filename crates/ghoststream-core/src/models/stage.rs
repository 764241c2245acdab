use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Pipeline states. Transitions are strictly forward; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Probing,
    Planning,
    Transcoding,
    Validating,
    Thumbnailing,
    Protecting,
    Uploading,
    Committing,
    Done,
    Failed,
}

impl Stage {
    /// Share of the ingestion that is complete once this stage has been entered.
    pub fn percent(self) -> u8 {
        match self {
            Stage::Probing => 0,
            Stage::Planning => 10,
            Stage::Transcoding => 15,
            Stage::Validating => 65,
            Stage::Thumbnailing => 75,
            Stage::Protecting => 85,
            Stage::Uploading => 90,
            Stage::Committing => 97,
            Stage::Done | Stage::Failed => 100,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Probing => "probing",
            Stage::Planning => "planning",
            Stage::Transcoding => "transcoding",
            Stage::Validating => "validating",
            Stage::Thumbnailing => "thumbnailing",
            Stage::Protecting => "protecting",
            Stage::Uploading => "uploading",
            Stage::Committing => "committing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
