use serde::{Deserialize, Serialize};

use crate::failure::FailureInfo;
use diligence::RedFlagReport;
use extract::AnalysisResult;
use synthesis::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    PrimaryAnalysisInFlight,
    EnrichmentInFlight,
    Ready,
    PrimaryAnalysisFailed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::PrimaryAnalysisInFlight => "primary_analysis_in_flight",
            Phase::EnrichmentInFlight => "enrichment_in_flight",
            Phase::Ready => "ready",
            Phase::PrimaryAnalysisFailed => "primary_analysis_failed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable view of one analysis session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    pub epoch: u64,
    pub phase: Phase,
    pub file_name: Option<String>,
    pub doc_id: Option<String>,
    pub failure: Option<FailureInfo>,

    pub analysis: Option<AnalysisResult>,

    pub competitor_intel: Option<String>,
    pub competitor_error: Option<String>,
    pub competitors_loading: bool,

    pub red_flags: Option<RedFlagReport>,
    pub red_flags_error: Option<String>,
    pub red_flags_loading: bool,

    pub memo: Option<String>,
    pub memo_error: Option<FailureInfo>,
    pub memo_in_flight: bool,

    pub chat: Vec<ChatMessage>,
    pub chat_turns_in_flight: usize,
}

impl SessionSnapshot {
    /// Fresh state for a new attempt; every earlier result is dropped.
    pub fn for_attempt(epoch: u64, file_name: Option<String>) -> Self {
        Self {
            epoch,
            phase: Phase::Uploading,
            file_name,
            ..Self::default()
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }
}
