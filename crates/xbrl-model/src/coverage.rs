use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub rule_ids_seen_approx: usize,
    pub baseline_present_count: usize,
    pub baseline_hash: String,
    pub entrypoint_id: String,
    pub taxonomy_version: String,
    pub approx_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    Missing,
    Stale,
}

/// Observable state of a background baseline build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildPhase {
    NotScheduled,
    Queued,
    Running,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverageStatus {
    Available(CoverageSummary),
    Unavailable {
        entrypoint_id: String,
        taxonomy_version: String,
        rule_ids_seen_approx: usize,
        reason: UnavailableReason,
        rebuild: RebuildPhase,
    },
}

impl CoverageStatus {
    pub fn summary(&self) -> Option<&CoverageSummary> {
        match self {
            CoverageStatus::Available(summary) => Some(summary),
            CoverageStatus::Unavailable { .. } => None,
        }
    }
}
