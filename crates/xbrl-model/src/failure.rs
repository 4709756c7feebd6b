use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-event failure classes. Recorded, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NormalizationFailure,
    IncompleteRuleMetadata,
    StaleOrMissingBaseline,
    NoLocationResolved,
    /// An input entry that could not be read as an event.
    MalformedEvent,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NormalizationFailure => "normalization_failure",
            FailureKind::IncompleteRuleMetadata => "incomplete_rule_metadata",
            FailureKind::StaleOrMissingBaseline => "stale_or_missing_baseline",
            FailureKind::NoLocationResolved => "no_location_resolved",
            FailureKind::MalformedEvent => "malformed_event",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
