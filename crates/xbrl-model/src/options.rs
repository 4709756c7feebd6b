//! Configuration options for a diagnostics run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which record families survive post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Drops formula-category records.
    Fast,
    #[default]
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Fast => "fast",
            Profile::Full => "full",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(Profile::Fast),
            "full" => Ok(Profile::Full),
            _ => Err(format!("Unknown profile: {s}")),
        }
    }
}

/// What happens to records that stay non-actionable after recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonActionableMode {
    #[default]
    Drop,
    /// Retain them tagged `nonactionable = true`.
    Audit,
}

/// Options controlling pipeline behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub profile: Profile,

    pub nonactionable_mode: NonActionableMode,

    /// Upper bound on samples kept for dropped entries and failures.
    pub sample_limit: usize,

    /// Strip unresolved `message:<id>` keys from displayed messages.
    pub hide_raw_keys: bool,

    /// Labels longer than this are truncated with an ellipsis.
    pub label_max_chars: usize,

    pub top_codes_limit: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            profile: Profile::Full,
            nonactionable_mode: NonActionableMode::Drop,
            sample_limit: 5,
            hide_raw_keys: true,
            label_max_chars: 80,
            top_codes_limit: 10,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub fn with_nonactionable_mode(mut self, mode: NonActionableMode) -> Self {
        self.nonactionable_mode = mode;
        self
    }

    #[must_use]
    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    #[must_use]
    pub fn with_hide_raw_keys(mut self, hide: bool) -> Self {
        self.hide_raw_keys = hide;
        self
    }

    /// Options for auditing: keep every record and expose raw keys.
    pub fn audit() -> Self {
        Self {
            nonactionable_mode: NonActionableMode::Audit,
            hide_raw_keys: false,
            ..Self::default()
        }
    }
}
