use serde::{Deserialize, Serialize};

use crate::RuleTerm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorKind {
    /// Passed the ratio and share thresholds for its set size.
    Outlier,
    /// Holds the majority of the sum without the median ratio.
    Dominant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantContributor {
    pub term: RuleTerm,
    /// Fraction of the absolute RHS sum, in `[0, 1]`.
    pub share: f64,
    pub kind: ContributorKind,
}

/// Root-cause evidence derived from one rule instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicFlags {
    pub scale_mismatch: bool,
    pub sign_inversion: Vec<RuleTerm>,
    pub missing_or_zero: Vec<RuleTerm>,
    pub dominant_outliers: Vec<DominantContributor>,
}

impl HeuristicFlags {
    pub fn any(&self) -> bool {
        self.scale_mismatch
            || !self.sign_inversion.is_empty()
            || !self.missing_or_zero.is_empty()
            || !self.dominant_outliers.is_empty()
    }
}
