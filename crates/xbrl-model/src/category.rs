use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rule domain of a diagnostic. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Xbrl21,
    Dimensions,
    Calculation,
    Formulas,
    EbaFiling,
    FilingRulesPreflight,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Xbrl21,
        Category::Dimensions,
        Category::Calculation,
        Category::Formulas,
        Category::EbaFiling,
        Category::FilingRulesPreflight,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Xbrl21 => "xbrl21",
            Category::Dimensions => "dimensions",
            Category::Calculation => "calculation",
            Category::Formulas => "formulas",
            Category::EbaFiling => "eba_filing",
            Category::FilingRulesPreflight => "filing_rules_preflight",
            Category::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Xbrl21 => "XBRL 2.1",
            Category::Dimensions => "Dimensions",
            Category::Calculation => "Calculation",
            Category::Formulas => "Formulas",
            Category::EbaFiling => "EBA filing rules",
            Category::FilingRulesPreflight => "Filing rules preflight",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("calc".parse::<Category>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Category::FilingRulesPreflight).unwrap();
        assert_eq!(json, "\"filing_rules_preflight\"");
        assert_eq!(
            serde_json::to_string(&Category::Xbrl21).unwrap(),
            "\"xbrl21\""
        );
    }
}
