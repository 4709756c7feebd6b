use serde::{Deserialize, Serialize};

use crate::{Category, ColCode, Decimal, RowCode, Severity};

/// Signed difference between the two sides of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub delta: Decimal,
    /// Percentage, absent when the denominator is zero.
    pub percent: Option<f64>,
}

/// One composed, user-facing finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// First 16 characters of `id_full`.
    pub id: String,
    /// SHA-256 hex of the finding's identifying fields.
    #[serde(default)]
    pub id_full: String,
    pub code: String,
    pub category: Category,
    pub severity: Severity,
    pub rule_id: Option<String>,
    pub message: String,
    pub title: String,
    pub rule_text: String,
    pub found_text: String,
    pub gap: Option<Gap>,
    pub causes_text: Option<String>,
    pub fix_text: Option<String>,
    pub table_id: Option<String>,
    pub row_code: Option<RowCode>,
    pub col_code: Option<ColCode>,
    pub concept_ns: Option<String>,
    pub concept_ln: Option<String>,
    pub context_ref: Option<String>,
    pub nonactionable: bool,
}

impl DiagnosticRecord {
    /// A record with only the classified event fields set. Ids are assigned
    /// once the location is final.
    pub fn new(
        code: impl Into<String>,
        category: Category,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            id_full: String::new(),
            code: code.into(),
            category,
            severity,
            rule_id: None,
            message: message.into(),
            title: String::new(),
            rule_text: String::new(),
            found_text: String::new(),
            gap: None,
            causes_text: None,
            fix_text: None,
            table_id: None,
            row_code: None,
            col_code: None,
            concept_ns: None,
            concept_ln: None,
            context_ref: None,
            nonactionable: false,
        }
    }

    pub fn has_location(&self) -> bool {
        self.table_id.is_some()
            || self.row_code.is_some()
            || self.col_code.is_some()
            || self.concept_ln.is_some()
    }

    pub fn has_concept(&self) -> bool {
        self.concept_ln.is_some() || self.context_ref.is_some()
    }
}
