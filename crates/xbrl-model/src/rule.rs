//! Comparison rules between a total row and its components.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ColCode, ModelError, NumericValue, RowCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<=", alias = "≤", alias = "le")]
    Le,
    #[serde(rename = ">=", alias = "≥", alias = "ge")]
    Ge,
    #[serde(rename = "=", alias = "==", alias = "eq")]
    Eq,
    #[serde(rename = "!=", alias = "≠", alias = "<>", alias = "ne")]
    Ne,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Le => "≤",
            Operator::Ge => "≥",
            Operator::Eq => "=",
            Operator::Ne => "≠",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "<=" | "≤" | "le" => Ok(Operator::Le),
            ">=" | "≥" | "ge" => Ok(Operator::Ge),
            "=" | "==" | "eq" => Ok(Operator::Eq),
            "!=" | "≠" | "<>" | "ne" => Ok(Operator::Ne),
            _ => Err(ModelError::UnknownOperator(s.to_string())),
        }
    }
}

/// Sign a term's value is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignConvention {
    Negative,
    Positive,
    #[default]
    Unspecified,
}

const NEGATION_MARKERS: [&str; 3] = ["(-)", "(–)", "(−)"];

impl SignConvention {
    /// Labels starting with a negation marker or naming a deduction are
    /// reported as negatives.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim_start();
        if NEGATION_MARKERS
            .iter()
            .any(|marker| trimmed.starts_with(marker))
            || label.to_lowercase().contains("deduction")
        {
            SignConvention::Negative
        } else {
            SignConvention::Unspecified
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStatus {
    Observed,
    Absent,
    Unparseable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTerm {
    pub row_code: RowCode,
    pub row_label: String,
    pub column_code: ColCode,
    pub column_label: String,
    pub value: Option<NumericValue>,
    pub status: TermStatus,
    pub sign: SignConvention,
    /// Raw text kept when normalization failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unparsed_text: Option<String>,
}

impl RuleTerm {
    pub fn new(
        row_code: RowCode,
        row_label: impl Into<String>,
        column_code: ColCode,
        column_label: impl Into<String>,
    ) -> Self {
        let row_label = row_label.into();
        let sign = SignConvention::from_label(&row_label);
        Self {
            row_code,
            row_label,
            column_code,
            column_label: column_label.into(),
            value: None,
            status: TermStatus::Absent,
            sign,
            unparsed_text: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: NumericValue) -> Self {
        self.value = Some(value);
        self.status = TermStatus::Observed;
        self.unparsed_text = None;
        self
    }

    #[must_use]
    pub fn with_unparseable(mut self, text: impl Into<String>) -> Self {
        self.value = None;
        self.status = TermStatus::Unparseable;
        self.unparsed_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_sign(mut self, sign: SignConvention) -> Self {
        self.sign = sign;
        self
    }

    pub fn is_observed(&self) -> bool {
        self.status == TermStatus::Observed
    }
}

/// A rule with its terms resolved against one run's facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInstance {
    rule_id: String,
    lhs: RuleTerm,
    operator: Operator,
    rhs_terms: Vec<RuleTerm>,
    table_id: String,
    table_label: String,
}

impl RuleInstance {
    pub fn new(
        rule_id: impl Into<String>,
        lhs: RuleTerm,
        operator: Operator,
        rhs_terms: Vec<RuleTerm>,
        table_id: impl Into<String>,
        table_label: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let rule_id = rule_id.into();
        if rhs_terms.is_empty() {
            return Err(ModelError::EmptyRhs { rule_id });
        }
        Ok(Self {
            rule_id,
            lhs,
            operator,
            rhs_terms,
            table_id: table_id.into(),
            table_label: table_label.into(),
        })
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn lhs(&self) -> &RuleTerm {
        &self.lhs
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Right-hand side in source order. Never empty.
    pub fn rhs_terms(&self) -> &[RuleTerm] {
        &self.rhs_terms
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn table_label(&self) -> &str {
        &self.table_label
    }
}

/// Reference to a term as published in rule metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    #[serde(default, alias = "rowCode")]
    pub row_code: String,
    #[serde(default, alias = "rowLabel")]
    pub row_label: String,
    #[serde(default, alias = "columnCode", alias = "colCode")]
    pub column_code: String,
    #[serde(default, alias = "columnLabel", alias = "colLabel")]
    pub column_label: String,
    #[serde(default, alias = "conceptNs")]
    pub concept_ns: Option<String>,
    #[serde(default, alias = "conceptLn")]
    pub concept_ln: Option<String>,
    #[serde(default, alias = "contextRef")]
    pub context_ref: Option<String>,
    #[serde(default, alias = "expectedSign")]
    pub expected_sign: Option<SignConvention>,
}

/// Resolved rule metadata supplied by the engine alongside its log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(alias = "ruleId")]
    pub rule_id: String,
    #[serde(default, alias = "tableId")]
    pub table_id: String,
    #[serde(default, alias = "tableLabel")]
    pub table_label: String,
    pub operator: Operator,
    #[serde(default)]
    pub lhs: Option<TermRef>,
    #[serde(default)]
    pub rhs: Vec<TermRef>,
}

/// A fact value as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedFact {
    #[serde(default, alias = "conceptNs")]
    pub concept_ns: String,
    #[serde(default, alias = "conceptLn")]
    pub concept_ln: String,
    #[serde(default, alias = "contextRef")]
    pub context_ref: String,
    #[serde(default, alias = "value", alias = "valueText")]
    pub value_text: String,
    #[serde(default, alias = "tableId")]
    pub table_id: Option<String>,
    #[serde(default, alias = "rowCode")]
    pub row_code: Option<String>,
    #[serde(default, alias = "colCode")]
    pub col_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(row: &str, label: &str) -> RuleTerm {
        RuleTerm::new(
            RowCode::new(row).unwrap(),
            label,
            ColCode::new("10").unwrap(),
            "Amount",
        )
    }

    #[test]
    fn rejects_empty_rhs() {
        let err = RuleInstance::new("v1", term("10", "Total"), Operator::Eq, vec![], "T", "")
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptyRhs { .. }));
    }

    #[test]
    fn rhs_order_is_preserved() {
        let rule = RuleInstance::new(
            "v1",
            term("10", "Total"),
            Operator::Eq,
            vec![term("30", "b"), term("20", "a")],
            "T",
            "",
        )
        .unwrap();
        let rows: Vec<&str> = rule.rhs_terms().iter().map(|t| t.row_code.as_str()).collect();
        assert_eq!(rows, ["0030", "0020"]);
    }

    #[test]
    fn negation_markers_set_sign() {
        assert_eq!(
            SignConvention::from_label("(-) Treasury shares"),
            SignConvention::Negative
        );
        assert_eq!(
            SignConvention::from_label("Other deductions"),
            SignConvention::Negative
        );
        assert_eq!(
            SignConvention::from_label("Capital"),
            SignConvention::Unspecified
        );
        assert_eq!(term("20", "(−) Goodwill").sign, SignConvention::Negative);
    }

    #[test]
    fn operator_parses_ascii_and_symbols() {
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::Ge);
        assert_eq!("≠".parse::<Operator>().unwrap(), Operator::Ne);
        assert!("~".parse::<Operator>().is_err());
        let op: Operator = serde_json::from_str("\"≤\"").unwrap();
        assert_eq!(op, Operator::Le);
    }
}
