//! Assembles rule instances from rule metadata and observed facts.

use xbrl_model::{
    ColCode, ModelError, RowCode, RuleDefinition, RuleInstance, RuleTerm, TermRef, TermStatus,
};
use xbrl_normalization::normalize_number;

use crate::error::RuleModelError;
use crate::facts::FactIndex;

/// Resolves every term of `definition` against `facts`.
///
/// Terms without a fact stay `Absent`; terms whose text does not normalize
/// stay `Unparseable` with the raw text kept.
pub fn build_rule(
    definition: &RuleDefinition,
    facts: &FactIndex,
) -> Result<RuleInstance, RuleModelError> {
    let rule_id = definition.rule_id.trim();
    let lhs = definition
        .lhs
        .as_ref()
        .filter(|lhs| !lhs.row_code.trim().is_empty() && !lhs.column_code.trim().is_empty())
        .ok_or_else(|| RuleModelError::MissingLhsCode {
            rule_id: rule_id.to_string(),
        })?;
    if definition.rhs.is_empty() {
        return Err(RuleModelError::EmptyRhs {
            rule_id: rule_id.to_string(),
        });
    }

    let table_id = definition.table_id.trim();
    let lhs = resolve_term(lhs, None, table_id, rule_id, facts)?;
    let rhs = definition
        .rhs
        .iter()
        .map(|term| resolve_term(term, Some(&lhs.column_code), table_id, rule_id, facts))
        .collect::<Result<Vec<_>, _>>()?;

    RuleInstance::new(
        rule_id,
        lhs,
        definition.operator,
        rhs,
        table_id,
        definition.table_label.trim(),
    )
    .map_err(|source| match source {
        ModelError::EmptyRhs { rule_id } => RuleModelError::EmptyRhs { rule_id },
        source => RuleModelError::InvalidCode {
            rule_id: rule_id.to_string(),
            source,
        },
    })
}

/// Terms whose fact text could not be normalized.
pub fn unparseable_terms(rule: &RuleInstance) -> impl Iterator<Item = &RuleTerm> {
    std::iter::once(rule.lhs())
        .chain(rule.rhs_terms())
        .filter(|term| term.status == TermStatus::Unparseable)
}

/// RHS terms may omit the column, in which case they share the LHS column.
fn resolve_term(
    term: &TermRef,
    default_column: Option<&ColCode>,
    table_id: &str,
    rule_id: &str,
    facts: &FactIndex,
) -> Result<RuleTerm, RuleModelError> {
    let invalid = |source| RuleModelError::InvalidCode {
        rule_id: rule_id.to_string(),
        source,
    };
    let row_code = RowCode::new(&term.row_code).map_err(invalid)?;
    let column_code = match default_column {
        Some(column) if term.column_code.trim().is_empty() => column.clone(),
        _ => ColCode::new(&term.column_code).map_err(invalid)?,
    };

    let mut resolved = RuleTerm::new(row_code, &term.row_label, column_code, &term.column_label);
    if let Some(sign) = term.expected_sign {
        resolved = resolved.with_sign(sign);
    }

    let by_concept = match (term.concept_ln.as_deref(), term.context_ref.as_deref()) {
        (Some(local), Some(context)) => facts.by_concept(term.concept_ns.as_deref(), local, context),
        _ => None,
    };
    let fact = by_concept
        .or_else(|| facts.by_cell(table_id, &resolved.row_code, &resolved.column_code));
    let Some(text) = fact
        .map(|fact| fact.value_text.trim())
        .filter(|text| !text.is_empty())
    else {
        return Ok(resolved);
    };

    Ok(match normalize_number(text) {
        Ok(value) => resolved.with_value(value),
        Err(err) => {
            tracing::debug!(rule_id, row = %resolved.row_code, error = %err, "fact value not numeric");
            resolved.with_unparseable(text)
        }
    })
}

#[cfg(test)]
mod tests {
    use xbrl_model::{ObservedFact, Operator, SignConvention};

    use super::*;

    fn term_ref(row: &str, label: &str, local: &str) -> TermRef {
        TermRef {
            row_code: row.to_string(),
            row_label: label.to_string(),
            column_code: "10".to_string(),
            column_label: "Amount".to_string(),
            concept_ln: Some(local.to_string()),
            context_ref: Some("c1".to_string()),
            ..TermRef::default()
        }
    }

    fn fact(local: &str, value: &str) -> ObservedFact {
        ObservedFact {
            concept_ln: local.to_string(),
            context_ref: "c1".to_string(),
            value_text: value.to_string(),
            ..ObservedFact::default()
        }
    }

    fn definition(rhs: Vec<TermRef>) -> RuleDefinition {
        RuleDefinition {
            rule_id: "v4460_m_0".to_string(),
            table_id: "C_01.00".to_string(),
            table_label: "C_01.00: Own funds".to_string(),
            operator: Operator::Ge,
            lhs: Some(term_ref("10", "Own funds", "mi1")),
            rhs,
        }
    }

    #[test]
    fn resolves_observed_absent_and_unparseable_terms() {
        let facts = FactIndex::new(vec![fact("mi1", "1.000"), fact("mi2", "n/a")]);
        let mut deduction = term_ref("30", "Goodwill", "mi3");
        deduction.expected_sign = Some(SignConvention::Negative);
        let rule = build_rule(
            &definition(vec![term_ref("20", "Tier 1", "mi2"), deduction]),
            &facts,
        )
        .unwrap();

        assert!(rule.lhs().is_observed());
        assert_eq!(rule.lhs().value.as_ref().unwrap().magnitude.to_string(), "1000");
        assert_eq!(rule.rhs_terms()[0].status, TermStatus::Unparseable);
        assert_eq!(rule.rhs_terms()[0].unparsed_text.as_deref(), Some("n/a"));
        assert_eq!(rule.rhs_terms()[1].status, TermStatus::Absent);
        assert_eq!(rule.rhs_terms()[1].sign, SignConvention::Negative);
        assert_eq!(unparseable_terms(&rule).count(), 1);
    }

    #[test]
    fn rejects_incomplete_metadata() {
        let facts = FactIndex::default();
        let err = build_rule(&definition(vec![]), &facts).unwrap_err();
        assert!(matches!(err, RuleModelError::EmptyRhs { .. }));

        let mut missing_lhs = definition(vec![term_ref("20", "Tier 1", "mi2")]);
        missing_lhs.lhs = None;
        let err = build_rule(&missing_lhs, &facts).unwrap_err();
        assert!(matches!(err, RuleModelError::MissingLhsCode { .. }));
        assert_eq!(err.rule_id(), "v4460_m_0");

        let bad_code = definition(vec![term_ref("r20", "Tier 1", "mi2")]);
        let err = build_rule(&bad_code, &facts).unwrap_err();
        assert!(matches!(err, RuleModelError::InvalidCode { .. }));
    }
}
