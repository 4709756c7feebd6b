//! Rule / Found / Gap / Causes / Fix text for one rule instance.

use serde::Serialize;
use xbrl_model::{
    ContributorKind, Decimal, Gap, HeuristicFlags, Operator, RuleInstance, RuleTerm,
    SignConvention, TermStatus,
};
use xbrl_normalization::{
    display_label, format_percent, format_value, render_decimal, strip_table_prefix,
};

/// Right-hand sides longer than this render as an aggregate.
pub const RHS_EXPANSION_LIMIT: usize = 5;

/// Percentages below this magnitude are left out of the text.
const PERCENT_DISPLAY_MIN: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposedMessage {
    pub title: String,
    pub rule_text: String,
    pub found_text: String,
    pub gap: Option<Gap>,
    pub causes_text: Option<String>,
    pub fix_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MessageComposer {
    label_max_chars: usize,
}

impl Default for MessageComposer {
    fn default() -> Self {
        Self::new(80)
    }
}

impl MessageComposer {
    pub fn new(label_max_chars: usize) -> Self {
        Self { label_max_chars }
    }

    pub fn compose(&self, rule: &RuleInstance, flags: &HeuristicFlags) -> ComposedMessage {
        let gap = compute_gap(rule);
        let (causes_text, fix_text) = if flags.any() {
            (
                Some(self.causes(rule, flags).join(" ")),
                Some(self.fixes(rule, flags).join(" ")),
            )
        } else {
            (None, None)
        };
        ComposedMessage {
            title: self.title(rule.table_id(), rule.table_label()),
            rule_text: self.rule_text(rule),
            found_text: self.found_text(rule, gap.as_ref()),
            gap,
            causes_text,
            fix_text,
        }
    }

    /// `C_01.00 - Own funds`, without the catalog's own table prefix.
    pub fn title(&self, table_id: &str, table_label: &str) -> String {
        let label = display_label(strip_table_prefix(table_label, table_id), self.label_max_chars);
        match (table_id.is_empty(), label.is_empty()) {
            (false, false) => format!("{table_id} - {label}"),
            (false, true) => table_id.to_string(),
            (true, _) => label,
        }
    }

    fn row_ref(&self, term: &RuleTerm) -> String {
        let label = display_label(&term.row_label, self.label_max_chars);
        if label.is_empty() {
            format!("Row {}", term.row_code)
        } else {
            format!("Row {} \"{label}\"", term.row_code)
        }
    }

    pub fn rule_text(&self, rule: &RuleInstance) -> String {
        let rhs = rule.rhs_terms();
        let rhs_text = if rhs.len() > RHS_EXPANSION_LIMIT {
            format!("sum of {} rows", rhs.len())
        } else if is_magnitude_rule(rule) {
            format!("|{}|", self.row_ref(&rhs[0]))
        } else {
            rhs.iter()
                .map(|term| format!("Row {}", term.row_code))
                .collect::<Vec<_>>()
                .join(" + ")
        };
        let lhs = rule.lhs();
        let column_label = display_label(&lhs.column_label, self.label_max_chars);
        let column = if column_label.is_empty() {
            format!("column {}", lhs.column_code)
        } else {
            format!("column {} \"{column_label}\"", lhs.column_code)
        };
        format!(
            "{} {} {rhs_text} for {column}",
            self.row_ref(lhs),
            rule.operator().symbol()
        )
    }

    pub fn found_text(&self, rule: &RuleInstance, gap: Option<&Gap>) -> String {
        let lhs = rule.lhs();
        let mut lines = vec![format!("{} = {}", self.row_ref(lhs), term_value(lhs))];

        let rhs = rule.rhs_terms();
        let sum = observed_sum(rhs);
        let compare = if rhs.len() > RHS_EXPANSION_LIMIT {
            match sum {
                Some(sum) => format!("sum of {} rows = {}", rhs.len(), render_decimal(sum)),
                None => format!("sum of {} rows (no values)", rhs.len()),
            }
        } else {
            let expression = rhs.iter().map(term_value).collect::<Vec<_>>().join(" + ");
            match sum {
                Some(sum) if rhs.len() > 1 => format!("{expression} = {}", render_decimal(sum)),
                _ => expression,
            }
        };
        lines.push(format!("Compare: {compare}"));

        if let Some(gap) = gap {
            let mut difference = format!("Difference: {}", signed(gap.delta));
            if let Some(percent) = gap.percent
                && percent.abs() >= PERCENT_DISPLAY_MIN
            {
                difference.push_str(&format!(" ({})", format_percent(percent)));
            }
            lines.push(difference);
        }
        lines.join("\n")
    }

    fn causes(&self, rule: &RuleInstance, flags: &HeuristicFlags) -> Vec<String> {
        let mut causes = Vec::new();
        if flags.scale_mismatch {
            let lhs = rule.lhs().value.as_ref().map(|v| v.magnitude);
            causes.push(match (lhs, observed_sum(rule.rhs_terms())) {
                (Some(lhs), Some(sum)) => format!(
                    "Scale mismatch likely (lhs {} vs sum {}).",
                    render_decimal(lhs),
                    render_decimal(sum)
                ),
                _ => "Scale mismatch likely (components differ by 1000x or more).".to_string(),
            });
        }
        for term in &flags.sign_inversion {
            let Some(value) = term.value.as_ref() else {
                continue;
            };
            let expected = match term.sign {
                SignConvention::Negative => "negative",
                SignConvention::Positive => "positive",
                SignConvention::Unspecified => continue,
            };
            causes.push(format!(
                "{} should be {expected} but is {}.",
                self.row_ref(term),
                signed(value.magnitude)
            ));
        }
        for term in &flags.missing_or_zero {
            causes.push(format!("Missing/zero on {}.", self.row_ref(term)));
        }
        for contributor in &flags.dominant_outliers {
            let prefix = match contributor.kind {
                ContributorKind::Outlier => "Outlier",
                ContributorKind::Dominant => "Top driver",
            };
            causes.push(format!(
                "{prefix}: {} = {} (~{:.0}%).",
                self.row_ref(&contributor.term),
                term_value(&contributor.term),
                contributor.share * 100.0
            ));
        }
        causes
    }

    fn fixes(&self, rule: &RuleInstance, flags: &HeuristicFlags) -> Vec<String> {
        let mut fixes = Vec::new();
        if flags.scale_mismatch {
            fixes.push(format!(
                "Align unit/scale (use the same units in column {}).",
                rule.lhs().column_code
            ));
        }
        if !flags.sign_inversion.is_empty() {
            fixes.push("Enter (-) rows as negatives (correct the sign).".to_string());
        }
        for term in &flags.missing_or_zero {
            fixes.push(format!("Fill {}.", self.row_ref(term)));
        }
        if !flags.dominant_outliers.is_empty() {
            fixes.push(
                "Review and correct outlier/dominant row values if due to mapping or scale."
                    .to_string(),
            );
        }
        fixes.push("Recalculate and resubmit.".to_string());
        fixes
    }
}

/// `lhs - sum(rhs)` over signed values. Absent when the LHS or every RHS
/// value is unobserved.
pub fn compute_gap(rule: &RuleInstance) -> Option<Gap> {
    let lhs = rule.lhs().value.as_ref()?.magnitude;
    let sum = observed_sum(rule.rhs_terms())?;
    let delta = lhs.checked_sub(sum)?;
    let denominator = if is_magnitude_rule(rule) {
        sum.abs()
    } else {
        lhs.abs()
    };
    let percent = (!denominator.is_zero()).then(|| delta.to_f64() / denominator.to_f64() * 100.0);
    Some(Gap { delta, percent })
}

/// `lhs ≥ |rhs|` with a single deduction-style term.
fn is_magnitude_rule(rule: &RuleInstance) -> bool {
    rule.operator() == Operator::Ge && rule.rhs_terms().len() == 1
}

fn observed_sum(terms: &[RuleTerm]) -> Option<Decimal> {
    let mut values = terms
        .iter()
        .filter_map(|term| term.value.as_ref().map(|v| v.magnitude))
        .peekable();
    values.peek()?;
    Decimal::checked_sum(values)
}

fn term_value(term: &RuleTerm) -> String {
    match (term.status, term.value.as_ref()) {
        (TermStatus::Observed, Some(value)) => format_value(value),
        (TermStatus::Unparseable, _) => format!(
            "\"{}\" (unreadable)",
            term.unparsed_text.as_deref().unwrap_or_default()
        ),
        _ => "(missing)".to_string(),
    }
}

fn signed(value: Decimal) -> String {
    let rendered = render_decimal(value);
    if value.is_positive() {
        format!("+{rendered}")
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use xbrl_model::{ColCode, NumericValue, RowCode};

    use super::*;

    fn term(row: u32, label: &str, value: Option<i64>) -> RuleTerm {
        let term = RuleTerm::new(
            RowCode::new(row.to_string()).unwrap(),
            label,
            ColCode::new("10").unwrap(),
            "Amount",
        );
        match value {
            Some(v) => term.with_value(NumericValue::new(Decimal::from_i64(v), v.to_string())),
            None => term,
        }
    }

    fn rule(operator: Operator, rhs: Vec<RuleTerm>) -> RuleInstance {
        RuleInstance::new(
            "v4460_m_0",
            term(10, "Own funds", Some(75_085)),
            operator,
            rhs,
            "C_01.00",
            "C_01.00: Own funds",
        )
        .unwrap()
    }

    #[test]
    fn magnitude_rule_uses_rhs_denominator() {
        let rule = rule(Operator::Ge, vec![term(20, "(-) Goodwill", Some(68_246))]);
        let gap = compute_gap(&rule).unwrap();
        assert_eq!(gap.delta, Decimal::from_i64(6_839));
        let percent = gap.percent.unwrap();
        assert!((percent - 6_839.0 / 68_246.0 * 100.0).abs() < 1e-9);
        assert_eq!(format_percent(percent), "+10.0%");
    }

    #[test]
    fn other_rules_use_lhs_denominator() {
        let rule = rule(
            Operator::Eq,
            vec![term(20, "a", Some(50_000)), term(30, "b", Some(10_000))],
        );
        let gap = compute_gap(&rule).unwrap();
        assert_eq!(gap.delta, Decimal::from_i64(15_085));
        assert!((gap.percent.unwrap() - 15_085.0 / 75_085.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn gap_needs_observed_values() {
        let rule = rule(Operator::Eq, vec![term(20, "a", None)]);
        assert!(compute_gap(&rule).is_none());
    }

    #[test]
    fn rhs_collapses_above_five_terms() {
        let composer = MessageComposer::default();
        let five: Vec<RuleTerm> = (0..5).map(|i| term(20 + i * 10, "c", Some(1))).collect();
        let text = composer.rule_text(&rule(Operator::Eq, five));
        assert!(text.contains("Row 0020 + Row 0030 + Row 0040 + Row 0050 + Row 0060"));

        let six: Vec<RuleTerm> = (0..6).map(|i| term(20 + i * 10, "c", Some(1))).collect();
        let rule = rule(Operator::Eq, six);
        assert!(composer.rule_text(&rule).contains("sum of 6 rows"));
        assert!(composer.found_text(&rule, None).contains("Compare: sum of 6 rows = 6"));
    }

    #[test]
    fn no_flags_means_no_causes_or_fix() {
        let composer = MessageComposer::default();
        let rule = rule(
            Operator::Eq,
            vec![term(20, "a", Some(40_000)), term(30, "b", Some(35_085))],
        );
        let message = composer.compose(&rule, &HeuristicFlags::default());
        assert!(message.causes_text.is_none());
        assert!(message.fix_text.is_none());
        assert_eq!(message.title, "C_01.00 - Own funds");
    }

    #[test]
    fn codes_are_zero_padded() {
        let composer = MessageComposer::default();
        let lhs = RuleTerm::new(
            RowCode::new("7").unwrap(),
            "",
            ColCode::new("10").unwrap(),
            "",
        );
        let rule = RuleInstance::new("v1", lhs, Operator::Eq, vec![term(8, "", None)], "T", "")
            .unwrap();
        assert_eq!(
            composer.rule_text(&rule),
            "Row 0007 = Row 0008 for column 010"
        );
    }
}
