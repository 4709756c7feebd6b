use std::collections::BTreeSet;

use xbrl_model::DiagnosticRecord;

use crate::enrich::is_v_code;

fn formula_rule_id(record: &DiagnosticRecord) -> Option<&str> {
    record.rule_id.as_deref().filter(|id| is_v_code(id))
}

/// Deduplicates formula findings in place, keeping first occurrences.
///
/// Within one v-code rule id, records with a computed gap supersede those
/// without, and records with identical message, rule and found text
/// collapse to one. Returns how many records were removed.
pub fn dedupe_formula_records(records: &mut Vec<DiagnosticRecord>) -> usize {
    let with_gap: BTreeSet<String> = records
        .iter()
        .filter(|record| record.gap.is_some())
        .filter_map(formula_rule_id)
        .map(str::to_string)
        .collect();

    let before = records.len();
    let mut seen = BTreeSet::new();
    records.retain(|record| {
        let Some(rule_id) = formula_rule_id(record) else {
            return true;
        };
        if record.gap.is_none() && with_gap.contains(rule_id) {
            return false;
        }
        let composite = [
            rule_id,
            record.message.trim(),
            record.rule_text.as_str(),
            record.found_text.as_str(),
        ]
        .join("|");
        seen.insert(composite)
    });
    let removed = before - records.len();
    if removed > 0 {
        tracing::debug!(removed, "collapsed duplicate formula records");
    }
    removed
}

#[cfg(test)]
mod tests {
    use xbrl_model::{Category, Decimal, Gap, Severity};

    use super::*;

    fn record(rule_id: &str, message: &str, gap: bool) -> DiagnosticRecord {
        let mut record = DiagnosticRecord::new(
            format!("message:{rule_id}"),
            Category::Formulas,
            Severity::Error,
            message,
        );
        record.rule_id = Some(rule_id.to_string());
        record.gap = gap.then(|| Gap {
            delta: Decimal::from_i64(5),
            percent: None,
        });
        record
    }

    #[test]
    fn gap_records_supersede_and_identical_messages_collapse() {
        let mut records = vec![
            record("v1_m", "totals differ", false),
            record("v1_m", "totals differ", true),
            record("v1_m", "totals differ", true),
            record("v2_m", "a", false),
            record("v2_m", "a", false),
            record("v2_m", "b", false),
        ];
        let mut plain = record("eba_1", "x", false);
        plain.rule_id = Some("eba_1".to_string());
        records.push(plain.clone());
        records.push(plain);

        let removed = dedupe_formula_records(&mut records);
        assert_eq!(removed, 3);
        let summary: Vec<(&str, &str, bool)> = records
            .iter()
            .map(|r| (r.rule_id.as_deref().unwrap(), r.message.as_str(), r.gap.is_some()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("v1_m", "totals differ", true),
                ("v2_m", "a", false),
                ("v2_m", "b", false),
                ("eba_1", "x", false),
                ("eba_1", "x", false),
            ]
        );
    }
}
