//! Recovery and removal of records that give the user nothing to act on.

use serde::Serialize;
use xbrl_model::{Category, DiagnosticRecord, NonActionableMode, RawEvent, Severity};

use crate::classify::is_generic_code;
use crate::enrich::{extract_cell_ref, extract_rule_id};

/// A dropped (or audit-tagged) entry kept for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedSample {
    pub code: String,
    pub severity: Severity,
    pub raw_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub dropped_errors: usize,
    pub dropped_warnings: usize,
    pub dropped_total: usize,
    /// Records that became actionable through recovery.
    pub recovered: usize,
    /// Records still non-actionable but kept under audit mode.
    pub tagged: usize,
    pub retained: usize,
    pub samples: Vec<DroppedSample>,
}

impl FilterReport {
    fn sample(&mut self, event: &RawEvent, limit: usize) {
        if self.samples.len() < limit {
            self.samples.push(DroppedSample {
                code: event.code.clone(),
                severity: event.severity,
                raw_message: event.raw_message.clone(),
            });
        }
    }
}

pub struct NonActionableFilter {
    mode: NonActionableMode,
    sample_limit: usize,
}

impl NonActionableFilter {
    pub fn new(mode: NonActionableMode, sample_limit: usize) -> Self {
        Self { mode, sample_limit }
    }

    /// Backfills what the raw event still offers. Returns true when any
    /// field changed.
    pub fn recover(&self, record: &mut DiagnosticRecord, event: &RawEvent) -> bool {
        let mut changed = false;

        if record.message.trim().is_empty() && !is_generic_code(&record.code) {
            record.message = record.code.trim().to_string();
            changed = true;
        }

        if record.rule_id.is_none()
            && let Some(rule_id) =
                extract_rule_id(&event.code).or_else(|| extract_rule_id(&event.raw_message))
        {
            record.rule_id = Some(rule_id);
            record.category = Category::Formulas;
            changed = true;
        }

        if record.table_id.is_none()
            && let Some(cell) = extract_cell_ref(&event.raw_message)
        {
            record.table_id = Some(cell.table_id);
            record.row_code.get_or_insert(cell.row_code);
            record.col_code.get_or_insert(cell.col_code);
            changed = true;
        }

        changed
    }

    pub fn is_nonactionable(record: &DiagnosticRecord, event: &RawEvent) -> bool {
        record.message.trim().is_empty()
            && is_generic_code(&record.code)
            && event.refs.iter().all(|r| r.trim().is_empty())
            && !record.has_location()
            && record.rule_id.is_none()
    }

    /// Records and their source events, in order. Retained records keep
    /// their relative order.
    pub fn apply<'e>(
        &self,
        entries: impl IntoIterator<Item = (DiagnosticRecord, &'e RawEvent)>,
    ) -> (Vec<(DiagnosticRecord, &'e RawEvent)>, FilterReport) {
        let mut report = FilterReport::default();
        let mut kept = Vec::new();

        for (mut record, event) in entries {
            let was_nonactionable = Self::is_nonactionable(&record, event);
            self.recover(&mut record, event);
            if !Self::is_nonactionable(&record, event) {
                if was_nonactionable {
                    report.recovered += 1;
                }
                kept.push((record, event));
                continue;
            }

            report.sample(event, self.sample_limit);
            match self.mode {
                NonActionableMode::Drop => {
                    report.dropped_total += 1;
                    match record.severity {
                        Severity::Error => report.dropped_errors += 1,
                        Severity::Warning => report.dropped_warnings += 1,
                        Severity::Info => {}
                    }
                }
                NonActionableMode::Audit => {
                    record.nonactionable = true;
                    report.tagged += 1;
                    kept.push((record, event));
                }
            }
        }

        report.retained = kept.len();
        if report.dropped_total > 0 || report.tagged > 0 {
            tracing::debug!(
                dropped = report.dropped_total,
                tagged = report.tagged,
                recovered = report.recovered,
                "non-actionable records filtered"
            );
        }
        (kept, report)
    }
}
