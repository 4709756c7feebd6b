//! Aggregated output of one diagnostics run.

use std::collections::BTreeMap;

use serde::Serialize;
use xbrl_model::{Category, CoverageStatus, DiagnosticRecord, FailureKind, Severity};

use crate::enrich::is_v_code;
use crate::filter::FilterReport;

/// One recorded per-event failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSample {
    pub kind: FailureKind,
    pub code: String,
    pub rule_id: Option<String>,
    pub detail: String,
}

/// Failure counts plus a bounded sample per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunDiagnostics {
    pub counts: BTreeMap<FailureKind, usize>,
    pub samples: Vec<FailureSample>,
    #[serde(skip)]
    sample_limit: usize,
}

impl RunDiagnostics {
    pub fn new(sample_limit: usize) -> Self {
        Self {
            sample_limit,
            ..Self::default()
        }
    }

    pub fn record(&mut self, sample: FailureSample) {
        *self.counts.entry(sample.kind).or_default() += 1;
        let kept = self.samples.iter().filter(|s| s.kind == sample.kind).count();
        if kept < self.sample_limit {
            self.samples.push(sample);
        }
    }

    pub fn count(&self, kind: FailureKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeCount {
    pub code: String,
    pub count: usize,
}

/// Codes ordered v-codes first, then by count descending, then by code.
pub fn top_codes(records: &[DiagnosticRecord], limit: usize) -> Vec<CodeCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let code = record.code.trim();
        if !code.is_empty() {
            *counts.entry(code).or_default() += 1;
        }
    }
    let mut ranked: Vec<CodeCount> = counts
        .into_iter()
        .map(|(code, count)| CodeCount {
            code: code.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        is_v_code_key(&b.code)
            .cmp(&is_v_code_key(&a.code))
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.code.cmp(&b.code))
    });
    ranked.truncate(limit);
    ranked
}

fn is_v_code_key(code: &str) -> bool {
    code.strip_prefix("message:").is_some_and(is_v_code)
}

/// Every category, including those with no records.
pub fn category_counts(records: &[DiagnosticRecord]) -> BTreeMap<Category, usize> {
    let mut counts: BTreeMap<Category, usize> =
        Category::ALL.iter().map(|category| (*category, 0)).collect();
    for record in records {
        *counts.entry(record.category).or_default() += 1;
    }
    counts
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub resolved: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub event_count: usize,
    pub records: Vec<DiagnosticRecord>,
    pub category_counts: BTreeMap<Category, usize>,
    pub top_codes: Vec<CodeCount>,
    pub filter: FilterReport,
    pub duplicates_dropped: usize,
    pub formulas_dropped: usize,
    pub catalog: CatalogStats,
    pub coverage: Option<CoverageStatus>,
    pub diagnostics: RunDiagnostics,
}

impl RunReport {
    /// Report for a run that received no events.
    pub fn empty(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            event_count: 0,
            records: Vec::new(),
            category_counts: category_counts(&[]),
            top_codes: Vec::new(),
            filter: FilterReport::default(),
            duplicates_dropped: 0,
            formulas_dropped: 0,
            catalog: CatalogStats::default(),
            coverage: None,
            diagnostics: RunDiagnostics::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.severity_count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.severity_count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn severity_count(&self, severity: Severity) -> usize {
        self.records
            .iter()
            .filter(|record| record.severity == severity && !record.nonactionable)
            .count()
    }

    pub fn find(&self, id: &str) -> Option<&DiagnosticRecord> {
        self.records.iter().find(|record| record.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str) -> DiagnosticRecord {
        DiagnosticRecord::new(code, Category::Xbrl21, Severity::Error, "m")
    }

    #[test]
    fn v_codes_rank_first_then_count() {
        let records: Vec<DiagnosticRecord> = [
            "xbrl.4.9",
            "xbrl.4.9",
            "xbrl.4.9",
            "message:v2_m",
            "message:v1_m",
            "message:v1_m",
            "eba.1.6",
            "eba.1.6",
        ]
        .into_iter()
        .map(record)
        .collect();

        let ranked: Vec<(String, usize)> = top_codes(&records, 4)
            .into_iter()
            .map(|c| (c.code, c.count))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("message:v1_m".to_string(), 2),
                ("message:v2_m".to_string(), 1),
                ("xbrl.4.9".to_string(), 3),
                ("eba.1.6".to_string(), 2),
            ]
        );
    }

    #[test]
    fn samples_are_bounded_per_kind() {
        let mut diagnostics = RunDiagnostics::new(1);
        for kind in [
            FailureKind::NormalizationFailure,
            FailureKind::NormalizationFailure,
            FailureKind::NoLocationResolved,
        ] {
            diagnostics.record(FailureSample {
                kind,
                code: "c".to_string(),
                rule_id: None,
                detail: String::new(),
            });
        }
        assert_eq!(diagnostics.count(FailureKind::NormalizationFailure), 2);
        assert_eq!(diagnostics.total(), 3);
        assert_eq!(diagnostics.samples.len(), 2);
    }

    #[test]
    fn empty_report_lists_every_category() {
        let report = RunReport::empty("r1");
        assert_eq!(report.category_counts.len(), Category::ALL.len());
        assert!(report.category_counts.values().all(|count| *count == 0));
        assert!(!report.has_errors());
    }
}
