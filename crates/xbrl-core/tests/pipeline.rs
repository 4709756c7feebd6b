use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use xbrl_core::{CoverageRequest, CoverageTracker, DiagnosticsPipeline, FactIndex, PipelineContext};
use xbrl_ingest::{MappedCell, MappedFact, TableMapping};
use xbrl_map::CellMappingIndex;
use xbrl_model::{
    Category, CoverageStatus, Decimal, FailureKind, NonActionableMode, ObservedFact, Operator,
    PipelineOptions, Profile, RawEvent, RuleDefinition, Severity, TermRef, UnavailableReason,
};
use xbrl_standards::{BaselineCache, BaselineKey, BaselineSnapshot, BaselineStore, RuleCensus};

fn term(row: &str, label: &str) -> TermRef {
    TermRef {
        row_code: row.to_string(),
        row_label: label.to_string(),
        column_code: "010".to_string(),
        column_label: "Amount".to_string(),
        ..TermRef::default()
    }
}

fn cell_fact(row: &str, value: &str) -> ObservedFact {
    ObservedFact {
        value_text: value.to_string(),
        table_id: Some("C_01.00".to_string()),
        row_code: Some(row.to_string()),
        col_code: Some("010".to_string()),
        ..ObservedFact::default()
    }
}

fn own_funds_rule() -> RuleDefinition {
    RuleDefinition {
        rule_id: "v4460_m_0".to_string(),
        table_id: "C_01.00".to_string(),
        table_label: "Own funds".to_string(),
        operator: Operator::Ge,
        lhs: Some(term("0010", "Own funds")),
        rhs: vec![term("0020", "(-) Goodwill")],
    }
}

fn v_code_event(rule_id: &str) -> RawEvent {
    RawEvent::new(
        format!("message:{rule_id}"),
        format!("message:{rule_id} assertion failed"),
        Severity::Error,
    )
}

fn pipeline(options: PipelineOptions) -> DiagnosticsPipeline {
    DiagnosticsPipeline::new(
        PipelineContext::new("run-1")
            .with_options(options)
            .with_rules([own_funds_rule()])
            .with_facts(FactIndex::new(vec![
                cell_fact("0010", "75085"),
                cell_fact("0020", "68 246"),
            ])),
    )
}

#[test]
fn magnitude_rule_is_fully_composed() {
    let report = pipeline(PipelineOptions::default()).run(&[v_code_event("v4460_m_0")]);

    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.category, Category::Formulas);
    assert_eq!(record.rule_id.as_deref(), Some("v4460_m_0"));
    assert_eq!(record.message, "assertion failed");
    assert_eq!(record.title, "C_01.00 - Own funds");
    assert_eq!(
        record.rule_text,
        r#"Row 0010 "Own funds" ≥ |Row 0020 "(-) Goodwill"| for column 010 "Amount""#
    );
    insta::assert_snapshot!(record.found_text, @r#"
    Row 0010 "Own funds" = 75,085
    Compare: 68,246
    Difference: +6,839 (+10.0%)
    "#);
    insta::assert_snapshot!(
        record.causes_text.as_deref().unwrap_or_default(),
        @r#"Row 0020 "(-) Goodwill" should be negative but is +68,246."#
    );
    insta::assert_snapshot!(
        record.fix_text.as_deref().unwrap_or_default(),
        @"Enter (-) rows as negatives (correct the sign). Recalculate and resubmit."
    );

    let gap = record.gap.expect("gap");
    assert_eq!(gap.delta, Decimal::from_i64(6_839));
    assert_eq!(record.table_id.as_deref(), Some("C_01.00"));
    assert_eq!(record.row_code.as_ref().unwrap().as_str(), "0010");
    assert_eq!(record.col_code.as_ref().unwrap().as_str(), "010");
    assert_eq!(record.id.len(), 16);
    assert_eq!(report.catalog.unresolved, 1);
    assert!(report.has_errors());
}

#[test]
fn non_actionable_event_is_dropped_or_tagged() {
    let events = [
        RawEvent::new("unknown", "", Severity::Error),
        RawEvent::new("xbrl.4.9", "Context c3 has an invalid period", Severity::Error),
    ];

    let report = pipeline(PipelineOptions::default()).run(&events);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.filter.dropped_total, 1);
    assert_eq!(report.filter.dropped_errors, 1);
    assert_eq!(report.records[0].category, Category::Xbrl21);

    let audit = PipelineOptions::default().with_nonactionable_mode(NonActionableMode::Audit);
    let report = pipeline(audit).run(&events);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.filter.dropped_total, 0);
    let tagged: Vec<_> = report.records.iter().filter(|r| r.nonactionable).collect();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].category, Category::Unknown);
    assert_eq!(report.error_count(), 1);
}

#[test]
fn duplicates_collapse_and_fast_profile_drops_formulas() {
    let events = [
        v_code_event("v9000_m"),
        v_code_event("v9000_m"),
        RawEvent::new("EBA.2.26", "Filing indicator missing for C_02.00", Severity::Warning),
    ];

    let report = pipeline(PipelineOptions::default()).run(&events);
    assert_eq!(report.duplicates_dropped, 1);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.category_counts[&Category::Formulas], 1);
    assert_eq!(report.category_counts[&Category::EbaFiling], 1);
    assert_eq!(report.top_codes[0].code, "message:v9000_m");

    let fast = PipelineOptions::default().with_profile(Profile::Fast);
    let report = pipeline(fast).run(&events);
    assert_eq!(report.formulas_dropped, 2);
    assert_eq!(report.duplicates_dropped, 0);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].category, Category::EbaFiling);
}

#[test]
fn per_event_failures_are_recorded_not_raised() {
    let broken = RuleDefinition {
        rule_id: "v1000_m".to_string(),
        table_id: "C_02.00".to_string(),
        table_label: String::new(),
        operator: Operator::Eq,
        lhs: Some(term("0010", "Total")),
        rhs: Vec::new(),
    };
    let unreadable = RuleDefinition {
        rule_id: "v2000_m".to_string(),
        table_id: "C_01.00".to_string(),
        table_label: "Own funds".to_string(),
        operator: Operator::Eq,
        lhs: Some(term("0010", "Own funds")),
        rhs: vec![term("0030", "Capital"), term("0040", "Reserves")],
    };
    let pipeline = DiagnosticsPipeline::new(
        PipelineContext::new("run-2")
            .with_rules([broken, unreadable])
            .with_facts(FactIndex::new(vec![
                cell_fact("0010", "75085"),
                cell_fact("0030", "n/a"),
                cell_fact("0040", "75085"),
            ])),
    );

    let report = pipeline.run(&[v_code_event("v1000_m"), v_code_event("v2000_m")]);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.diagnostics.count(FailureKind::IncompleteRuleMetadata), 1);
    assert_eq!(report.diagnostics.count(FailureKind::NormalizationFailure), 1);

    let degraded = &report.records[0];
    assert_eq!(degraded.title, "Formulas");
    assert!(degraded.rule_text.is_empty());
    assert!(degraded.gap.is_none());

    let composed = &report.records[1];
    assert!(composed.found_text.contains(r#""n/a" (unreadable)"#));
    assert_eq!(composed.gap.expect("gap").delta, Decimal::from_i64(0));
}

#[test]
fn routing_fills_locations_and_counts_unlocated_records() {
    let mapping = CellMappingIndex::from_mappings(&[TableMapping {
        table_id: "C_03.00".to_string(),
        table_label: "Capital ratios".to_string(),
        cells: vec![MappedCell {
            row_code: "0050".to_string(),
            col_code: "010".to_string(),
            facts: vec![MappedFact {
                concept_local_name: Some("mi53".to_string()),
                context_ref: Some("c7".to_string()),
                ..MappedFact::default()
            }],
            ..MappedCell::default()
        }],
        ..TableMapping::default()
    }]);
    let pipeline = DiagnosticsPipeline::new(
        PipelineContext::new("run-3").with_mapping(Arc::new(mapping)),
    );

    let mut located = RawEvent::new(
        "xbrldie:PrimaryItemDimensionallyInvalidError",
        "Fact is not dimensionally valid",
        Severity::Error,
    );
    located.concept_ln = Some("mi53".to_string());
    located.context_ref = Some("c7".to_string());
    let banner = RawEvent::new("xbrl.4.9", "Context c3 has an invalid period", Severity::Error);

    let report = pipeline.run(&[located, banner]);
    let record = &report.records[0];
    assert_eq!(record.category, Category::Dimensions);
    assert_eq!(record.table_id.as_deref(), Some("C_03.00"));
    assert_eq!(record.row_code.as_ref().unwrap().as_str(), "0050");
    assert!(report.records[1].table_id.is_none());
    assert_eq!(report.diagnostics.count(FailureKind::NoLocationResolved), 1);
}

#[test]
fn coverage_is_reported_against_the_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let store = BaselineStore::new(dir.path());
    let key = BaselineKey::new("corep_of", "3.4").unwrap();
    let tracker = || CoverageTracker::new(Arc::new(BaselineCache::new()), store.clone());

    let pipeline_with = |request: CoverageRequest| {
        DiagnosticsPipeline::new(PipelineContext::new("run-4").with_coverage(request))
    };
    let events = [v_code_event("v0001_m"), v_code_event("v0002_m"), v_code_event("v0003_m")];

    let report = pipeline_with(CoverageRequest {
        tracker: tracker(),
        key: key.clone(),
        current_hash: None,
    })
    .run(&events);
    assert!(matches!(
        report.coverage,
        Some(CoverageStatus::Unavailable {
            reason: UnavailableReason::Missing,
            rule_ids_seen_approx: 3,
            ..
        })
    ));
    assert_eq!(report.diagnostics.count(FailureKind::StaleOrMissingBaseline), 1);

    let counts: BTreeMap<String, u64> = [("v0001_m", 2), ("v0002_m", 1)]
        .into_iter()
        .map(|(id, count)| (id.to_string(), count))
        .collect();
    let census = RuleCensus {
        counts,
        content_hash: "h1".to_string(),
    };
    store
        .save(&BaselineSnapshot::from_census(&key, census, Utc::now()))
        .unwrap();

    let report = pipeline_with(CoverageRequest {
        tracker: tracker(),
        key,
        current_hash: Some("h1".to_string()),
    })
    .run(&events);
    let summary = report.coverage.as_ref().and_then(CoverageStatus::summary).unwrap();
    assert_eq!(summary.rule_ids_seen_approx, 3);
    assert_eq!(summary.baseline_present_count, 2);
    assert!(summary.approx_complete);
    assert_eq!(report.diagnostics.total(), 0);
}

#[test]
fn no_events_yield_an_empty_report() {
    let report = pipeline(PipelineOptions::default()).run(&[]);
    assert!(report.is_empty());
    assert_eq!(report.event_count, 0);
    assert!(report.coverage.is_none());
}
