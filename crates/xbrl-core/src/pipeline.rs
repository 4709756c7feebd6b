//! End-to-end diagnostics run: classification, rule synthesis, filtering,
//! routing and coverage.
//!
//! Per-event work (classify, enrich, build, analyze, compose) touches no
//! shared mutable state and runs on the rayon pool. Run-level stages
//! (filter, profile, dedupe, routing, ids, counts, coverage) run in order on
//! the collected records.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use xbrl_map::{CellMappingIndex, ErrorRouter};
use xbrl_model::{
    Category, CoverageStatus, DiagnosticRecord, FailureKind, PipelineOptions, Profile, RawEvent,
    RuleDefinition, RuleInstance,
};
use xbrl_standards::{BaselineKey, MessageCatalog};

use crate::classify::Classifier;
use crate::compose::MessageComposer;
use crate::coverage::CoverageTracker;
use crate::dedupe::dedupe_formula_records;
use crate::enrich::{CatalogLookup, Enricher};
use crate::facts::FactIndex;
use crate::filter::NonActionableFilter;
use crate::heuristics::analyze;
use crate::ids::assign_ids;
use crate::report::{
    CatalogStats, FailureSample, RunDiagnostics, RunReport, category_counts, top_codes,
};
use crate::rule_builder::{build_rule, unparseable_terms};

/// Baseline to compare the run's rule ids against.
pub struct CoverageRequest {
    pub tracker: CoverageTracker,
    pub key: BaselineKey,
    /// Content hash of the taxonomy currently in use, when known.
    pub current_hash: Option<String>,
}

/// Everything one run reads. Built once, shared read-only by the workers.
pub struct PipelineContext {
    pub run_id: String,
    pub options: PipelineOptions,
    pub rules: BTreeMap<String, RuleDefinition>,
    pub facts: FactIndex,
    pub catalog: Option<Arc<MessageCatalog>>,
    pub mapping: Option<Arc<CellMappingIndex>>,
    pub coverage: Option<CoverageRequest>,
    classifier: Classifier,
}

impl PipelineContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            options: PipelineOptions::default(),
            rules: BTreeMap::new(),
            facts: FactIndex::default(),
            catalog: None,
            mapping: None,
            coverage: None,
            classifier: Classifier::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Later definitions for the same rule id replace earlier ones.
    #[must_use]
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = RuleDefinition>) -> Self {
        for rule in rules {
            self.rules.insert(rule.rule_id.trim().to_string(), rule);
        }
        self
    }

    #[must_use]
    pub fn with_facts(mut self, facts: FactIndex) -> Self {
        self.facts = facts;
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<MessageCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: Arc<CellMappingIndex>) -> Self {
        self.mapping = Some(mapping);
        self
    }

    #[must_use]
    pub fn with_coverage(mut self, coverage: CoverageRequest) -> Self {
        self.coverage = Some(coverage);
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }
}

struct EventOutcome {
    record: DiagnosticRecord,
    catalog: CatalogLookup,
    failures: Vec<FailureSample>,
}

pub struct DiagnosticsPipeline {
    context: PipelineContext,
    composer: MessageComposer,
}

impl DiagnosticsPipeline {
    pub fn new(context: PipelineContext) -> Self {
        let composer = MessageComposer::new(context.options.label_max_chars);
        Self { context, composer }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Processes one run. Never fails: per-event problems end up in
    /// [`RunReport::diagnostics`], and no events yield an empty report.
    pub fn run(&self, events: &[RawEvent]) -> RunReport {
        let context = &self.context;
        let span = tracing::info_span!("diagnostics_run", run_id = %context.run_id);
        let _guard = span.enter();
        let started = Instant::now();

        if events.is_empty() {
            tracing::info!("no events received");
            return RunReport::empty(&context.run_id);
        }

        let outcomes: Vec<EventOutcome> = events
            .par_iter()
            .map(|event| self.process_event(event))
            .collect();

        let options = &context.options;
        let mut diagnostics = RunDiagnostics::new(options.sample_limit);
        let mut catalog = CatalogStats::default();
        let mut composed = Vec::with_capacity(outcomes.len());
        for (outcome, event) in outcomes.into_iter().zip(events) {
            match outcome.catalog {
                CatalogLookup::Resolved => catalog.resolved += 1,
                CatalogLookup::Unresolved => catalog.unresolved += 1,
                CatalogLookup::NotApplicable => {}
            }
            for failure in outcome.failures {
                diagnostics.record(failure);
            }
            composed.push((outcome.record, event));
        }

        let filter = NonActionableFilter::new(options.nonactionable_mode, options.sample_limit);
        let (kept, filter_report) = filter.apply(composed);
        let mut records: Vec<DiagnosticRecord> =
            kept.into_iter().map(|(record, _)| record).collect();

        let seen_rule_ids: BTreeSet<String> = records
            .iter()
            .filter_map(|record| record.rule_id.clone())
            .collect();

        let mut formulas_dropped = 0;
        if options.profile == Profile::Fast {
            let before = records.len();
            records.retain(|record| record.category != Category::Formulas);
            formulas_dropped = before - records.len();
        }

        let duplicates_dropped = dedupe_formula_records(&mut records);

        if let Some(index) = context.mapping.as_deref() {
            route_records(index, &mut records, &mut diagnostics);
        }

        assign_ids(&mut records);

        let coverage = context.coverage.as_ref().map(|request| {
            let status = request.tracker.assess(
                &request.key,
                &seen_rule_ids,
                request.current_hash.as_deref(),
            );
            if let CoverageStatus::Unavailable { reason, .. } = &status {
                diagnostics.record(FailureSample {
                    kind: FailureKind::StaleOrMissingBaseline,
                    code: String::new(),
                    rule_id: None,
                    detail: format!("{} baseline is {reason:?}", request.key),
                });
            }
            status
        });

        let report = RunReport {
            run_id: context.run_id.clone(),
            event_count: events.len(),
            category_counts: category_counts(&records),
            top_codes: top_codes(&records, options.top_codes_limit),
            records,
            filter: filter_report,
            duplicates_dropped,
            formulas_dropped,
            catalog,
            coverage,
            diagnostics,
        };
        tracing::info!(
            event_count = report.event_count,
            records = report.records.len(),
            dropped = report.filter.dropped_total,
            duplicates = report.duplicates_dropped,
            failures = report.diagnostics.total(),
            duration_ms = started.elapsed().as_millis(),
            "diagnostics run complete"
        );
        report
    }

    fn process_event(&self, event: &RawEvent) -> EventOutcome {
        let context = &self.context;
        let mut enricher = Enricher::new(&context.facts, context.options.hide_raw_keys);
        if let Some(catalog) = context.catalog.as_deref() {
            enricher = enricher.with_catalog(catalog);
        }
        let enrichment = enricher.enrich(event);

        let mut category = context.classifier.classify(event);
        if enrichment.rule_id.is_some() {
            category = Category::Formulas;
        }

        let mut record =
            DiagnosticRecord::new(event.code.trim(), category, event.severity, enrichment.message);
        record.rule_id = enrichment.rule_id;
        if let Some(cell) = enrichment.cell {
            record.table_id = Some(cell.table_id);
            record.row_code = Some(cell.row_code);
            record.col_code = Some(cell.col_code);
        }
        if let Some((namespace, local)) = enrichment.concept {
            record.concept_ns = Some(namespace).filter(|ns| !ns.is_empty());
            record.concept_ln = Some(local);
        }
        record.context_ref = event
            .context_ref
            .as_deref()
            .map(str::trim)
            .filter(|ctx| !ctx.is_empty())
            .map(str::to_string);

        let mut failures = Vec::new();
        let definition = record
            .rule_id
            .as_deref()
            .and_then(|rule_id| context.rules.get(rule_id));
        if let Some(definition) = definition {
            match build_rule(definition, &context.facts) {
                Ok(rule) => {
                    for term in unparseable_terms(&rule) {
                        failures.push(FailureSample {
                            kind: FailureKind::NormalizationFailure,
                            code: record.code.clone(),
                            rule_id: record.rule_id.clone(),
                            detail: format!(
                                "Row {} column {}: \"{}\"",
                                term.row_code,
                                term.column_code,
                                term.unparsed_text.as_deref().unwrap_or_default()
                            ),
                        });
                    }
                    self.apply_rule(&mut record, &rule);
                }
                Err(err) => {
                    tracing::debug!(
                        rule_id = err.rule_id(),
                        error = %err,
                        "rule metadata incomplete"
                    );
                    failures.push(FailureSample {
                        kind: FailureKind::IncompleteRuleMetadata,
                        code: record.code.clone(),
                        rule_id: record.rule_id.clone(),
                        detail: err.to_string(),
                    });
                }
            }
        }

        if record.title.is_empty() {
            record.title = match record.table_id.as_deref() {
                Some(table_id) => table_id.to_string(),
                None => category.label().to_string(),
            };
        }

        EventOutcome {
            record,
            catalog: enrichment.catalog,
            failures,
        }
    }

    fn apply_rule(&self, record: &mut DiagnosticRecord, rule: &RuleInstance) {
        let flags = analyze(rule);
        let composed = self.composer.compose(rule, &flags);
        record.title = composed.title;
        record.rule_text = composed.rule_text;
        record.found_text = composed.found_text;
        record.gap = composed.gap;
        record.causes_text = composed.causes_text;
        record.fix_text = composed.fix_text;

        if record.table_id.is_none() && !rule.table_id().is_empty() {
            record.table_id = Some(rule.table_id().to_string());
        }
        if record.row_code.is_none() {
            record.row_code = Some(rule.lhs().row_code.clone());
        }
        if record.col_code.is_none() {
            record.col_code = Some(rule.lhs().column_code.clone());
        }
    }
}

/// Fills missing location fields from exact matches. Records with no
/// evidence at all are counted, not guessed.
fn route_records(
    index: &CellMappingIndex,
    records: &mut [DiagnosticRecord],
    diagnostics: &mut RunDiagnostics,
) {
    let router = ErrorRouter::new(index);
    for record in records.iter_mut() {
        let route = router.route(record);
        if let Some(location) = route.location() {
            if record.table_id.is_none() {
                record.table_id = Some(location.table_id.clone());
            }
            record.row_code.get_or_insert_with(|| location.row_code.clone());
            record.col_code.get_or_insert_with(|| location.col_code.clone());
        } else if route.is_no_location() {
            diagnostics.record(FailureSample {
                kind: FailureKind::NoLocationResolved,
                code: record.code.clone(),
                rule_id: record.rule_id.clone(),
                detail: record.message.clone(),
            });
        }
    }
}
