//! Loading a run's input files into a pipeline context.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use xbrl_core::{FactIndex, FailureSample, PipelineContext, RunDiagnostics};
use xbrl_map::CellMappingRegistry;
use xbrl_ingest::SkippedEvent;
use xbrl_model::{FailureKind, PipelineOptions, RawEvent};
use xbrl_standards::{CatalogConfig, MessageCatalog};

/// Files produced by the validation engine for one run.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub events: PathBuf,
    pub rules: Option<PathBuf>,
    pub facts: Option<PathBuf>,
    pub mappings: Option<PathBuf>,
}

/// A context ready to run, minus coverage, plus the events to feed it.
pub struct LoadedRun {
    pub context: PipelineContext,
    pub events: Vec<RawEvent>,
    /// Entries of the events file that could not be read.
    pub skipped: Vec<SkippedEvent>,
}

pub fn load_run(
    run_id: &str,
    inputs: &RunInputs,
    options: PipelineOptions,
    catalog: &CatalogConfig,
    registry: &CellMappingRegistry,
) -> Result<LoadedRun> {
    let batch = xbrl_ingest::load_events(&inputs.events)
        .with_context(|| format!("load events from {}", inputs.events.display()))?;
    let (events, skipped) = (batch.events, batch.skipped);

    let mut context = PipelineContext::new(run_id).with_options(options);

    if let Some(path) = &inputs.rules {
        let rules = xbrl_ingest::load_rules(path)
            .with_context(|| format!("load rule metadata from {}", path.display()))?;
        context = context.with_rules(rules);
    }

    if let Some(path) = &inputs.facts {
        let facts = xbrl_ingest::load_facts(path)
            .with_context(|| format!("load facts from {}", path.display()))?;
        context = context.with_facts(FactIndex::new(facts));
    }

    if !catalog.roots.is_empty() {
        let loaded = MessageCatalog::load_roots(&catalog.lang, &catalog.roots)
            .context("load message catalog")?;
        context = context.with_catalog(Arc::new(loaded));
    }

    if let Some(dir) = &inputs.mappings {
        let index = registry
            .load_dir(run_id, dir)
            .with_context(|| format!("load cell mappings from {}", dir.display()))?;
        context = context.with_mapping(index);
    }

    tracing::debug!(
        run_id,
        events = events.len(),
        skipped = skipped.len(),
        rules = context.rules.len(),
        facts = context.facts.len(),
        "run inputs loaded"
    );
    Ok(LoadedRun {
        context,
        events,
        skipped,
    })
}

/// Counts unreadable event entries alongside the run's other failures.
pub fn record_skipped_events(diagnostics: &mut RunDiagnostics, skipped: &[SkippedEvent]) {
    for entry in skipped {
        diagnostics.record(FailureSample {
            kind: FailureKind::MalformedEvent,
            code: String::new(),
            rule_id: None,
            detail: entry.to_string(),
        });
    }
}
