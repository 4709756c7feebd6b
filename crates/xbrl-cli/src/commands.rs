use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use comfy_table::Table;
use tracing::{info, info_span, warn};

use xbrl_cli::coverage::coverage_setup;
use xbrl_cli::inputs::{RunInputs, load_run, record_skipped_events};
use xbrl_cli::routing::route_finding;
use xbrl_core::{DiagnosticsPipeline, RunReport};
use xbrl_map::{CellMappingRegistry, RouteResult};
use xbrl_model::{Category, DiagnosticRecord, NonActionableMode, Profile};
use xbrl_standards::{
    BaselineCache, BaselineKey, BaselineRebuilder, BaselineSnapshot, BaselineSource,
    BaselineStore, DiagnosticsConfig, RebuildState, TaxonomyAssertionSource, taxonomy_hash,
};

use crate::cli::{BaselineArgs, ProfileArg, RouteArgs, RunArgs};
use crate::summary::apply_table_style;

pub fn run_categories() {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Label"]);
    apply_table_style(&mut table);
    for category in Category::ALL {
        table.add_row(vec![category.as_str(), category.label()]);
    }
    println!("{table}");
}

/// A finished run plus the baseline worker it may have started.
pub struct RunOutcome {
    pub report: RunReport,
    /// Dropped after the summary is printed; the drop waits for the build.
    pub pending_rebuild: Option<Arc<BaselineRebuilder>>,
}

pub fn run_diagnostics(args: &RunArgs, config: &DiagnosticsConfig) -> Result<RunOutcome> {
    let run_id = args.run_id.clone().unwrap_or_else(|| derive_run_id(&args.events));
    let run_span = info_span!("run", run_id = %run_id);
    let _run_guard = run_span.enter();

    let mut options = config.pipeline.clone();
    if args.audit {
        options.nonactionable_mode = NonActionableMode::Audit;
    }
    if let Some(profile) = args.profile {
        options.profile = match profile {
            ProfileArg::Fast => Profile::Fast,
            ProfileArg::Full => Profile::Full,
        };
    }

    let inputs = RunInputs {
        events: args.events.clone(),
        rules: args.rules.clone(),
        facts: args.facts.clone(),
        mappings: args.mappings.clone(),
    };
    let registry = CellMappingRegistry::new();
    let loaded = load_run(&run_id, &inputs, options, &config.catalog, &registry)?;

    let mut context = loaded.context;
    let mut pending_rebuild = None;
    if let (Some(entrypoint), Some(version)) = (&args.entrypoint, &args.taxonomy_version) {
        let key = BaselineKey::new(entrypoint, version).context("baseline key")?;
        let store = BaselineStore::new(baseline_dir(args.baseline_dir.as_ref(), config));
        let mut source: Option<Arc<dyn BaselineSource>> = None;
        let mut current_hash = None;
        if let Some(taxonomy_dir) = taxonomy_dir(args.taxonomy_dir.as_ref(), config) {
            let taxonomy = TaxonomyAssertionSource::new(taxonomy_dir);
            current_hash = match taxonomy_hash(&taxonomy.content_root(&key)) {
                Ok(hash) => Some(hash),
                Err(err) => {
                    warn!(error = %err, "taxonomy hash unavailable, staleness not checked");
                    None
                }
            };
            source = Some(Arc::new(taxonomy));
        }
        let setup = coverage_setup(key, store, source, current_hash)?;
        context = context.with_coverage(setup.request);
        pending_rebuild = setup.rebuilder;
    }

    let report = {
        let pipeline = DiagnosticsPipeline::new(context);
        let mut report = pipeline.run(&loaded.events);
        record_skipped_events(&mut report.diagnostics, &loaded.skipped);
        report
    };

    if let Some(path) = &args.output {
        write_records(path, &report.records)?;
        info!(path = %path.display(), records = report.records.len(), "records written");
    }
    Ok(RunOutcome {
        report,
        pending_rebuild,
    })
}

pub fn run_baseline(
    args: &BaselineArgs,
    config: &DiagnosticsConfig,
) -> Result<Arc<BaselineSnapshot>> {
    let key = BaselineKey::new(&args.entrypoint, &args.taxonomy_version)
        .context("baseline key")?;
    let taxonomy_dir = taxonomy_dir(args.taxonomy_dir.as_ref(), config).ok_or_else(|| {
        anyhow!("no taxonomy directory: pass --taxonomy-dir or set baseline.taxonomy_dir")
    })?;
    let store = BaselineStore::new(baseline_dir(args.baseline_dir.as_ref(), config));
    let cache = Arc::new(BaselineCache::new());
    let source = Arc::new(TaxonomyAssertionSource::new(taxonomy_dir));
    let rebuilder = BaselineRebuilder::spawn(source, store.clone(), cache)
        .context("start baseline worker")?;

    rebuilder.schedule(&key);
    let state = rebuilder.wait_for(&key, Duration::from_secs(args.timeout_secs));
    match state {
        Some(RebuildState::Ready(snapshot)) => {
            info!(
                baseline = %key,
                path = %store.path_for(&key).display(),
                present = snapshot.present_count,
                "baseline ready"
            );
            Ok(snapshot)
        }
        Some(RebuildState::Failed(message)) => bail!("baseline build failed: {message}"),
        Some(_) | None => bail!(
            "baseline build for {key} did not finish within {}s",
            args.timeout_secs
        ),
    }
}

pub fn run_route(args: &RouteArgs) -> Result<(DiagnosticRecord, RouteResult)> {
    route_finding(&args.records, &args.mappings, &args.id)
}

fn write_records(path: &Path, records: &[DiagnosticRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .with_context(|| format!("write {}", path.display()))
}

fn baseline_dir(explicit: Option<&PathBuf>, config: &DiagnosticsConfig) -> PathBuf {
    explicit
        .cloned()
        .unwrap_or_else(|| config.baseline.dir.clone())
}

fn taxonomy_dir(explicit: Option<&PathBuf>, config: &DiagnosticsConfig) -> Option<PathBuf> {
    explicit
        .cloned()
        .or_else(|| config.baseline.taxonomy_dir.clone())
}

fn derive_run_id(events: &Path) -> String {
    events
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("run")
        .to_string()
}
