//! Coverage wiring for a diagnostics run.

use std::sync::Arc;

use anyhow::{Context, Result};
use xbrl_core::{CoverageRequest, CoverageTracker};
use xbrl_standards::{BaselineCache, BaselineKey, BaselineRebuilder, BaselineSource, BaselineStore};

pub struct CoverageSetup {
    pub request: CoverageRequest,
    /// Worker that builds missing or stale baselines. Dropping the last
    /// handle waits for queued builds, so hold it until output is printed.
    pub rebuilder: Option<Arc<BaselineRebuilder>>,
}

/// Without a source, a missing baseline is reported but never rebuilt.
pub fn coverage_setup(
    key: BaselineKey,
    store: BaselineStore,
    source: Option<Arc<dyn BaselineSource>>,
    current_hash: Option<String>,
) -> Result<CoverageSetup> {
    let cache = Arc::new(BaselineCache::new());
    let mut tracker = CoverageTracker::new(Arc::clone(&cache), store.clone());
    let mut rebuilder = None;
    if let Some(source) = source {
        let spawned = Arc::new(
            BaselineRebuilder::spawn(source, store, cache).context("start baseline worker")?,
        );
        tracker = tracker.with_rebuilder(Arc::clone(&spawned));
        rebuilder = Some(spawned);
    }
    Ok(CoverageSetup {
        request: CoverageRequest {
            tracker,
            key,
            current_hash,
        },
        rebuilder,
    })
}
