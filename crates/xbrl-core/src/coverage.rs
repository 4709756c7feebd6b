//! Rule coverage of a run against the baseline for its entry point.

use std::collections::BTreeSet;
use std::sync::Arc;

use xbrl_model::{CoverageStatus, CoverageSummary, RebuildPhase, UnavailableReason};
use xbrl_standards::{
    BaselineCache, BaselineKey, BaselineRebuilder, BaselineSnapshot, BaselineStore,
};

/// Seen count against the baseline's present count. Equality is not
/// required; conditionally inapplicable rules never fire.
pub fn summarize(snapshot: &BaselineSnapshot, seen: &BTreeSet<String>) -> CoverageSummary {
    CoverageSummary {
        rule_ids_seen_approx: seen.len(),
        baseline_present_count: snapshot.present_count,
        baseline_hash: snapshot.hash.clone(),
        entrypoint_id: snapshot.entrypoint_id.clone(),
        taxonomy_version: snapshot.taxonomy_version.clone(),
        approx_complete: seen.len() >= snapshot.present_count,
    }
}

pub struct CoverageTracker {
    cache: Arc<BaselineCache>,
    store: BaselineStore,
    rebuilder: Option<Arc<BaselineRebuilder>>,
}

impl CoverageTracker {
    pub fn new(cache: Arc<BaselineCache>, store: BaselineStore) -> Self {
        Self {
            cache,
            store,
            rebuilder: None,
        }
    }

    /// Missing or stale baselines are queued on `rebuilder`.
    #[must_use]
    pub fn with_rebuilder(mut self, rebuilder: Arc<BaselineRebuilder>) -> Self {
        self.rebuilder = Some(rebuilder);
        self
    }

    /// Never waits for a build. `current_hash` is the taxonomy content hash
    /// when known; without it a cached baseline is taken as fresh.
    pub fn assess(
        &self,
        key: &BaselineKey,
        seen: &BTreeSet<String>,
        current_hash: Option<&str>,
    ) -> CoverageStatus {
        let snapshot = self
            .cache
            .get_or_load(&self.store, key)
            .unwrap_or_else(|err| {
                tracing::warn!(baseline = %key, error = %err, "baseline unreadable");
                None
            });
        let reason = match snapshot {
            Some(snapshot) if current_hash.is_none_or(|hash| !snapshot.is_stale(hash)) => {
                return CoverageStatus::Available(summarize(&snapshot, seen));
            }
            Some(_) => UnavailableReason::Stale,
            None => UnavailableReason::Missing,
        };

        let rebuild = self
            .rebuilder
            .as_ref()
            .map_or(RebuildPhase::NotScheduled, |rebuilder| rebuilder.schedule(key));
        tracing::info!(baseline = %key, ?reason, ?rebuild, "coverage unavailable");
        CoverageStatus::Unavailable {
            entrypoint_id: key.entrypoint_id.clone(),
            taxonomy_version: key.taxonomy_version.clone(),
            rule_ids_seen_approx: seen.len(),
            reason,
            rebuild,
        }
    }
}
