//! Cell-mapping indexes shared across the handlers of one run.

use std::path::Path;
use std::sync::Arc;

use xbrl_standards::SnapshotCache;

use crate::index::CellMappingIndex;

/// Indexes keyed by run id. A rebuilt index replaces the old one whole;
/// handles already handed out keep the previous snapshot.
#[derive(Debug, Default)]
pub struct CellMappingRegistry {
    indexes: SnapshotCache<String, CellMappingIndex>,
}

impl CellMappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, run_id: &str) -> Option<Arc<CellMappingIndex>> {
        self.indexes.get(&run_id.to_string())
    }

    pub fn publish(
        &self,
        run_id: impl Into<String>,
        index: CellMappingIndex,
    ) -> Arc<CellMappingIndex> {
        self.indexes.swap(run_id.into(), index)
    }

    /// Builds the index from the run's `*.mapping.json` sidecars and
    /// publishes it.
    pub fn load_dir(
        &self,
        run_id: impl Into<String>,
        dir: &Path,
    ) -> xbrl_ingest::Result<Arc<CellMappingIndex>> {
        let run_id = run_id.into();
        let mappings = xbrl_ingest::load_table_mappings(dir)?;
        let index = CellMappingIndex::from_mappings(&mappings);
        tracing::info!(
            run_id = %run_id,
            tables = index.table_count(),
            cells = index.cell_count(),
            "published cell mapping"
        );
        Ok(self.publish(run_id, index))
    }

    pub fn evict(&self, run_id: &str) -> Option<Arc<CellMappingIndex>> {
        self.indexes.remove(&run_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}
