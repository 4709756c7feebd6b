//! Per-run index over rendered-template cells.
//!
//! Built once from the table sidecars of a run and then only read.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use xbrl_ingest::{MappedCell, Qualifier, TableMapping};
use xbrl_model::{ColCode, RowCode};

/// Exact address of a cell in a rendered template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellLocation {
    pub table_id: String,
    pub row_code: RowCode,
    pub col_code: ColCode,
}

impl CellLocation {
    pub fn new(table_id: impl Into<String>, row_code: RowCode, col_code: ColCode) -> Self {
        Self {
            table_id: table_id.into(),
            row_code,
            col_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellEntry {
    pub location: CellLocation,
    pub row_label: String,
    pub col_label: String,
    pub candidate_fact_ids: Vec<String>,
}

/// What a table is known to hold, for candidate ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableProfile {
    pub table_id: String,
    pub table_label: String,
    pub rule_ids: BTreeSet<String>,
    /// Concept local names appearing in any cell.
    pub concepts: BTreeSet<String>,
    /// Dimension names qualifying any cell or fact.
    pub dimensions: BTreeSet<String>,
}

#[derive(Debug, Clone)]
struct FactPointer {
    concept_ns: Option<String>,
    location: CellLocation,
}

/// `(table_id, row_code, col_code) -> candidate_fact_ids`, plus the reverse
/// concept/context lookup used for exact routing.
#[derive(Debug, Clone, Default)]
pub struct CellMappingIndex {
    cells: BTreeMap<CellLocation, CellEntry>,
    by_fact: HashMap<(String, String), Vec<FactPointer>>,
    /// Dimensional qualifiers of each context seen on a mapped fact.
    contexts: HashMap<String, Vec<Qualifier>>,
    tables: BTreeMap<String, TableProfile>,
    skipped_cells: usize,
}

impl CellMappingIndex {
    pub fn from_mappings(mappings: &[TableMapping]) -> Self {
        let mut index = Self::default();
        for mapping in mappings {
            index.add_table(mapping);
        }
        tracing::debug!(
            tables = index.tables.len(),
            cells = index.cells.len(),
            skipped = index.skipped_cells,
            "built cell-mapping index"
        );
        index
    }

    fn add_table(&mut self, mapping: &TableMapping) {
        let table_id = mapping.table_id.trim().to_string();
        if table_id.is_empty() {
            return;
        }
        let profile = self
            .tables
            .entry(table_id.clone())
            .or_insert_with(|| TableProfile {
                table_id: table_id.clone(),
                ..TableProfile::default()
            });
        if profile.table_label.is_empty() {
            profile.table_label = mapping
                .table_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| mapping.table_label.clone());
        }
        profile.rule_ids.extend(
            mapping
                .rule_ids
                .iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        );

        for cell in &mapping.cells {
            let Some(location) = cell_location(&table_id, cell) else {
                self.skipped_cells += 1;
                continue;
            };
            profile
                .dimensions
                .extend(cell.qualifiers.iter().map(|q| q.dimension.clone()));
            let entry = self
                .cells
                .entry(location.clone())
                .or_insert_with(|| CellEntry {
                    location: location.clone(),
                    row_label: cell.row_label.clone(),
                    col_label: cell.col_label.clone(),
                    candidate_fact_ids: Vec::new(),
                });
            for fact in &cell.facts {
                let fact_id = fact.fact_id();
                if !entry.candidate_fact_ids.contains(&fact_id) {
                    entry.candidate_fact_ids.push(fact_id);
                }
                profile
                    .dimensions
                    .extend(fact.dimensions.iter().map(|q| q.dimension.clone()));
                if let Some(context) = fact.context_ref.as_deref().filter(|s| !s.is_empty()) {
                    let known = self.contexts.entry(context.to_string()).or_default();
                    for qualifier in &fact.dimensions {
                        if !known.contains(qualifier) {
                            known.push(qualifier.clone());
                        }
                    }
                }
                let Some(local) = fact.concept_local_name.as_deref().filter(|s| !s.is_empty())
                else {
                    continue;
                };
                profile.concepts.insert(local.to_string());
                if let Some(context) = fact.context_ref.as_deref().filter(|s| !s.is_empty()) {
                    self.by_fact
                        .entry((local.to_string(), context.to_string()))
                        .or_default()
                        .push(FactPointer {
                            concept_ns: fact.concept_namespace.clone(),
                            location: location.clone(),
                        });
                }
            }
        }
    }

    pub fn cell(&self, location: &CellLocation) -> Option<&CellEntry> {
        self.cells.get(location)
    }

    /// Cells carrying a fact for `concept_ln` in `context_ref`. A namespace
    /// only filters when both sides have one.
    pub fn cells_for_fact(
        &self,
        concept_ns: Option<&str>,
        concept_ln: &str,
        context_ref: &str,
    ) -> Vec<&CellEntry> {
        let key = (concept_ln.to_string(), context_ref.to_string());
        let Some(pointers) = self.by_fact.get(&key) else {
            return Vec::new();
        };
        let mut locations: Vec<&CellLocation> = pointers
            .iter()
            .filter(|pointer| match (concept_ns, pointer.concept_ns.as_deref()) {
                (Some(wanted), Some(found)) => wanted == found,
                _ => true,
            })
            .map(|pointer| &pointer.location)
            .collect();
        locations.sort();
        locations.dedup();
        locations
            .into_iter()
            .filter_map(|location| self.cells.get(location))
            .collect()
    }

    /// Qualifiers of `context_ref`, empty for an unknown or undimensioned
    /// context.
    pub fn context_dimensions(&self, context_ref: &str) -> &[Qualifier] {
        self.contexts
            .get(context_ref.trim())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Cells at `(row, col)` in any table.
    pub fn cells_at(&self, row_code: &RowCode, col_code: &ColCode) -> Vec<&CellEntry> {
        self.cells
            .values()
            .filter(|entry| {
                &entry.location.row_code == row_code && &entry.location.col_code == col_code
            })
            .collect()
    }

    pub fn table(&self, table_id: &str) -> Option<&TableProfile> {
        self.tables.get(table_id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableProfile> {
        self.tables.values()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Cells dropped because their codes were not numeric.
    pub fn skipped_cells(&self) -> usize {
        self.skipped_cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.tables.is_empty()
    }
}

fn cell_location(table_id: &str, cell: &MappedCell) -> Option<CellLocation> {
    let row_code = RowCode::new(cell.effective_row_code()).ok()?;
    let col_code = ColCode::new(cell.effective_col_code()).ok()?;
    Some(CellLocation::new(table_id, row_code, col_code))
}
