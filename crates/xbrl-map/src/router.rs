//! Routing diagnostics to template cells.
//!
//! An exact cell is reported when the record's concept and context, or its
//! row and column codes, point at a mapped cell. Otherwise tables are ranked
//! on the evidence the record carries, each score broken into components.
//! A record with no evidence yields no candidates at all.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;
use xbrl_ingest::Qualifier;
use xbrl_model::DiagnosticRecord;

use crate::index::{CellEntry, CellLocation, CellMappingIndex, TableProfile};

const EXACT_CELL_WEIGHT: f32 = 10.0;
const RULE_ID_WEIGHT: f32 = 3.0;
const CONCEPT_WEIGHT: f32 = 2.0;
const IMPLICATED_TABLE_WEIGHT: f32 = 1.0;

/// A component contributing to a candidate's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    pub value: f32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCandidate {
    pub table_id: String,
    pub table_label: String,
    pub score: f32,
    /// Breakdown of score components for explainability.
    pub explanation: Vec<ScoreComponent>,
}

impl TableCandidate {
    pub fn explain(&self) -> String {
        self.explanation
            .iter()
            .map(|c| format!("{}: {:.2}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBasis {
    ConceptContext,
    Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactMatch {
    pub cell: CellEntry,
    pub basis: MatchBasis,
    /// Other cells the same evidence points at.
    pub alternatives: Vec<CellLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteResult {
    pub exact: Option<ExactMatch>,
    /// Ranked best first.
    pub candidates: Vec<TableCandidate>,
}

impl RouteResult {
    pub fn best(&self) -> Option<&TableCandidate> {
        self.candidates.first()
    }

    pub fn location(&self) -> Option<&CellLocation> {
        self.exact.as_ref().map(|exact| &exact.cell.location)
    }

    /// Nothing to highlight; the caller shows the record as a banner.
    pub fn is_no_location(&self) -> bool {
        self.exact.is_none() && self.candidates.is_empty()
    }
}

pub struct ErrorRouter<'a> {
    index: &'a CellMappingIndex,
}

impl<'a> ErrorRouter<'a> {
    pub fn new(index: &'a CellMappingIndex) -> Self {
        Self { index }
    }

    /// Routes `record`, scoring dimension coverage with the qualifiers the
    /// index knows for its context.
    pub fn route(&self, record: &DiagnosticRecord) -> RouteResult {
        let dimensions = record
            .context_ref
            .as_deref()
            .map_or(&[][..], |context| self.index.context_dimensions(context));
        self.route_with_dimensions(record, dimensions)
    }

    /// Routes `record` with explicitly supplied context qualifiers.
    pub fn route_with_dimensions(
        &self,
        record: &DiagnosticRecord,
        dimensions: &[Qualifier],
    ) -> RouteResult {
        let exact = self
            .exact_by_fact(record)
            .or_else(|| self.exact_by_coordinates(record));
        let has_evidence = record.has_concept() || record.table_id.is_some();

        let mut candidates: Vec<TableCandidate> = if has_evidence || exact.is_some() {
            self.index
                .tables()
                .filter_map(|table| score_table(table, record, dimensions, exact.as_ref()))
                .collect()
        } else {
            Vec::new()
        };
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.table_id.cmp(&b.table_id))
        });

        if exact.is_none() && candidates.is_empty() {
            tracing::debug!(record_id = %record.id, "no location resolved");
        }
        RouteResult { exact, candidates }
    }

    fn exact_by_fact(&self, record: &DiagnosticRecord) -> Option<ExactMatch> {
        let concept_ln = record.concept_ln.as_deref()?;
        let context_ref = record.context_ref.as_deref()?;
        let cells = self
            .index
            .cells_for_fact(record.concept_ns.as_deref(), concept_ln, context_ref);
        pick_exact(&cells, record.table_id.as_deref(), MatchBasis::ConceptContext)
    }

    fn exact_by_coordinates(&self, record: &DiagnosticRecord) -> Option<ExactMatch> {
        let row_code = record.row_code.as_ref()?;
        let col_code = record.col_code.as_ref()?;
        if let Some(table_id) = record.table_id.as_deref() {
            let location = CellLocation::new(table_id, row_code.clone(), col_code.clone());
            return self.index.cell(&location).map(|cell| ExactMatch {
                cell: cell.clone(),
                basis: MatchBasis::Coordinates,
                alternatives: Vec::new(),
            });
        }
        // Without a table the pair only counts when a single table has it.
        let cells = self.index.cells_at(row_code, col_code);
        if cells.len() != 1 {
            return None;
        }
        pick_exact(&cells, None, MatchBasis::Coordinates)
    }
}

fn pick_exact(
    cells: &[&CellEntry],
    preferred_table: Option<&str>,
    basis: MatchBasis,
) -> Option<ExactMatch> {
    let chosen = preferred_table
        .and_then(|table| cells.iter().position(|c| c.location.table_id == table))
        .unwrap_or(0);
    let cell = (*cells.get(chosen)?).clone();
    let alternatives = cells
        .iter()
        .enumerate()
        .filter(|(position, _)| *position != chosen)
        .map(|(_, c)| c.location.clone())
        .collect();
    Some(ExactMatch {
        cell,
        basis,
        alternatives,
    })
}

fn score_table(
    table: &TableProfile,
    record: &DiagnosticRecord,
    dimensions: &[Qualifier],
    exact: Option<&ExactMatch>,
) -> Option<TableCandidate> {
    let mut explanation = Vec::new();

    if let Some(exact) = exact
        && exact.cell.location.table_id == table.table_id
    {
        explanation.push(ScoreComponent {
            name: "Exact cell",
            value: EXACT_CELL_WEIGHT,
            description: format!(
                "row {} column {}",
                exact.cell.location.row_code, exact.cell.location.col_code
            ),
        });
    }

    if let Some(rule_id) = record.rule_id.as_deref()
        && table.rule_ids.contains(rule_id)
    {
        explanation.push(ScoreComponent {
            name: "Rule id",
            value: RULE_ID_WEIGHT,
            description: format!("{rule_id} is rendered in this table"),
        });
    }

    if let Some(concept) = record.concept_ln.as_deref()
        && table.concepts.contains(concept)
    {
        explanation.push(ScoreComponent {
            name: "Concept",
            value: CONCEPT_WEIGHT,
            description: format!("{concept} appears in this table"),
        });
        let coverage = dimension_coverage(dimensions, &table.dimensions);
        if coverage > 0.0 {
            explanation.push(ScoreComponent {
                name: "Dimension coverage",
                value: coverage,
                description: format!("{:.0}% of context dimensions", coverage * 100.0),
            });
        }
    }

    if record.table_id.as_deref() == Some(table.table_id.as_str()) {
        explanation.push(ScoreComponent {
            name: "Implicated table",
            value: IMPLICATED_TABLE_WEIGHT,
            description: format!("record refers to {}", table.table_id),
        });
    }

    if explanation.is_empty() {
        return None;
    }
    Some(TableCandidate {
        table_id: table.table_id.clone(),
        table_label: table.table_label.clone(),
        score: explanation.iter().map(|c| c.value).sum(),
        explanation,
    })
}

/// Fraction of the context's dimensions the table is qualified by.
fn dimension_coverage(dimensions: &[Qualifier], table_dimensions: &BTreeSet<String>) -> f32 {
    let wanted: BTreeSet<&str> = dimensions.iter().map(|q| q.dimension.as_str()).collect();
    if wanted.is_empty() {
        return 0.0;
    }
    let covered = wanted
        .iter()
        .filter(|dimension| table_dimensions.contains(**dimension))
        .count();
    covered as f32 / wanted.len() as f32
}
