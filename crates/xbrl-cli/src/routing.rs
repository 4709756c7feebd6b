//! Routing a stored finding to template cells.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use xbrl_map::{CellMappingIndex, ErrorRouter, RouteResult};
use xbrl_model::DiagnosticRecord;

/// Finds the record whose id starts with `id` in a `run --output` file and
/// routes it against the sidecars in `mappings`.
pub fn route_finding(
    records: &Path,
    mappings: &Path,
    id: &str,
) -> Result<(DiagnosticRecord, RouteResult)> {
    let file = File::open(records).with_context(|| format!("open {}", records.display()))?;
    let stored: Vec<DiagnosticRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse records from {}", records.display()))?;
    let record = find_record(stored, id)?;

    let tables = xbrl_ingest::load_table_mappings(mappings)
        .with_context(|| format!("load cell mappings from {}", mappings.display()))?;
    let index = CellMappingIndex::from_mappings(&tables);
    let route = ErrorRouter::new(&index).route(&record);
    Ok((record, route))
}

fn find_record(records: Vec<DiagnosticRecord>, id: &str) -> Result<DiagnosticRecord> {
    let id = id.trim();
    let mut matches: Vec<DiagnosticRecord> = records
        .into_iter()
        .filter(|record| {
            !id.is_empty() && (record.id_full.starts_with(id) || record.id.starts_with(id))
        })
        .collect();
    match matches.len() {
        0 => bail!("no record with id {id}"),
        1 => Ok(matches.remove(0)),
        n => bail!("id prefix {id} matches {n} records"),
    }
}
