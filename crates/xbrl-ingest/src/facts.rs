//! Observed fact loading from CSV or JSON.

use std::path::Path;

use xbrl_model::ObservedFact;

use crate::error::{IngestError, Result};
use crate::events::read_text;

pub fn load_facts(path: &Path) -> Result<Vec<ObservedFact>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let facts = match extension.as_str() {
        "csv" => load_facts_csv(path)?,
        "json" => {
            let text = read_text(path)?;
            serde_json::from_str(&text).map_err(|e| IngestError::json(path, e))?
        }
        _ => {
            return Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("expected .csv or .json, got {extension:?}"),
            });
        }
    };
    tracing::debug!(path = %path.display(), facts = facts.len(), "loaded observed facts");
    Ok(facts)
}

fn load_facts_csv(path: &Path) -> Result<Vec<ObservedFact>> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let mut facts = Vec::new();
    for row in reader.deserialize::<ObservedFact>() {
        let mut fact = row.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        for field in [&mut fact.table_id, &mut fact.row_code, &mut fact.col_code] {
            if field.as_deref().is_some_and(|value| value.trim().is_empty()) {
                *field = None;
            }
        }
        facts.push(fact);
    }
    Ok(facts)
}
