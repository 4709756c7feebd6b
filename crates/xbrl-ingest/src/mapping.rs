//! Rendered-template cell-mapping sidecars (`<table_id>.mapping.json`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::events::read_text;

const SIDECAR_SUFFIX: &str = ".mapping.json";

/// Dimension/member pair qualifying a cell or fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qualifier {
    pub dimension: String,
    #[serde(default)]
    pub member: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedFact {
    #[serde(default)]
    pub fact_id: Option<String>,
    #[serde(default)]
    pub concept_namespace: Option<String>,
    #[serde(default)]
    pub concept_local_name: Option<String>,
    #[serde(default)]
    pub context_ref: Option<String>,
    #[serde(default)]
    pub unit_ref: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub dimensions: Vec<Qualifier>,
}

impl MappedFact {
    /// Explicit fact id, or `local@context` when the sidecar has none.
    pub fn fact_id(&self) -> String {
        if let Some(id) = self.fact_id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        format!(
            "{}@{}",
            self.concept_local_name.as_deref().unwrap_or_default(),
            self.context_ref.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedCell {
    #[serde(default)]
    pub row_code: String,
    #[serde(default)]
    pub col_code: String,
    #[serde(default)]
    pub row_display_code: Option<String>,
    #[serde(default)]
    pub col_display_code: Option<String>,
    #[serde(default)]
    pub row_label: String,
    #[serde(default)]
    pub col_label: String,
    #[serde(default)]
    pub facts: Vec<MappedFact>,
    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,
}

impl MappedCell {
    /// Display code when the renderer provided one, else the derived code.
    pub fn effective_row_code(&self) -> &str {
        self.row_display_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .unwrap_or(&self.row_code)
    }

    pub fn effective_col_code(&self) -> &str {
        self.col_display_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .unwrap_or(&self.col_code)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMapping {
    #[serde(default)]
    pub table_id: String,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub table_label: String,
    #[serde(default)]
    pub rule_ids: Vec<String>,
    #[serde(default)]
    pub cells: Vec<MappedCell>,
}

/// Lists `*.mapping.json` files in `dir`, sorted by file name.
pub fn list_mapping_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_sidecar = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(SIDECAR_SUFFIX));
        if path.is_file() && is_sidecar {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn load_table_mapping(path: &Path) -> Result<TableMapping> {
    let text = read_text(path)?;
    let mut mapping: TableMapping =
        serde_json::from_str(&text).map_err(|e| IngestError::json(path, e))?;
    if mapping.table_id.is_empty()
        && let Some(stem) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(SIDECAR_SUFFIX))
    {
        mapping.table_id = stem.to_string();
    }
    Ok(mapping)
}

/// Loads every sidecar in `dir`. Unreadable sidecars are skipped with a
/// warning.
pub fn load_table_mappings(dir: &Path) -> Result<Vec<TableMapping>> {
    let mut mappings = Vec::new();
    for path in list_mapping_files(dir)? {
        match load_table_mapping(&path) {
            Ok(mapping) => mappings.push(mapping),
            Err(err) => tracing::warn!(error = %err, "skipping cell-mapping sidecar"),
        }
    }
    tracing::debug!(dir = %dir.display(), tables = mappings.len(), "loaded cell mappings");
    Ok(mappings)
}
