#![deny(unsafe_code)]

//! Baseline snapshots: the census of rule ids expected for one entrypoint
//! and taxonomy version, persisted as JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StandardsError;

const IDS_SAMPLE_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaselineKey {
    pub entrypoint_id: String,
    pub taxonomy_version: String,
}

fn validate_segment(kind: &str, value: &str) -> Result<(), StandardsError> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.chars().any(char::is_control);
    if invalid {
        return Err(StandardsError::InvalidKey {
            message: format!("{kind} {value:?} cannot be used as a path segment"),
        });
    }
    Ok(())
}

impl BaselineKey {
    pub fn new(
        entrypoint_id: impl Into<String>,
        taxonomy_version: impl Into<String>,
    ) -> Result<Self, StandardsError> {
        let entrypoint_id = entrypoint_id.into();
        let taxonomy_version = taxonomy_version.into();
        validate_segment("entrypoint id", &entrypoint_id)?;
        validate_segment("taxonomy version", &taxonomy_version)?;
        Ok(Self {
            entrypoint_id,
            taxonomy_version,
        })
    }
}

impl fmt::Display for BaselineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.taxonomy_version, self.entrypoint_id)
    }
}

/// Rule ids with their occurrence counts plus the hash of the taxonomy
/// artifacts they were enumerated from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleCensus {
    pub counts: BTreeMap<String, u64>,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub entrypoint_id: String,
    pub taxonomy_version: String,
    pub present_count: usize,
    pub rule_counts: BTreeMap<String, u64>,
    pub hash: String,
    #[serde(default)]
    pub ids_sample: Vec<String>,
    pub built_at: DateTime<Utc>,
}

impl BaselineSnapshot {
    pub fn from_census(key: &BaselineKey, census: RuleCensus, built_at: DateTime<Utc>) -> Self {
        let present: Vec<&String> = census
            .counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, _)| id)
            .collect();
        let present_count = present.len();
        let ids_sample = present
            .into_iter()
            .take(IDS_SAMPLE_LEN)
            .cloned()
            .collect();
        Self {
            entrypoint_id: key.entrypoint_id.clone(),
            taxonomy_version: key.taxonomy_version.clone(),
            present_count,
            rule_counts: census.counts,
            hash: census.content_hash,
            ids_sample,
            built_at,
        }
    }

    pub fn key(&self) -> BaselineKey {
        BaselineKey {
            entrypoint_id: self.entrypoint_id.clone(),
            taxonomy_version: self.taxonomy_version.clone(),
        }
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rule_counts.get(rule_id).is_some_and(|count| *count > 0)
    }

    /// Stale when built from artifacts other than the current ones.
    pub fn is_stale(&self, current_hash: &str) -> bool {
        self.hash != current_hash
    }
}

/// Baseline files laid out as `<root>/<taxonomy_version>/<entrypoint_id>.json`.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    root: PathBuf,
}

impl BaselineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &BaselineKey) -> PathBuf {
        self.root
            .join(&key.taxonomy_version)
            .join(format!("{}.json", key.entrypoint_id))
    }

    /// Reads the stored baseline, `Ok(None)` when there is none yet.
    pub fn load(&self, key: &BaselineKey) -> Result<Option<BaselineSnapshot>, StandardsError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| StandardsError::io(&path, e))?;
        let snapshot: BaselineSnapshot =
            serde_json::from_str(&text).map_err(|source| StandardsError::Json {
                path: path.clone(),
                source,
            })?;
        if snapshot.key() != *key {
            return Err(StandardsError::BaselineKeyMismatch {
                path,
                expected: key.to_string(),
                found: snapshot.key().to_string(),
            });
        }
        Ok(Some(snapshot))
    }

    /// Writes through a temporary file and renames it into place.
    pub fn save(&self, snapshot: &BaselineSnapshot) -> Result<PathBuf, StandardsError> {
        let path = self.path_for(&snapshot.key());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StandardsError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(snapshot).map_err(|source| StandardsError::Json {
            path: path.clone(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StandardsError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| StandardsError::io(&path, e))?;
        Ok(path)
    }
}
