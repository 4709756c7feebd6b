#![deny(unsafe_code)]

//! Rule-id enumeration for baseline construction.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::baseline::{BaselineKey, RuleCensus};
use crate::error::StandardsError;
use crate::hash::{list_files, taxonomy_hash};

const ASSERTION_ELEMENTS: [&[u8]; 3] = [
    b"valueAssertion",
    b"existenceAssertion",
    b"consistencyAssertion",
];

/// Enumerates the rule ids a baseline should contain for a key.
pub trait BaselineSource: Send + Sync {
    fn enumerate(&self, key: &BaselineKey) -> Result<RuleCensus, StandardsError>;
}

/// Scans a taxonomy directory's XML resources for assertion definitions.
///
/// A subdirectory named after the key's entrypoint id holds that
/// entrypoint's resources. Without one, the whole root is scanned and every
/// entrypoint gets the same census.
#[derive(Debug, Clone)]
pub struct TaxonomyAssertionSource {
    root: PathBuf,
}

impl TaxonomyAssertionSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory enumerated and hashed for `key`.
    pub fn content_root(&self, key: &BaselineKey) -> PathBuf {
        let scoped = self.root.join(&key.entrypoint_id);
        if scoped.is_dir() {
            scoped
        } else {
            self.root.clone()
        }
    }
}

impl BaselineSource for TaxonomyAssertionSource {
    fn enumerate(&self, key: &BaselineKey) -> Result<RuleCensus, StandardsError> {
        let mut counts = BTreeMap::new();
        let mut scanned = 0usize;
        let root = self.content_root(key);
        for path in list_files(&root)? {
            let is_xml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
            if !is_xml {
                continue;
            }
            let text =
                std::fs::read_to_string(&path).map_err(|e| StandardsError::io(&path, e))?;
            for id in assertion_ids(&text, &path)? {
                *counts.entry(id).or_insert(0) += 1;
            }
            scanned += 1;
        }
        tracing::info!(
            baseline = %key,
            root = %root.display(),
            files = scanned,
            rule_ids = counts.len(),
            "enumerated taxonomy assertions"
        );
        Ok(RuleCensus {
            counts,
            content_hash: taxonomy_hash(&root)?,
        })
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Ids of assertion elements in one linkbase, `eba_` prefix removed.
pub fn assertion_ids(xml: &str, path: &Path) -> Result<Vec<String>, StandardsError> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element)) => {
                let local = element.local_name();
                if !ASSERTION_ELEMENTS.contains(&local.as_ref()) {
                    continue;
                }
                if let Some(id) = attribute(&element, b"id") {
                    let id = id.strip_prefix("eba_").unwrap_or(&id).to_string();
                    if !id.is_empty() {
                        ids.push(id);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(StandardsError::xml(path, err)),
        }
    }
    Ok(ids)
}
