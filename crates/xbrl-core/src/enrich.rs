//! Extraction of locations, rule ids and concepts from engine text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use xbrl_model::{ColCode, RawEvent, RowCode};
use xbrl_standards::MessageCatalog;

use crate::facts::FactIndex;

static CELL_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*(C_\d{2}\.\d{2}(?:\.[a-z])?)\s*,\s*(\d{2,5})\s*,\s*(\d{2,5})\s*,?[^}]*\}")
        .expect("Invalid cell reference regex")
});

static MESSAGE_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"message:([A-Za-z0-9_\-.]+)").expect("Invalid message key regex")
});

static QNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][\w\-]*):([A-Za-z_][\w\-.]*)").expect("Invalid QName regex")
});

/// A `{C_01.00,0010,010,...}` reference found in message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    pub table_id: String,
    pub row_code: RowCode,
    pub col_code: ColCode,
}

/// First well-formed cell reference in `text`.
pub fn extract_cell_ref(text: &str) -> Option<CellRef> {
    CELL_REF_REGEX.captures_iter(text).find_map(|caps| {
        Some(CellRef {
            table_id: caps[1].to_string(),
            row_code: RowCode::new(&caps[2]).ok()?,
            col_code: ColCode::new(&caps[3]).ok()?,
        })
    })
}

/// Rule id from the first `message:v…` token.
pub fn extract_rule_id(text: &str) -> Option<String> {
    MESSAGE_KEY_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].trim_end_matches('.').to_string())
        .find(|id| is_v_code(id))
}

/// Formula rule ids look like `v4460_m_0`.
pub fn is_v_code(rule_id: &str) -> bool {
    let mut chars = rule_id.chars();
    chars.next() == Some('v') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Removes every `message:<id>` token and collapses whitespace.
pub fn strip_raw_keys(text: &str) -> String {
    MESSAGE_KEY_REGEX
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `prefix:local` whose local name is a known fact concept.
pub fn resolve_qname(text: &str, facts: &FactIndex) -> Option<(String, String)> {
    QNAME_REGEX.captures_iter(text).find_map(|caps| {
        let local = &caps[2];
        facts
            .namespace_of(local)
            .map(|namespace| (namespace.to_string(), local.to_string()))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogLookup {
    /// The code is not a `message:<id>` key.
    NotApplicable,
    Resolved,
    Unresolved,
}

/// What the text of one event yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub message: String,
    pub rule_id: Option<String>,
    pub cell: Option<CellRef>,
    pub concept: Option<(String, String)>,
    pub catalog: CatalogLookup,
}

pub struct Enricher<'a> {
    catalog: Option<&'a MessageCatalog>,
    facts: &'a FactIndex,
    hide_raw_keys: bool,
}

impl<'a> Enricher<'a> {
    pub fn new(facts: &'a FactIndex, hide_raw_keys: bool) -> Self {
        Self {
            catalog: None,
            facts,
            hide_raw_keys,
        }
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: &'a MessageCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn enrich(&self, event: &RawEvent) -> Enrichment {
        let code = event.code.trim();
        let raw = event.raw_message.as_str();

        let (catalog_text, catalog) = if code.starts_with("message:") {
            match self
                .catalog
                .and_then(|catalog| catalog.resolve(code, &BTreeMap::new()))
            {
                Some(text) => (Some(text), CatalogLookup::Resolved),
                None => (None, CatalogLookup::Unresolved),
            }
        } else {
            (None, CatalogLookup::NotApplicable)
        };

        let message = match catalog_text {
            Some(text) => text,
            None if self.hide_raw_keys => strip_raw_keys(raw),
            None => raw.trim().to_string(),
        };

        let concept = match event.concept_ln.as_deref().filter(|s| !s.is_empty()) {
            Some(local) => {
                let namespace = event
                    .concept_ns
                    .clone()
                    .filter(|ns| !ns.is_empty())
                    .or_else(|| self.facts.namespace_of(local).map(str::to_string))
                    .unwrap_or_default();
                Some((namespace, local.to_string()))
            }
            None => resolve_qname(raw, self.facts),
        };

        Enrichment {
            message,
            rule_id: extract_rule_id(code).or_else(|| extract_rule_id(raw)),
            cell: extract_cell_ref(raw),
            concept,
            catalog,
        }
    }
}
