//! Rule metadata side channel.

use std::path::Path;

use serde::Deserialize;
use xbrl_model::RuleDefinition;

use crate::error::{IngestError, Result};
use crate::events::read_text;

#[derive(Deserialize)]
#[serde(untagged)]
enum RulesDocument {
    List(Vec<RuleDefinition>),
    Wrapped { rules: Vec<RuleDefinition> },
}

/// Loads rule definitions from a JSON array or a `{"rules": [...]}` object.
pub fn load_rules(path: &Path) -> Result<Vec<RuleDefinition>> {
    let text = read_text(path)?;
    let rules = parse_rules(&text, path)?;
    tracing::debug!(path = %path.display(), rules = rules.len(), "loaded rule metadata");
    Ok(rules)
}

pub fn parse_rules(text: &str, path: &Path) -> Result<Vec<RuleDefinition>> {
    let document: RulesDocument =
        serde_json::from_str(text).map_err(|e| IngestError::json(path, e))?;
    Ok(match document {
        RulesDocument::List(rules) | RulesDocument::Wrapped { rules } => rules,
    })
}
