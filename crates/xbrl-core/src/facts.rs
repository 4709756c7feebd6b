//! Lookup of observed fact values for rule terms.

use std::collections::{BTreeMap, HashMap};

use xbrl_model::{ColCode, ObservedFact, RowCode};

/// Observed facts of one run, addressable by concept and context or by
/// template coordinates.
#[derive(Debug, Clone, Default)]
pub struct FactIndex {
    by_concept: HashMap<(String, String), Vec<usize>>,
    by_cell: HashMap<(String, RowCode, ColCode), usize>,
    namespaces: BTreeMap<String, String>,
    facts: Vec<ObservedFact>,
}

impl FactIndex {
    pub fn new(facts: Vec<ObservedFact>) -> Self {
        let mut index = Self::default();
        for fact in facts {
            index.insert(fact);
        }
        index
    }

    fn insert(&mut self, fact: ObservedFact) {
        let position = self.facts.len();
        let local = fact.concept_ln.trim();
        if !local.is_empty() {
            self.by_concept
                .entry((local.to_string(), fact.context_ref.trim().to_string()))
                .or_default()
                .push(position);
            if !fact.concept_ns.trim().is_empty() {
                self.namespaces
                    .entry(local.to_string())
                    .or_insert_with(|| fact.concept_ns.trim().to_string());
            }
        }
        if let (Some(table), Some(row), Some(col)) = (
            fact.table_id.as_deref(),
            fact.row_code.as_deref(),
            fact.col_code.as_deref(),
        ) && let (Ok(row), Ok(col)) = (RowCode::new(row), ColCode::new(col))
        {
            self.by_cell
                .entry((table.trim().to_string(), row, col))
                .or_insert(position);
        }
        self.facts.push(fact);
    }

    /// Fact for `concept_ln` in `context_ref`. A namespace only filters
    /// when both sides carry one.
    pub fn by_concept(
        &self,
        concept_ns: Option<&str>,
        concept_ln: &str,
        context_ref: &str,
    ) -> Option<&ObservedFact> {
        let key = (concept_ln.trim().to_string(), context_ref.trim().to_string());
        self.by_concept
            .get(&key)?
            .iter()
            .map(|&position| &self.facts[position])
            .find(|fact| match concept_ns {
                Some(ns) if !ns.is_empty() && !fact.concept_ns.is_empty() => fact.concept_ns == ns,
                _ => true,
            })
    }

    pub fn by_cell(&self, table_id: &str, row: &RowCode, col: &ColCode) -> Option<&ObservedFact> {
        self.by_cell
            .get(&(table_id.to_string(), row.clone(), col.clone()))
            .map(|&position| &self.facts[position])
    }

    /// Namespace of the first fact seen with this local name.
    pub fn namespace_of(&self, concept_ln: &str) -> Option<&str> {
        self.namespaces.get(concept_ln).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}
