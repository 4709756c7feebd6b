//! Rule-domain classification of raw engine events.
//!
//! An ordered table of `(predicate, category)` pairs; the first predicate
//! that holds decides. Events no predicate claims are `xbrl21`, so every
//! event gets exactly one category.

use std::sync::LazyLock;

use regex::Regex;
use xbrl_model::{Category, RawEvent};

static V_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"message:v\d+").expect("Invalid v-code regex"));

const GENERIC_CODES: &[&str] = &["", "unknown", "error", "warning", "info"];
const PREFLIGHT_PREFIXES: &[&str] = &["fi:", "structure:", "offline:", "entrypoint:"];
const DIMENSION_CODE_PREFIXES: &[&str] = &["xbrldte:", "xbrldie:", "xbrldi:"];
const DIMENSION_TOKENS: &[&str] = &[
    "hypercube",
    "axis",
    "member",
    "dimension",
    "domain",
    "xbrldi",
    "xbrl-dim",
];
const CALCULATION_TOKENS: &[&str] = &[
    "calculation",
    "summation-item",
    "summation item",
    "weight",
    "sum(",
];

/// Codes that say nothing about the event.
pub fn is_generic_code(code: &str) -> bool {
    GENERIC_CODES.contains(&code.trim().to_lowercase().as_str())
}

/// Lowercased view of the fields predicates look at.
pub struct EventView {
    code: String,
    message: String,
    refs: String,
    refs_empty: bool,
}

impl EventView {
    pub fn new(event: &RawEvent) -> Self {
        Self {
            code: event.code.trim().to_lowercase(),
            message: event.raw_message.to_lowercase(),
            refs: event.refs.join(" ").to_lowercase(),
            refs_empty: event.refs.iter().all(|r| r.trim().is_empty()),
        }
    }

    fn message_has_any(&self, tokens: &[&str]) -> bool {
        tokens.iter().any(|token| self.message.contains(token))
    }
}

pub struct ClassificationRule {
    pub name: &'static str,
    pub category: Category,
    predicate: fn(&EventView) -> bool,
}

impl ClassificationRule {
    pub fn new(name: &'static str, category: Category, predicate: fn(&EventView) -> bool) -> Self {
        Self {
            name,
            category,
            predicate,
        }
    }

    pub fn matches(&self, view: &EventView) -> bool {
        (self.predicate)(view)
    }
}

pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(vec![
            ClassificationRule::new("blank", Category::Unknown, is_blank),
            ClassificationRule::new("preflight", Category::FilingRulesPreflight, is_preflight),
            ClassificationRule::new("formula", Category::Formulas, is_formula),
            ClassificationRule::new("eba_filing", Category::EbaFiling, is_eba_filing),
            ClassificationRule::new("dimensions", Category::Dimensions, is_dimensional),
            ClassificationRule::new("calculation", Category::Calculation, is_calculation),
        ])
    }
}

impl Classifier {
    /// Rules are tried in order; unmatched events fall back to `xbrl21`.
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, event: &RawEvent) -> Category {
        let view = EventView::new(event);
        self.rules
            .iter()
            .find(|rule| rule.matches(&view))
            .map_or(Category::Xbrl21, |rule| rule.category)
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }
}

fn is_blank(view: &EventView) -> bool {
    is_generic_code(&view.code) && view.message.trim().is_empty() && view.refs_empty
}

fn is_preflight(view: &EventView) -> bool {
    PREFLIGHT_PREFIXES
        .iter()
        .any(|prefix| view.code.starts_with(prefix))
}

fn is_formula(view: &EventView) -> bool {
    V_CODE_REGEX.is_match(&view.code)
        || view.code.contains("formula:")
        || V_CODE_REGEX.is_match(&view.message)
        || view.message.contains("/val/")
        || view.message.contains("vr-")
        || view.refs.contains("/val/")
}

fn is_eba_filing(view: &EventView) -> bool {
    view.code.starts_with("eba.")
        || view.code.starts_with("eba:")
        || view.message_has_any(&["filing indicator", "entry point", "entrypoint"])
}

fn is_dimensional(view: &EventView) -> bool {
    DIMENSION_CODE_PREFIXES
        .iter()
        .any(|prefix| view.code.starts_with(prefix))
        || view.message_has_any(DIMENSION_TOKENS)
        || view.refs.contains("/def/")
}

fn is_calculation(view: &EventView) -> bool {
    view.code.contains("calc")
        || view.message_has_any(CALCULATION_TOKENS)
        || view.message.contains("calculationlink")
        || view.refs.contains("/cal/")
}

#[cfg(test)]
mod tests {
    use xbrl_model::Severity;

    use super::*;

    fn event(code: &str, message: &str) -> RawEvent {
        RawEvent::new(code, message, Severity::Error)
    }

    #[test]
    fn ordered_predicates_pick_the_first_match() {
        let classifier = Classifier::default();
        let cases = [
            (event("message:v4460_m_0", "dimension mismatch"), Category::Formulas),
            (event("fi:presence", "No filing indicators found"), Category::FilingRulesPreflight),
            (event("EBA.1.6", "duplicate facts"), Category::EbaFiling),
            (event("xbrldie:PrimaryItemDimensionallyInvalidError", ""), Category::Dimensions),
            (event("xbrl.5.2.5.2:calcInconsistency", ""), Category::Calculation),
            (event("xbrl.4.9", "context period is invalid"), Category::Xbrl21),
            (event("unknown", ""), Category::Unknown),
        ];
        for (event, expected) in cases {
            assert_eq!(classifier.classify(&event), expected, "{}", event.code);
        }
    }

    #[test]
    fn refs_alone_keep_a_generic_event_classifiable() {
        let classifier = Classifier::default();
        let with_ref = event("", "").with_refs(vec!["tab/def/c_01.00.xml".to_string()]);
        assert_eq!(classifier.classify(&with_ref), Category::Dimensions);
        let plain_ref = event("", "").with_refs(vec!["f12".to_string()]);
        assert_eq!(classifier.classify(&plain_ref), Category::Xbrl21);
    }

    #[test]
    fn v_code_in_message_is_a_formula() {
        let classifier = Classifier::default();
        let event = event("error", "Assertion message:v1234_m failed");
        assert_eq!(classifier.classify(&event), Category::Formulas);
    }

    #[test]
    fn generic_codes() {
        assert!(is_generic_code(" Unknown "));
        assert!(is_generic_code(""));
        assert!(!is_generic_code("xbrl.4.9"));
    }
}
