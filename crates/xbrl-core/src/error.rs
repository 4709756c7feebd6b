use thiserror::Error;
use xbrl_model::ModelError;

/// Reasons a rule definition cannot become a [`xbrl_model::RuleInstance`].
#[derive(Debug, Error)]
pub enum RuleModelError {
    #[error("rule {rule_id} has no right-hand side terms")]
    EmptyRhs { rule_id: String },

    #[error("rule {rule_id} has no left-hand side row/column code")]
    MissingLhsCode { rule_id: String },

    #[error("rule {rule_id} has an invalid code: {source}")]
    InvalidCode {
        rule_id: String,
        #[source]
        source: ModelError,
    },
}

impl RuleModelError {
    pub fn rule_id(&self) -> &str {
        match self {
            RuleModelError::EmptyRhs { rule_id }
            | RuleModelError::MissingLhsCode { rule_id }
            | RuleModelError::InvalidCode { rule_id, .. } => rule_id,
        }
    }
}
