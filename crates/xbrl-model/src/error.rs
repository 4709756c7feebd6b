use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid row code: {0:?}")]
    InvalidRowCode(String),
    #[error("invalid column code: {0:?}")]
    InvalidColCode(String),
    #[error("rule {rule_id} has no right-hand side terms")]
    EmptyRhs { rule_id: String },
    #[error("invalid decimal literal: {0:?}")]
    InvalidDecimal(String),
    #[error("unknown operator: {0:?}")]
    UnknownOperator(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
