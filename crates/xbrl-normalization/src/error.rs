use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("empty numeric text")]
    Empty,
    #[error("unexpected character {character:?} in {text:?}")]
    InvalidCharacter { text: String, character: char },
    #[error("malformed digit grouping in {0:?}")]
    MalformedGrouping(String),
    #[error("parenthesized value also carries a sign: {0:?}")]
    AmbiguousSign(String),
    #[error("exponent out of range in {text:?}")]
    ExponentOutOfRange { text: String },
    #[error("value exceeds supported precision: {0:?}")]
    Overflow(String),
}
