#![deny(unsafe_code)]

//! Fixed-width template coordinates.
//!
//! Row codes are four digits and column codes three digits. Padding happens
//! at construction so every stored code is already in display form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

fn pad_code(raw: &str, width: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let significant = trimmed.trim_start_matches('0');
    if significant.len() > width {
        return None;
    }
    Some(format!("{significant:0>width$}"))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RowCode(String);

impl RowCode {
    pub const WIDTH: usize = 4;

    pub fn new(value: impl AsRef<str>) -> Result<Self, ModelError> {
        let value = value.as_ref();
        pad_code(value, Self::WIDTH)
            .map(Self)
            .ok_or_else(|| ModelError::InvalidRowCode(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RowCode {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RowCode> for String {
    fn from(code: RowCode) -> Self {
        code.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColCode(String);

impl ColCode {
    pub const WIDTH: usize = 3;

    pub fn new(value: impl AsRef<str>) -> Result<Self, ModelError> {
        let value = value.as_ref();
        pad_code(value, Self::WIDTH)
            .map(Self)
            .ok_or_else(|| ModelError::InvalidColCode(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ColCode {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ColCode> for String {
    fn from(code: ColCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_codes() {
        assert_eq!(RowCode::new("7").unwrap().as_str(), "0007");
        assert_eq!(ColCode::new("10").unwrap().as_str(), "010");
    }

    #[test]
    fn strips_excess_leading_zeros() {
        assert_eq!(RowCode::new("00250").unwrap().as_str(), "0250");
        assert_eq!(ColCode::new("0020").unwrap().as_str(), "020");
        assert_eq!(RowCode::new("0").unwrap().as_str(), "0000");
    }

    #[test]
    fn rejects_non_numeric_and_oversized() {
        assert!(RowCode::new("").is_err());
        assert!(RowCode::new("r010").is_err());
        assert!(RowCode::new("12345").is_err());
        assert!(ColCode::new("1000").is_err());
    }

    #[test]
    fn deserialization_applies_padding() {
        let code: RowCode = serde_json::from_str("\"30\"").unwrap();
        assert_eq!(code.as_str(), "0030");
        assert!(serde_json::from_str::<ColCode>("\"abc\"").is_err());
    }
}
