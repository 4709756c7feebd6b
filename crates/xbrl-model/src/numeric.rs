use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Decimal;

/// Rendering band of a normalized value. Never alters the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleHint {
    Normal,
    Milli,
    Thousand,
    Scientific,
}

impl ScaleHint {
    pub fn for_magnitude(magnitude: Decimal) -> Self {
        let abs = magnitude.abs();
        if abs >= Decimal::from_i64(1_000_000_000) {
            ScaleHint::Scientific
        } else if abs >= Decimal::from_i64(1_000) {
            ScaleHint::Thousand
        } else if !abs.is_zero() && abs < Decimal::from_i64(1) {
            ScaleHint::Milli
        } else {
            ScaleHint::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleHint::Normal => "normal",
            ScaleHint::Milli => "milli",
            ScaleHint::Thousand => "thousand",
            ScaleHint::Scientific => "scientific",
        }
    }
}

impl fmt::Display for ScaleHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericValue {
    pub magnitude: Decimal,
    pub scale_hint: ScaleHint,
    pub original_text: String,
}

impl NumericValue {
    pub fn new(magnitude: Decimal, original_text: impl Into<String>) -> Self {
        Self {
            magnitude,
            scale_hint: ScaleHint::for_magnitude(magnitude),
            original_text: original_text.into(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }
}
