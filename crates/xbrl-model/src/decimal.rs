#![deny(unsafe_code)]

//! Fixed-point decimal used for every normalized magnitude.
//!
//! Values are kept normalized (no trailing fractional zeros, zero has scale
//! zero), so derived equality is numeric equality.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    /// Largest number of significant digits a parsed literal may carry.
    pub const MAX_DIGITS: usize = 30;

    pub fn new(mantissa: i128, scale: u32) -> Self {
        let (mut mantissa, mut scale) = (mantissa, scale);
        if mantissa == 0 {
            return Self::ZERO;
        }
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Self { mantissa, scale }
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(i128::from(value), 0)
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    pub fn is_positive(&self) -> bool {
        self.mantissa > 0
    }

    #[must_use]
    pub fn abs(self) -> Self {
        Self {
            mantissa: self.mantissa.saturating_abs(),
            scale: self.scale,
        }
    }

    #[must_use]
    pub fn neg(self) -> Self {
        Self {
            mantissa: self.mantissa.saturating_neg(),
            scale: self.scale,
        }
    }

    fn rescaled(self, scale: u32) -> Option<i128> {
        let factor = 10i128.checked_pow(scale.checked_sub(self.scale)?)?;
        self.mantissa.checked_mul(factor)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        let scale = self.scale.max(other.scale);
        let sum = self.rescaled(scale)?.checked_add(other.rescaled(scale)?)?;
        Some(Self::new(sum, scale))
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.checked_add(other.neg())
    }

    /// Multiplies by `10^exponent`; negative exponents widen the scale.
    pub fn checked_mul_pow10(self, exponent: i32) -> Option<Self> {
        if exponent >= 0 {
            let factor = 10i128.checked_pow(exponent.unsigned_abs())?;
            Some(Self::new(self.mantissa.checked_mul(factor)?, self.scale))
        } else {
            let scale = self.scale.checked_add(exponent.unsigned_abs())?;
            if scale > 38 {
                return None;
            }
            Some(Self::new(self.mantissa, scale))
        }
    }

    /// Sums a sequence, returning `None` on overflow.
    pub fn checked_sum<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        values
            .into_iter()
            .try_fold(Self::ZERO, |acc, value| acc.checked_add(value))
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        let scale = i32::try_from(self.scale).unwrap_or(i32::MAX);
        self.mantissa as f64 / 10f64.powi(scale)
    }

    /// Number of digits left of the decimal point in `|self|` (at least 1).
    pub fn integer_digits(&self) -> usize {
        let digits = self.mantissa.unsigned_abs().to_string().len();
        let scale = self.scale as usize;
        digits.saturating_sub(scale).max(1)
    }

    /// Splits into sign, integer digits and fractional digits.
    pub fn parts(&self) -> (bool, String, String) {
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return (self.is_negative(), digits, String::new());
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        (
            self.is_negative(),
            int_part.to_string(),
            frac_part.to_string(),
        )
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        match (self.rescaled(scale), other.rescaled(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, int_part, frac_part) = self.parts();
        if negative {
            f.write_str("-")?;
        }
        f.write_str(&int_part)?;
        if !frac_part.is_empty() {
            write!(f, ".{frac_part}")?;
        }
        Ok(())
    }
}

/// Parses the canonical form produced by `Display` (`-1234.56`).
impl FromStr for Decimal {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidDecimal(s.to_string());
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let digits = format!("{int_part}{frac_part}");
        let significant = digits.trim_start_matches('0');
        if significant.len() > Self::MAX_DIGITS {
            return Err(invalid());
        }
        let mantissa: i128 = if significant.is_empty() {
            0
        } else {
            significant.parse().map_err(|_| invalid())?
        };
        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let value = Self::new(mantissa, scale);
        Ok(if negative { value.neg() } else { value })
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.scale == 0
            && let Ok(whole) = i64::try_from(self.mantissa)
        {
            return serializer.serialize_i64(whole);
        }
        serializer.serialize_f64(self.to_f64())
    }
}

struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from_i64(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::new(i128::from(v), 0))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        if !v.is_finite() {
            return Err(E::custom("non-finite decimal"));
        }
        format!("{v}").parse().map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_trailing_zeros() {
        assert_eq!(Decimal::new(123_400, 2), Decimal::new(1234, 0));
        assert_eq!(Decimal::new(0, 5), Decimal::ZERO);
        assert_eq!(Decimal::new(123_456, 2).scale(), 2);
    }

    #[test]
    fn displays_locale_neutral() {
        assert_eq!(Decimal::new(-123_456, 2).to_string(), "-1234.56");
        assert_eq!(Decimal::new(5, 3).to_string(), "0.005");
        assert_eq!(Decimal::from_i64(75_085).to_string(), "75085");
    }

    #[test]
    fn parses_canonical_form() {
        let value: Decimal = "-1234.56".parse().unwrap();
        assert_eq!(value, Decimal::new(-123_456, 2));
        assert_eq!("0.50".parse::<Decimal>().unwrap(), Decimal::new(5, 1));
        assert!("1,5".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
    }

    #[test]
    fn arithmetic_aligns_scales() {
        let a = Decimal::new(12_345, 2);
        let b = Decimal::new(5, 1);
        assert_eq!(a.checked_add(b).unwrap(), Decimal::new(12_395, 2));
        assert_eq!(
            Decimal::from_i64(75_085)
                .checked_sub(Decimal::from_i64(68_246))
                .unwrap(),
            Decimal::from_i64(6_839)
        );
    }

    #[test]
    fn orders_across_scales() {
        assert!(Decimal::new(15, 1) > Decimal::from_i64(1));
        assert!(Decimal::new(-15, 1) < Decimal::from_i64(-1));
        assert_eq!(
            Decimal::new(100, 2).cmp(&Decimal::from_i64(1)),
            Ordering::Equal
        );
    }

    #[test]
    fn pow10_shifts() {
        let value = Decimal::new(123, 2).checked_mul_pow10(3).unwrap();
        assert_eq!(value, Decimal::from_i64(1230));
        let value = Decimal::from_i64(5).checked_mul_pow10(-2).unwrap();
        assert_eq!(value, Decimal::new(5, 2));
    }

    #[test]
    fn json_round_trip_is_numeric() {
        let json = serde_json::to_string(&Decimal::new(123_456, 2)).unwrap();
        assert_eq!(json, "1234.56");
        let back: Decimal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Decimal::new(123_456, 2));
        assert_eq!(serde_json::to_string(&Decimal::from_i64(-7)).unwrap(), "-7");
    }
}
