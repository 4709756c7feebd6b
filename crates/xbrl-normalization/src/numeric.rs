#![deny(unsafe_code)]

//! Numeric text normalization.
//!
//! Accepts EU and US separator conventions, space grouping, unicode minus
//! variants, parenthesized negatives and scientific notation (`1.5e9`,
//! `1.5×10^9`). Every supported surface form of the same quantity yields the
//! same [`Decimal`]. Failures are explicit; nothing defaults to zero.

use xbrl_model::{Decimal, NumericValue};

use crate::NormalizationError;

/// Largest accepted exponent magnitude.
pub const MAX_EXPONENT: u32 = 24;

/// Largest fractional scale a normalized value may carry.
const MAX_SCALE: u32 = 30;

const EXPONENT_MARKERS: [&str; 3] = ["×10^", "x10^", "*10^"];

fn is_grouping_space(c: char) -> bool {
    matches!(c, ' ' | '\u{00A0}' | '\u{202F}' | '\u{2009}')
}

fn is_minus(c: char) -> bool {
    matches!(
        c,
        '-' | '\u{2212}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{FE63}' | '\u{FF0D}'
    )
}

/// Normalizes `text` and keeps the original alongside the magnitude.
pub fn normalize_number(text: &str) -> Result<NumericValue, NormalizationError> {
    let magnitude = parse_number(text)?;
    Ok(NumericValue::new(magnitude, text))
}

/// Parses numeric text into a canonical decimal.
pub fn parse_number(text: &str) -> Result<Decimal, NormalizationError> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !is_grouping_space(*c))
        .map(|c| if is_minus(c) { '-' } else { c })
        .collect();
    let body = cleaned.strip_prefix('≈').unwrap_or(&cleaned);
    if body.is_empty() {
        return Err(NormalizationError::Empty);
    }

    let (outer_sign, body) = split_sign(body);
    let (parenthesized, body) = split_parens(body, text)?;
    let (inner_sign, body) = split_sign(body);
    let negative = match (parenthesized, outer_sign, inner_sign) {
        (true, None, None) => true,
        (true, _, _) => return Err(NormalizationError::AmbiguousSign(text.to_string())),
        (false, Some(_), Some(_)) => {
            return Err(NormalizationError::InvalidCharacter {
                text: text.to_string(),
                character: '-',
            });
        }
        (false, sign, None) | (false, None, sign) => sign == Some(true),
    };

    let (mantissa, exponent) = split_exponent(body, text)?;
    if let Some(character) = mantissa
        .chars()
        .find(|c| !(c.is_ascii_digit() || *c == ',' || *c == '.'))
    {
        return Err(NormalizationError::InvalidCharacter {
            text: text.to_string(),
            character,
        });
    }
    let (int_digits, frac_digits) = resolve_separators(mantissa, text)?;
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(NormalizationError::Empty);
    }

    let overflow = || NormalizationError::Overflow(text.to_string());
    let digits = format!("{int_digits}{frac_digits}");
    let significant = digits.trim_start_matches('0');
    if significant.len() > Decimal::MAX_DIGITS {
        return Err(overflow());
    }
    let raw: i128 = if significant.is_empty() {
        0
    } else {
        significant.parse().map_err(|_| overflow())?
    };
    let scale = u32::try_from(frac_digits.len()).map_err(|_| overflow())?;
    let value = Decimal::new(raw, scale)
        .checked_mul_pow10(exponent)
        .ok_or_else(overflow)?;
    if value.scale() > MAX_SCALE {
        return Err(overflow());
    }
    Ok(if negative { value.neg() } else { value })
}

/// Returns `Some(true)` for a leading minus, `Some(false)` for a plus.
fn split_sign(body: &str) -> (Option<bool>, &str) {
    if let Some(rest) = body.strip_prefix('-') {
        (Some(true), rest)
    } else if let Some(rest) = body.strip_prefix('+') {
        (Some(false), rest)
    } else {
        (None, body)
    }
}

fn split_parens<'a>(body: &'a str, text: &str) -> Result<(bool, &'a str), NormalizationError> {
    match (body.strip_prefix('('), body.ends_with(')')) {
        (Some(inner), true) => Ok((true, inner.strip_suffix(')').unwrap_or(inner).trim())),
        (Some(_), false) => Err(NormalizationError::InvalidCharacter {
            text: text.to_string(),
            character: '(',
        }),
        (None, true) => Err(NormalizationError::InvalidCharacter {
            text: text.to_string(),
            character: ')',
        }),
        (None, false) => Ok((false, body)),
    }
}

fn split_exponent<'a>(body: &'a str, text: &str) -> Result<(&'a str, i32), NormalizationError> {
    for marker in EXPONENT_MARKERS {
        if let Some((mantissa, exponent)) = body.split_once(marker) {
            return Ok((mantissa, parse_exponent(exponent, text)?));
        }
    }
    match body.find(['e', 'E']) {
        Some(idx) => Ok((&body[..idx], parse_exponent(&body[idx + 1..], text)?)),
        None => Ok((body, 0)),
    }
}

fn parse_exponent(raw: &str, text: &str) -> Result<i32, NormalizationError> {
    let (sign, digits) = split_sign(raw);
    if digits.is_empty() {
        return Err(NormalizationError::InvalidCharacter {
            text: text.to_string(),
            character: 'e',
        });
    }
    if let Some(character) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(NormalizationError::InvalidCharacter {
            text: text.to_string(),
            character,
        });
    }
    let out_of_range = || NormalizationError::ExponentOutOfRange {
        text: text.to_string(),
    };
    let significant = digits.trim_start_matches('0');
    if significant.len() > 2 {
        return Err(out_of_range());
    }
    let magnitude: u32 = if significant.is_empty() {
        0
    } else {
        significant.parse().map_err(|_| out_of_range())?
    };
    if magnitude > MAX_EXPONENT {
        return Err(out_of_range());
    }
    let magnitude = i32::try_from(magnitude).map_err(|_| out_of_range())?;
    Ok(if sign == Some(true) { -magnitude } else { magnitude })
}

/// Splits a mantissa into integer and fractional digit strings.
///
/// With both separators present the rightmost one is decimal. A single kind
/// repeated is grouping. A lone separator followed by exactly three digits
/// after a non-zero integer part of one to three digits is grouping;
/// otherwise it is decimal.
fn resolve_separators(mantissa: &str, text: &str) -> Result<(String, String), NormalizationError> {
    let commas = mantissa.matches(',').count();
    let dots = mantissa.matches('.').count();

    if commas == 0 && dots == 0 {
        return Ok((mantissa.to_string(), String::new()));
    }

    if commas > 0 && dots > 0 {
        let last_comma = mantissa.rfind(',').unwrap_or(0);
        let last_dot = mantissa.rfind('.').unwrap_or(0);
        let (decimal, grouping) = if last_comma > last_dot {
            (',', '.')
        } else {
            ('.', ',')
        };
        if mantissa.matches(decimal).count() != 1 {
            return Err(NormalizationError::MalformedGrouping(text.to_string()));
        }
        let (int_part, frac_part) = mantissa.rsplit_once(decimal).unwrap_or((mantissa, ""));
        return Ok((ungroup(int_part, grouping, text)?, frac_part.to_string()));
    }

    let separator = if commas > 0 { ',' } else { '.' };
    if commas.max(dots) > 1 {
        return Ok((ungroup(mantissa, separator, text)?, String::new()));
    }

    let (before, after) = mantissa.split_once(separator).unwrap_or((mantissa, ""));
    let thousands = after.len() == 3
        && (1..=3).contains(&before.len())
        && !before.trim_start_matches('0').is_empty();
    if thousands {
        Ok((format!("{before}{after}"), String::new()))
    } else {
        Ok((before.to_string(), after.to_string()))
    }
}

fn ungroup(int_part: &str, separator: char, text: &str) -> Result<String, NormalizationError> {
    let mut groups = int_part.split(separator);
    let first = groups.next().unwrap_or_default();
    let valid_first = !first.is_empty() && first.len() <= 3;
    let rest: Vec<&str> = groups.collect();
    if !valid_first || rest.iter().any(|group| group.len() != 3) {
        return Err(NormalizationError::MalformedGrouping(text.to_string()));
    }
    let mut digits = first.to_string();
    for group in rest {
        digits.push_str(group);
    }
    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> Decimal {
        parse_number(text).unwrap_or_else(|err| panic!("{text}: {err}"))
    }

    #[test]
    fn eu_us_and_plain_agree() {
        let expected = Decimal::new(123_456, 2);
        assert_eq!(parsed("1.234,56"), expected);
        assert_eq!(parsed("1,234.56"), expected);
        assert_eq!(parsed("1234.56"), expected);
        assert_eq!(parsed("1234,56"), expected);
        assert_eq!(parsed("1 234,56"), expected);
        assert_eq!(parsed("1\u{00A0}234,56"), expected);
    }

    #[test]
    fn negative_forms_agree() {
        let expected = Decimal::new(-123_456, 2);
        assert_eq!(parsed("\u{2212}1,234.56"), expected);
        assert_eq!(parsed("(1.234,56)"), expected);
        assert_eq!(parsed("-1234.56"), expected);
        assert_eq!(parsed("–1234,56"), expected);
    }

    #[test]
    fn grouping_heuristic() {
        assert_eq!(parsed("1,234"), Decimal::from_i64(1234));
        assert_eq!(parsed("1.234"), Decimal::from_i64(1234));
        assert_eq!(parsed("12,345,678"), Decimal::from_i64(12_345_678));
        assert_eq!(parsed("1.234.567,8"), Decimal::new(12_345_678, 1));
        assert_eq!(parsed("0.125"), Decimal::new(125, 3));
        assert_eq!(parsed("1234.567"), Decimal::new(1_234_567, 3));
        assert_eq!(parsed("1,5"), Decimal::new(15, 1));
        assert_eq!(parsed(".5"), Decimal::new(5, 1));
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(parsed("1.5e3"), Decimal::from_i64(1500));
        assert_eq!(parsed("1,5E-2"), Decimal::new(15, 3));
        assert_eq!(parsed("≈ 1.23×10^9"), Decimal::from_i64(1_230_000_000));
        assert_eq!(parsed("+2e0"), Decimal::from_i64(2));
    }

    #[test]
    fn failures_are_explicit() {
        assert_eq!(parse_number("  "), Err(NormalizationError::Empty));
        assert_eq!(parse_number("-"), Err(NormalizationError::Empty));
        assert!(matches!(
            parse_number("12a"),
            Err(NormalizationError::InvalidCharacter { character: 'a', .. })
        ));
        assert!(matches!(
            parse_number("(-5)"),
            Err(NormalizationError::AmbiguousSign(_))
        ));
        assert!(matches!(
            parse_number("-(5)"),
            Err(NormalizationError::AmbiguousSign(_))
        ));
        assert!(matches!(
            parse_number("1,23,4"),
            Err(NormalizationError::MalformedGrouping(_))
        ));
        assert!(matches!(
            parse_number("1.2,3.4"),
            Err(NormalizationError::MalformedGrouping(_))
        ));
        assert!(matches!(
            parse_number("1e25"),
            Err(NormalizationError::ExponentOutOfRange { .. })
        ));
        assert!(matches!(
            parse_number("1234567890123456789012345678901"),
            Err(NormalizationError::Overflow(_))
        ));
        assert!(matches!(
            parse_number("(12"),
            Err(NormalizationError::InvalidCharacter { character: '(', .. })
        ));
    }

    #[test]
    fn keeps_original_text() {
        let value = normalize_number(" 1.234,5 ").unwrap();
        assert_eq!(value.original_text, " 1.234,5 ");
        assert_eq!(value.magnitude, Decimal::new(12_345, 1));
    }
}
