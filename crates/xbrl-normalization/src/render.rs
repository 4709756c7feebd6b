//! Locale-neutral rendering of normalized values.

use xbrl_model::{Decimal, NumericValue, ScaleHint};

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `1234567.5` renders as `1,234,567.5`.
pub fn format_grouped(value: Decimal) -> String {
    let (negative, int_part, frac_part) = value.parts();
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(&int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(&frac_part);
    }
    out
}

/// `1234567890` renders as `≈ 1.23×10^9`, `-2e9` as `≈ -2×10^9`.
fn format_scientific(value: Decimal) -> String {
    let mut exponent = value.integer_digits().saturating_sub(1);
    let divisor = 10f64.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
    let mut mantissa = format!("{:.2}", value.abs().to_f64() / divisor);
    if mantissa.starts_with("10") {
        mantissa = "1.00".to_string();
        exponent += 1;
    }
    let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
    let sign = if value.is_negative() { "-" } else { "" };
    format!("≈ {sign}{mantissa}×10^{exponent}")
}

/// Renders a magnitude in the band its scale hint selects.
pub fn render_decimal(value: Decimal) -> String {
    match ScaleHint::for_magnitude(value) {
        ScaleHint::Scientific => format_scientific(value),
        ScaleHint::Normal | ScaleHint::Milli | ScaleHint::Thousand => format_grouped(value),
    }
}

pub fn format_value(value: &NumericValue) -> String {
    match value.scale_hint {
        ScaleHint::Scientific => format_scientific(value.magnitude),
        ScaleHint::Normal | ScaleHint::Milli | ScaleHint::Thousand => {
            format_grouped(value.magnitude)
        }
    }
}

/// One decimal place with an explicit sign, e.g. `+10.0%`.
pub fn format_percent(percent: f64) -> String {
    format!("{percent:+.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_grouped(Decimal::from_i64(75_085)), "75,085");
        assert_eq!(format_grouped(Decimal::from_i64(-1_234_567)), "-1,234,567");
        assert_eq!(format_grouped(Decimal::new(123_456, 2)), "1,234.56");
        assert_eq!(format_grouped(Decimal::from_i64(999)), "999");
        assert_eq!(format_grouped(Decimal::new(5, 3)), "0.005");
    }

    #[test]
    fn large_values_use_scientific() {
        assert_eq!(
            render_decimal(Decimal::from_i64(1_234_567_890)),
            "≈ 1.23×10^9"
        );
        assert_eq!(
            render_decimal(Decimal::from_i64(-2_000_000_000)),
            "≈ -2×10^9"
        );
        assert_eq!(
            render_decimal(Decimal::from_i64(9_999_000_000)),
            "≈ 1×10^10"
        );
        assert_eq!(render_decimal(Decimal::from_i64(999_999_999)), "999,999,999");
    }

    #[test]
    fn percent_is_signed() {
        assert_eq!(format_percent(10.021), "+10.0%");
        assert_eq!(format_percent(-3.26), "-3.3%");
    }
}
