use proptest::prelude::*;
use xbrl_model::{Decimal, ScaleHint};
use xbrl_normalization::{format_grouped, normalize_number, parse_number};

fn group(int_part: u64, separator: &str) -> String {
    let digits = int_part.to_string();
    let mut out = String::new();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

proptest! {
    #[test]
    fn surface_forms_normalize_identically(int_part in 1_000u64..1_000_000_000_000, cents in 10u32..100) {
        let plain = format!("{int_part}.{cents:02}");
        let us = format!("{}.{cents:02}", group(int_part, ","));
        let eu = format!("{},{cents:02}", group(int_part, "."));
        let spaced = format!("{},{cents:02}", group(int_part, "\u{202F}"));

        let expected = parse_number(&plain).unwrap();
        prop_assert_eq!(parse_number(&us).unwrap(), expected);
        prop_assert_eq!(parse_number(&eu).unwrap(), expected);
        prop_assert_eq!(parse_number(&spaced).unwrap(), expected);

        let negated = expected.neg();
        prop_assert_eq!(parse_number(&format!("({eu})")).unwrap(), negated);
        prop_assert_eq!(parse_number(&format!("\u{2212}{us}")).unwrap(), negated);
    }

    #[test]
    fn grouped_rendering_reparses(mantissa in -1_000_000_000_000i64..1_000_000_000_000, scale in 0u32..3) {
        let value = Decimal::new(i128::from(mantissa), scale);
        prop_assert_eq!(parse_number(&value.to_string()).unwrap(), value);
        prop_assert_eq!(parse_number(&format_grouped(value)).unwrap(), value);
    }
}

#[test]
fn canonical_examples() {
    let expected = Decimal::new(123_456, 2);
    for text in ["1.234,56", "1,234.56", "1234.56"] {
        assert_eq!(parse_number(text).unwrap(), expected, "{text}");
    }
    for text in ["\u{2212}1234.56", "(1,234.56)"] {
        assert_eq!(parse_number(text).unwrap(), expected.neg(), "{text}");
    }
}

#[test]
fn large_values_are_flagged_for_scientific_rendering() {
    let value = normalize_number("2.5e9").unwrap();
    assert_eq!(value.magnitude, Decimal::from_i64(2_500_000_000));
    assert_eq!(value.scale_hint, ScaleHint::Scientific);
}
