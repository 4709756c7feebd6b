//! Root-cause heuristics over one rule instance.
//!
//! Every threshold sits behind a named predicate so each boundary can be
//! tested on its own. All flags are computed; none short-circuits another.
//! Magnitudes are absolute values of the observed terms; unparseable terms
//! take no part.

use std::cmp::Ordering;

use xbrl_model::{
    ContributorKind, DominantContributor, HeuristicFlags, RuleInstance, RuleTerm, SignConvention,
    TermStatus,
};

pub const SCALE_RATIO_MIN: f64 = 1.0 / 1000.0;
pub const SCALE_RATIO_MAX: f64 = 1000.0;
pub const DISPERSION_LIMIT: f64 = 1000.0;
pub const NEGLIGIBLE_SHARE: f64 = 0.005;

pub const SMALL_SET_MAX: usize = 3;
pub const MID_SET_MAX: usize = 7;

const SMALL_STRONG_RATIO: f64 = 2.0;
const SMALL_STRONG_SHARE: f64 = 0.80;
const SMALL_WEAK_RATIO: f64 = 1.5;
const SMALL_WEAK_SHARE: f64 = 0.90;
const MID_RATIO: f64 = 4.0;
const MID_SHARE: f64 = 0.60;
const DOMINANT_SHARE: f64 = 0.50;
const LARGE_RATIO: f64 = 5.0;
const LARGE_ROBUST_Z: f64 = 3.0;
const LARGE_SHARE: f64 = 0.40;

/// `|lhs| / |sum(rhs)|` outside `[1/1000, 1000]`.
pub fn scale_ratio_out_of_band(ratio: f64) -> bool {
    !(SCALE_RATIO_MIN..=SCALE_RATIO_MAX).contains(&ratio)
}

pub fn dispersion_indicates_scale(max: f64, median: f64) -> bool {
    median > 0.0 && max / median >= DISPERSION_LIMIT
}

pub fn share_negligible(share: f64) -> bool {
    share < NEGLIGIBLE_SHARE
}

/// Sets of up to three terms: the largest against the second largest.
pub fn small_set_outlier(ratio_to_second: f64, share: f64) -> bool {
    (ratio_to_second >= SMALL_STRONG_RATIO && share >= SMALL_STRONG_SHARE)
        || (ratio_to_second >= SMALL_WEAK_RATIO && share >= SMALL_WEAK_SHARE)
}

/// Sets of four to seven terms: the largest against the median.
pub fn mid_set_outlier(ratio_to_median: f64, share: f64) -> Option<ContributorKind> {
    if ratio_to_median >= MID_RATIO && share >= MID_SHARE {
        Some(ContributorKind::Outlier)
    } else if share >= DOMINANT_SHARE {
        Some(ContributorKind::Dominant)
    } else {
        None
    }
}

/// Sets of eight or more terms.
pub fn large_set_outlier(ratio_to_median: f64, robust_z: f64, share: f64) -> bool {
    ratio_to_median >= LARGE_RATIO && robust_z >= LARGE_ROBUST_Z && share >= LARGE_SHARE
}

/// Middle value; an even count averages the two middle values.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Median absolute deviation, `1.0` when the deviations are all zero.
pub fn median_absolute_deviation(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    let mad = median(&deviations);
    if mad > 0.0 { mad } else { 1.0 }
}

pub fn analyze(rule: &RuleInstance) -> HeuristicFlags {
    let observed: Vec<(&RuleTerm, f64)> = rule
        .rhs_terms()
        .iter()
        .filter_map(|term| {
            term.value
                .as_ref()
                .map(|value| (term, value.magnitude.abs().to_f64()))
        })
        .collect();
    let magnitudes: Vec<f64> = observed.iter().map(|(_, magnitude)| *magnitude).collect();
    let total: f64 = magnitudes.iter().sum();
    let center = median(&magnitudes);

    let mut flags = HeuristicFlags::default();

    if let Some(lhs) = rule.lhs().value.as_ref().map(|v| v.magnitude.abs().to_f64())
        && lhs > 0.0
        && total > 0.0
        && scale_ratio_out_of_band(lhs / total)
    {
        flags.scale_mismatch = true;
    }
    if let Some(max) = magnitudes.iter().copied().reduce(f64::max)
        && dispersion_indicates_scale(max, center)
    {
        flags.scale_mismatch = true;
    }

    flags.sign_inversion = std::iter::once(rule.lhs())
        .chain(rule.rhs_terms())
        .filter(|term| sign_inverted(term))
        .cloned()
        .collect();

    flags.missing_or_zero = rule
        .rhs_terms()
        .iter()
        .filter(|term| missing_or_zero(term, total))
        .cloned()
        .collect();

    flags.dominant_outliers = top_contributor(&observed, &magnitudes, total, center)
        .into_iter()
        .collect();

    flags
}

fn sign_inverted(term: &RuleTerm) -> bool {
    let Some(value) = term.value.as_ref() else {
        return false;
    };
    match term.sign {
        SignConvention::Negative => value.magnitude.is_positive(),
        SignConvention::Positive => value.magnitude.is_negative(),
        SignConvention::Unspecified => false,
    }
}

fn missing_or_zero(term: &RuleTerm, total: f64) -> bool {
    match term.status {
        TermStatus::Absent => true,
        TermStatus::Unparseable => false,
        TermStatus::Observed => term.value.as_ref().is_some_and(|value| {
            let magnitude = value.magnitude.abs().to_f64();
            magnitude == 0.0 || (total > 0.0 && share_negligible(magnitude / total))
        }),
    }
}

fn top_contributor(
    observed: &[(&RuleTerm, f64)],
    magnitudes: &[f64],
    total: f64,
    center: f64,
) -> Option<DominantContributor> {
    if total <= 0.0 {
        return None;
    }
    let mut ranked = observed.to_vec();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let (term, top) = *ranked.first()?;
    let share = top / total;

    let kind = match ranked.len() {
        0 | 1 => None,
        n if n <= SMALL_SET_MAX => {
            let second = ranked[1].1;
            let ratio = top / if second > 0.0 { second } else { 1.0 };
            small_set_outlier(ratio, share).then_some(ContributorKind::Outlier)
        }
        n if n <= MID_SET_MAX => {
            if center > 0.0 {
                mid_set_outlier(top / center, share)
            } else {
                (share >= DOMINANT_SHARE).then_some(ContributorKind::Dominant)
            }
        }
        _ => {
            if center > 0.0 {
                let robust_z = (top - center).abs() / median_absolute_deviation(magnitudes, center);
                large_set_outlier(top / center, robust_z, share).then_some(ContributorKind::Outlier)
            } else {
                None
            }
        }
    }?;

    Some(DominantContributor {
        term: term.clone(),
        share,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use xbrl_model::{ColCode, Decimal, NumericValue, Operator, RowCode};

    use super::*;

    fn term(row: u32, label: &str, value: Option<i64>) -> RuleTerm {
        let term = RuleTerm::new(
            RowCode::new(row.to_string()).unwrap(),
            label,
            ColCode::new("10").unwrap(),
            "Amount",
        );
        match value {
            Some(v) => term.with_value(NumericValue::new(Decimal::from_i64(v), v.to_string())),
            None => term,
        }
    }

    fn rule(lhs: i64, rhs: &[Option<i64>]) -> RuleInstance {
        let rhs = rhs
            .iter()
            .enumerate()
            .map(|(i, v)| term(20 + 10 * i as u32, "Component", *v))
            .collect();
        RuleInstance::new("v1", term(10, "Total", Some(lhs)), Operator::Eq, rhs, "T", "")
            .unwrap()
    }

    #[test]
    fn small_set_tiers_at_their_boundaries() {
        assert!(small_set_outlier(2.0, 0.80));
        assert!(!small_set_outlier(2.0, 0.7999));
        assert!(small_set_outlier(1.5, 0.90));
        assert!(!small_set_outlier(1.5, 0.8999));
        assert!(!small_set_outlier(1.4999, 0.95));
    }

    #[test]
    fn three_terms_below_share_thresholds_are_not_outliers() {
        // 2.5x the second largest but only 66.7% of the sum.
        let flags = analyze(&rule(150, &[Some(100), Some(40), Some(10)]));
        assert!(flags.dominant_outliers.is_empty());

        let flags = analyze(&rule(100, &[Some(90), Some(5), Some(5)]));
        assert_eq!(flags.dominant_outliers.len(), 1);
        assert_eq!(flags.dominant_outliers[0].kind, ContributorKind::Outlier);
        assert_eq!(flags.dominant_outliers[0].term.row_code.as_str(), "0020");
    }

    #[test]
    fn mid_set_distinguishes_outlier_from_dominant() {
        assert_eq!(mid_set_outlier(4.0, 0.60), Some(ContributorKind::Outlier));
        assert_eq!(mid_set_outlier(3.9, 0.70), Some(ContributorKind::Dominant));
        assert_eq!(mid_set_outlier(10.0, 0.49), None);

        let flags = analyze(&rule(100, &[Some(50), Some(30), Some(10), Some(10)]));
        assert_eq!(flags.dominant_outliers[0].kind, ContributorKind::Dominant);
        assert!((flags.dominant_outliers[0].share - 0.5).abs() < 1e-12);
    }

    #[test]
    fn large_set_needs_ratio_z_and_share() {
        assert!(large_set_outlier(5.0, 3.0, 0.40));
        assert!(!large_set_outlier(4.9, 10.0, 0.9));
        assert!(!large_set_outlier(9.0, 2.9, 0.9));
        assert!(!large_set_outlier(9.0, 10.0, 0.39));

        let mut values = vec![Some(10); 7];
        values.push(Some(200));
        let flags = analyze(&rule(270, &values));
        assert_eq!(flags.dominant_outliers[0].kind, ContributorKind::Outlier);
        assert_eq!(flags.dominant_outliers[0].term.row_code.as_str(), "0090");
    }

    #[test]
    fn even_median_averages_middle_values() {
        assert_eq!(median(&[1.0, 3.0, 2.0, 10.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median_absolute_deviation(&[5.0, 5.0, 5.0], 5.0), 1.0);
    }

    #[test]
    fn zero_and_absent_terms_are_missing() {
        let flags = analyze(&rule(500, &[Some(0), Some(500), None]));
        let rows: Vec<&str> = flags
            .missing_or_zero
            .iter()
            .map(|t| t.row_code.as_str())
            .collect();
        assert_eq!(rows, ["0020", "0040"]);

        let flags = analyze(&rule(1001, &[Some(1), Some(1000)]));
        assert_eq!(flags.missing_or_zero.len(), 1);
        assert!(share_negligible(0.00499));
        assert!(!share_negligible(0.005));
    }

    #[test]
    fn unparseable_terms_are_skipped() {
        let unreadable = term(20, "Component", None).with_unparseable("n/a");
        let rule = RuleInstance::new(
            "v1",
            term(10, "Total", Some(100)),
            Operator::Eq,
            vec![unreadable, term(30, "Component", Some(100))],
            "T",
            "",
        )
        .unwrap();
        let flags = analyze(&rule);
        assert!(flags.missing_or_zero.is_empty());
        assert!(!flags.scale_mismatch);
    }

    #[test]
    fn scale_from_ratio_or_dispersion() {
        assert!(scale_ratio_out_of_band(1000.1));
        assert!(!scale_ratio_out_of_band(1000.0));
        assert!(scale_ratio_out_of_band(0.0009));
        assert!(!scale_ratio_out_of_band(0.001));

        assert!(analyze(&rule(75_085_000, &[Some(68_246)])).scale_mismatch);
        assert!(analyze(&rule(5002, &[Some(1), Some(1), Some(5000)])).scale_mismatch);
        assert!(!analyze(&rule(100, &[Some(60), Some(40)])).scale_mismatch);
    }

    #[test]
    fn sign_follows_label_convention() {
        let rhs = vec![
            term(20, "(-) Goodwill", Some(300)),
            term(30, "Other deductions", Some(-10)),
        ];
        let rule = RuleInstance::new("v1", term(10, "Total", Some(290)), Operator::Eq, rhs, "T", "")
            .unwrap();
        let flags = analyze(&rule);
        assert_eq!(flags.sign_inversion.len(), 1);
        assert_eq!(flags.sign_inversion[0].row_code.as_str(), "0020");
        assert!(flags.any());
    }
}
