//! Score primitives shared by the opportunity ranking.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{clamp_percent, Score};

/// Spreads narrower than this are treated as a constant series.
pub const NORMALIZE_EPSILON: Decimal = dec!(0.000000001);

/// Score assigned to every member of a constant series.
pub const MIDPOINT_SCORE: Decimal = dec!(50);

/// Priority band derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityLabel {
    High,
    #[serde(rename = "Mid-High")]
    MidHigh,
    Mid,
    Watch,
}

impl PriorityLabel {
    /// >= 70 High, >= 55 Mid-High, >= 40 Mid, otherwise Watch.
    pub fn from_composite(score: Score) -> Self {
        if score >= dec!(70) {
            PriorityLabel::High
        } else if score >= dec!(55) {
            PriorityLabel::MidHigh
        } else if score >= dec!(40) {
            PriorityLabel::Mid
        } else {
            PriorityLabel::Watch
        }
    }
}

impl fmt::Display for PriorityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriorityLabel::High => "High",
            PriorityLabel::MidHigh => "Mid-High",
            PriorityLabel::Mid => "Mid",
            PriorityLabel::Watch => "Watch",
        };
        f.write_str(s)
    }
}

/// Min-max normalize `values` onto [0, 100].
///
/// A constant series (spread below `NORMALIZE_EPSILON`) maps every value to
/// 50 instead of dividing by zero.
pub fn normalize_scores(values: &[Decimal]) -> Vec<Score> {
    let Some(min) = values.iter().copied().min() else {
        return Vec::new();
    };
    let max = values.iter().copied().max().unwrap_or(min);
    let spread = max - min;
    if spread < NORMALIZE_EPSILON {
        return vec![MIDPOINT_SCORE; values.len()];
    }
    values
        .iter()
        .map(|v| clamp_percent((*v - min) / spread * dec!(100)))
        .collect()
}

/// Geometric mean of three [0, 100] factors. Exactly zero when any factor is.
pub fn composite_score(impact: Score, feasibility: Score, efficiency: Score) -> Score {
    let product = impact * feasibility * efficiency;
    if product <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    clamp_percent(cbrt_decimal(product))
}

/// ln(1 + x) for non-negative x.
pub fn ln_1p(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (Decimal::ONE + x).checked_ln().unwrap_or(Decimal::ZERO)
}

/// Newton's method cube root: y_{n+1} = (2*y_n + x/y_n^2) / 3.
///
/// Starting from max(1, x) keeps the iteration above the root, so it
/// decreases monotonically until it settles.
fn cbrt_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if x == Decimal::ONE {
        return Decimal::ONE;
    }
    let three = dec!(3);
    let mut guess = x.max(Decimal::ONE);
    for _ in 0..120 {
        let next = (dec!(2) * guess + x / (guess * guess)) / three;
        if next >= guess {
            break;
        }
        guess = next;
    }
    guess
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_constant_series() {
        let scores = normalize_scores(&[dec!(7), dec!(7), dec!(7)]);
        assert_eq!(scores, vec![dec!(50), dec!(50), dec!(50)]);
    }

    #[test]
    fn test_normalize_range() {
        let scores = normalize_scores(&[dec!(10), dec!(20), dec!(30)]);
        assert_eq!(scores, vec![dec!(0), dec!(50), dec!(100)]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn test_cbrt_values() {
        for (x, root) in [
            (dec!(27), dec!(3)),
            (dec!(1000000), dec!(100)),
            (dec!(0.001), dec!(0.1)),
            (dec!(125000), dec!(50)),
        ] {
            let got = cbrt_decimal(x);
            assert!((got - root).abs() < dec!(0.0000001), "cbrt({x}) = {got}");
        }
    }

    #[test]
    fn test_composite_zero_factor() {
        assert_eq!(composite_score(dec!(0), dec!(90), dec!(90)), Decimal::ZERO);
        assert_eq!(composite_score(dec!(90), dec!(90), dec!(0)), Decimal::ZERO);
    }

    #[test]
    fn test_composite_bounds() {
        let top = composite_score(dec!(100), dec!(100), dec!(100));
        assert!(top <= dec!(100));
        assert!(top > dec!(99.9999));
        let mid = composite_score(dec!(50), dec!(50), dec!(50));
        assert!((mid - dec!(50)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_ln_1p() {
        assert_eq!(ln_1p(Decimal::ZERO), Decimal::ZERO);
        let e_minus_one = dec!(1.718281828459045235360287471);
        assert!((ln_1p(e_minus_one) - Decimal::ONE).abs() < dec!(0.000001));
    }

    #[test]
    fn test_labels() {
        assert_eq!(PriorityLabel::from_composite(dec!(70)), PriorityLabel::High);
        assert_eq!(PriorityLabel::from_composite(dec!(69.99)), PriorityLabel::MidHigh);
        assert_eq!(PriorityLabel::from_composite(dec!(55)), PriorityLabel::MidHigh);
        assert_eq!(PriorityLabel::from_composite(dec!(40)), PriorityLabel::Mid);
        assert_eq!(PriorityLabel::from_composite(dec!(39.9)), PriorityLabel::Watch);
        assert_eq!(PriorityLabel::MidHigh.to_string(), "Mid-High");
        assert_eq!(
            serde_json::to_value(PriorityLabel::MidHigh).unwrap(),
            serde_json::json!("Mid-High")
        );
    }
}
