//! Concentration report for one entity dimension.
//!
//! Covers:
//! 1. **Top-k shares** -- sum of the k largest totals / grand total * 100
//! 2. **Coverage counts** -- smallest prefix reaching 80% / 90% of volume
//! 3. **Spread** -- median, max, max/median multiple, mean, sample std
//! 4. **Outliers** -- counts outside mean +/- 1.5 * std
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::distribution::positive_totals;
use crate::table::Table;
use crate::types::{percent_of, Percent, Volume};

const OUTLIER_STD_MULTIPLE: Decimal = dec!(1.5);

/// Distribution shape of one entity dimension against one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationReport {
    pub entity_count: usize,
    pub total: Volume,
    pub median: Volume,
    pub max: Volume,
    /// `None` when the median is zero.
    pub max_to_median_ratio: Option<Decimal>,
    pub top1_share: Percent,
    pub top3_share: Percent,
    pub top5_share: Percent,
    pub coverage_80_count: usize,
    pub coverage_90_count: usize,
    pub mean: Volume,
    pub std: Decimal,
    pub low_outlier_count: usize,
    pub high_outlier_count: usize,
    pub low_threshold: Decimal,
    pub high_threshold: Decimal,
}

/// Analyze how concentrated `metric_column` is across `entity_column`.
///
/// Returns `None` when a column is missing, the totals overflow or no
/// entity has a positive total; never fails otherwise.
pub fn analyze_concentration(
    table: &Table,
    entity_column: &str,
    metric_column: &str,
) -> Option<ConcentrationReport> {
    let Some(totals) = positive_totals(table, entity_column, metric_column) else {
        log::debug!("concentration skipped: no usable '{metric_column}' totals per '{entity_column}'");
        return None;
    };
    let values: Vec<Decimal> = totals.into_iter().map(|(_, v)| v).collect();
    if values.is_empty() {
        log::debug!("concentration skipped: no positive totals for '{metric_column}'");
        return None;
    }
    Some(report_from_sorted(&values))
}

/// Build the report from positive values sorted descending whose sum fits.
///
/// Ratio and thresholds can still leave Decimal's range for extreme inputs:
/// the ratio then becomes `None` and the thresholds saturate.
fn report_from_sorted(values: &[Decimal]) -> ConcentrationReport {
    let n = values.len();
    let total: Decimal = values.iter().copied().sum();
    let max = values[0];
    let median = median_of_descending(values);
    let max_to_median_ratio = if median.is_zero() {
        None
    } else {
        max.checked_div(median)
    };

    let mean = total / Decimal::from(n as u64);
    let std = sample_std(values, mean, max);
    let band = OUTLIER_STD_MULTIPLE.saturating_mul(std);
    let low_threshold = mean.saturating_sub(band);
    let high_threshold = mean.saturating_add(band);
    let low_outlier_count = values.iter().filter(|v| **v < low_threshold).count();
    let high_outlier_count = values.iter().filter(|v| **v > high_threshold).count();

    ConcentrationReport {
        entity_count: n,
        total,
        median,
        max,
        max_to_median_ratio,
        top1_share: top_k_share(values, total, 1),
        top3_share: top_k_share(values, total, 3),
        top5_share: top_k_share(values, total, 5),
        coverage_80_count: coverage_count(values, total, dec!(0.8)),
        coverage_90_count: coverage_count(values, total, dec!(0.9)),
        mean,
        std,
        low_outlier_count,
        high_outlier_count,
        low_threshold,
        high_threshold,
    }
}

/// Share of the `k` largest values, `k` clamped to the entity count.
fn top_k_share(sorted_desc: &[Decimal], total: Decimal, k: usize) -> Percent {
    let k = k.min(sorted_desc.len());
    let head: Decimal = sorted_desc[..k].iter().copied().sum();
    percent_of(head, total)
}

/// Smallest prefix length whose cumulative fraction reaches `threshold`.
fn coverage_count(sorted_desc: &[Decimal], total: Decimal, threshold: Decimal) -> usize {
    let mut cumulative = Decimal::ZERO;
    for (i, v) in sorted_desc.iter().enumerate() {
        cumulative += *v;
        if cumulative / total >= threshold {
            return i + 1;
        }
    }
    sorted_desc.len()
}

fn median_of_descending(sorted_desc: &[Decimal]) -> Decimal {
    let n = sorted_desc.len();
    let mid = n / 2;
    if n % 2 == 1 {
        sorted_desc[mid]
    } else {
        (sorted_desc[mid - 1] + sorted_desc[mid]) / dec!(2)
    }
}

/// Sample standard deviation (n - 1). Zero for a single value.
///
/// Deviations are scaled by `scale` before squaring so large business
/// volumes stay well inside Decimal's range.
fn sample_std(values: &[Decimal], mean: Decimal, scale: Decimal) -> Decimal {
    let n = values.len();
    if n < 2 || scale <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let sum_sq: Decimal = values
        .iter()
        .map(|v| {
            let d = (*v - mean) / scale;
            d * d
        })
        .sum();
    let variance = sum_sq / Decimal::from((n - 1) as u64);
    sqrt_decimal(variance).saturating_mul(scale)
}

fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    val.sqrt().unwrap_or(Decimal::ZERO)
}
