//! Price against volume at row level.
//!
//! Covers:
//! 1. **Correlation** -- Pearson coefficient of volume and price, banded
//!    weak (|r| < 0.2), moderate (< 0.5) or strong
//! 2. **Quadrants** -- entities with price at or below the median price and
//!    volume at or above the median volume, and the reverse corner
//!
//! Deviations are scaled by their largest magnitude before squaring; the
//! coefficient is scale-invariant and the sums stay small.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::table::Table;
use crate::types::checked_sum;

/// Rows needed before a correlation is attempted.
pub const MIN_PRICED_ROWS: usize = 3;

/// Names kept per quadrant list.
pub const QUADRANT_NAME_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: Decimal) -> Self {
        let r = r.abs();
        if r < dec!(0.2) {
            CorrelationStrength::Weak
        } else if r < dec!(0.5) {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Strong
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceVolumeReport {
    pub price_column: String,
    pub priced_rows: usize,
    /// `None` when either series is constant.
    pub correlation: Option<Decimal>,
    pub strength: Option<CorrelationStrength>,
    pub low_price_high_volume: Vec<String>,
    pub high_price_low_volume: Vec<String>,
}

struct PricedRow {
    entity: String,
    volume: Decimal,
    price: Decimal,
}

/// Relate `price_column` to `metric_column` over rows where the entity,
/// the metric and the price are all present.
///
/// `None` when a column is missing or fewer than `MIN_PRICED_ROWS` rows
/// qualify.
pub fn analyze_price_volume(
    table: &Table,
    entity_column: &str,
    metric_column: &str,
    price_column: &str,
) -> Option<PriceVolumeReport> {
    let entity_idx = table.column_index(entity_column)?;
    let metric_idx = table.column_index(metric_column)?;
    let price_idx = table.column_index(price_column)?;

    let rows: Vec<PricedRow> = (0..table.len())
        .filter_map(|row| {
            Some(PricedRow {
                entity: table.cell(row, entity_idx).as_identifier()?,
                volume: table.cell(row, metric_idx).as_number()?,
                price: table.cell(row, price_idx).as_number()?,
            })
        })
        .collect();
    if rows.len() < MIN_PRICED_ROWS {
        log::debug!("price analysis skipped: {} priced rows", rows.len());
        return None;
    }

    let volumes: Vec<Decimal> = rows.iter().map(|r| r.volume).collect();
    let prices: Vec<Decimal> = rows.iter().map(|r| r.price).collect();
    let correlation = pearson(&volumes, &prices);

    let price_median = median(&prices);
    let volume_median = median(&volumes);
    let low_price_high_volume = distinct_names(
        rows.iter()
            .filter(|r| r.price <= price_median && r.volume >= volume_median),
    );
    let high_price_low_volume = distinct_names(
        rows.iter()
            .filter(|r| r.price > price_median && r.volume < volume_median),
    );

    Some(PriceVolumeReport {
        price_column: price_column.to_string(),
        priced_rows: rows.len(),
        correlation,
        strength: correlation.map(CorrelationStrength::from_coefficient),
        low_price_high_volume,
        high_price_low_volume,
    })
}

fn distinct_names<'a>(rows: impl Iterator<Item = &'a PricedRow>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        if names.len() == QUADRANT_NAME_LIMIT {
            break;
        }
        if !names.contains(&row.entity) {
            names.push(row.entity.clone());
        }
    }
    names
}

fn median(values: &[Decimal]) -> Decimal {
    let mut sorted = values.to_vec();
    sorted.sort();
    let n = sorted.len();
    if n == 0 {
        return Decimal::ZERO;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        sorted[mid]
    } else {
        sorted[mid - 1] / dec!(2) + sorted[mid] / dec!(2)
    }
}

/// Deviations from the mean divided by the largest deviation magnitude.
///
/// `None` for a constant series or when the mean or a deviation overflows.
fn scaled_deviations(values: &[Decimal]) -> Option<Vec<Decimal>> {
    let mean = checked_sum(values.iter().copied())? / Decimal::from(values.len() as u64);
    let deviations: Vec<Decimal> = values
        .iter()
        .map(|v| v.checked_sub(mean))
        .collect::<Option<_>>()?;
    let scale = deviations.iter().map(|d| d.abs()).max()?;
    if scale.is_zero() {
        return None;
    }
    Some(deviations.into_iter().map(|d| d / scale).collect())
}

fn pearson(xs: &[Decimal], ys: &[Decimal]) -> Option<Decimal> {
    let dx = scaled_deviations(xs)?;
    let dy = scaled_deviations(ys)?;
    let covariance: Decimal = dx.iter().zip(&dy).map(|(a, b)| *a * *b).sum();
    let sxx: Decimal = dx.iter().map(|a| *a * *a).sum();
    let syy: Decimal = dy.iter().map(|b| *b * *b).sum();
    let denominator = (sxx * syy).sqrt()?;
    if denominator.is_zero() {
        return None;
    }
    Some((covariance / denominator).max(dec!(-1)).min(dec!(1)))
}
