//! Time trend of one metric.
//!
//! Rows are bucketed by calendar period, the period length chosen from the
//! overall date span:
//! - span > 730 days: quarter
//! - span > 180 days: month
//! - span > 30 days: week (weeks end on Sunday)
//! - otherwise: day
//!
//! Buckets are labelled by their last day. Empty periods between the first
//! and last bucket are kept with a zero value.

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
}

impl Granularity {
    /// Period length for a date span of `span_days`.
    pub fn for_span(span_days: i64) -> Self {
        if span_days > 730 {
            Granularity::Quarter
        } else if span_days > 180 {
            Granularity::Month
        } else if span_days > 30 {
            Granularity::Week
        } else {
            Granularity::Day
        }
    }

    /// Last day of the period containing `date`.
    fn period_end(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Day => Some(date),
            Granularity::Week => {
                let to_sunday = (7 - date.weekday().num_days_from_sunday()) % 7;
                date.checked_add_days(Days::new(u64::from(to_sunday)))
            }
            Granularity::Month => month_end(date.year(), date.month()),
            Granularity::Quarter => month_end(date.year(), (date.month() - 1) / 3 * 3 + 3),
        }
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// One bucket of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period_end: NaiveDate,
    pub value: Decimal,
}

/// Metric totals (or row counts) per period, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub time_column: String,
    /// `None` when rows were counted instead of summed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_column: Option<String>,
    pub granularity: Granularity,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Flat => "flat",
        };
        f.write_str(s)
    }
}

/// First against last bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub start: Decimal,
    pub current: Decimal,
    pub direction: TrendDirection,
}

/// Bucket `value_column` (or the row count when `None`) by `time_column`.
///
/// Rows whose time cell is not a date are skipped. With a value column,
/// non-numeric values count as zero and negative values drop the row.
/// `None` when the time column is missing, no row has a date, or a bucket
/// total overflows.
pub fn analyze_time_series(
    table: &Table,
    time_column: &str,
    value_column: Option<&str>,
) -> Option<TimeSeries> {
    let time_idx = table.column_index(time_column)?;
    let value_idx = match value_column {
        Some(c) => Some(table.column_index(c)?),
        None => None,
    };

    let mut dated: Vec<(NaiveDate, Decimal)> = Vec::new();
    for row in 0..table.len() {
        let Some(date) = table.cell(row, time_idx).as_date() else {
            continue;
        };
        let value = match value_idx {
            Some(idx) => table.cell(row, idx).as_number().unwrap_or(Decimal::ZERO),
            None => Decimal::ONE,
        };
        if value < Decimal::ZERO {
            continue;
        }
        dated.push((date, value));
    }
    let first = dated.iter().map(|(d, _)| *d).min()?;
    let last = dated.iter().map(|(d, _)| *d).max()?;
    let granularity = Granularity::for_span((last - first).num_days());

    let mut buckets: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (date, value) in dated {
        let end = granularity.period_end(date)?;
        let slot = buckets.entry(end).or_insert(Decimal::ZERO);
        let Some(sum) = slot.checked_add(value) else {
            log::warn!("time trend: '{time_column}' bucket total overflows");
            return None;
        };
        *slot = sum;
    }

    let points = fill_gaps(&buckets, granularity)?;
    log::debug!(
        "time trend: {} {:?} buckets from '{time_column}'",
        points.len(),
        granularity
    );
    Some(TimeSeries {
        time_column: time_column.to_string(),
        value_column: value_column.map(str::to_string),
        granularity,
        points,
    })
}

fn fill_gaps(
    buckets: &BTreeMap<NaiveDate, Decimal>,
    granularity: Granularity,
) -> Option<Vec<TrendPoint>> {
    let (first, _) = buckets.first_key_value()?;
    let (last, _) = buckets.last_key_value()?;
    let mut points = Vec::new();
    let mut cursor = *first;
    while cursor <= *last {
        points.push(TrendPoint {
            period_end: cursor,
            value: buckets.get(&cursor).copied().unwrap_or(Decimal::ZERO),
        });
        cursor = granularity.period_end(cursor.succ_opt()?)?;
    }
    Some(points)
}

/// Compare the first and last buckets. `None` with fewer than two buckets.
pub fn summarize_trend(series: &TimeSeries) -> Option<TrendSummary> {
    if series.points.len() < 2 {
        return None;
    }
    let start = series.points.first()?.value;
    let current = series.points.last()?.value;
    let direction = match current.cmp(&start) {
        std::cmp::Ordering::Greater => TrendDirection::Rising,
        std::cmp::Ordering::Less => TrendDirection::Falling,
        std::cmp::Ordering::Equal => TrendDirection::Flat,
    };
    Some(TrendSummary {
        start,
        current,
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dated(rows: &[(&str, CellValue)]) -> Table {
        Table::new(
            vec!["date".into(), "qty".into()],
            rows.iter()
                .map(|(d, q)| vec![CellValue::from(*d), q.clone()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_granularity_thresholds() {
        assert_eq!(Granularity::for_span(0), Granularity::Day);
        assert_eq!(Granularity::for_span(30), Granularity::Day);
        assert_eq!(Granularity::for_span(31), Granularity::Week);
        assert_eq!(Granularity::for_span(181), Granularity::Month);
        assert_eq!(Granularity::for_span(731), Granularity::Quarter);
    }

    #[test]
    fn test_period_ends() {
        // 2024-01-03 is a Wednesday
        assert_eq!(Granularity::Week.period_end(ymd(2024, 1, 3)), Some(ymd(2024, 1, 7)));
        assert_eq!(Granularity::Week.period_end(ymd(2024, 1, 7)), Some(ymd(2024, 1, 7)));
        assert_eq!(Granularity::Month.period_end(ymd(2024, 2, 10)), Some(ymd(2024, 2, 29)));
        assert_eq!(Granularity::Quarter.period_end(ymd(2023, 11, 2)), Some(ymd(2023, 12, 31)));
        assert_eq!(Granularity::Quarter.period_end(ymd(2024, 4, 1)), Some(ymd(2024, 6, 30)));
    }

    #[test]
    fn test_daily_series_fills_gaps() {
        let t = dated(&[
            ("2024-05-01", dec!(10).into()),
            ("2024-05-03", dec!(4).into()),
            ("2024-05-01", dec!(5).into()),
            ("bad", dec!(99).into()),
            ("2024-05-02", dec!(-3).into()),
        ]);
        let series = analyze_time_series(&t, "date", Some("qty")).unwrap();
        assert_eq!(series.granularity, Granularity::Day);
        let values: Vec<Decimal> = series.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![dec!(15), Decimal::ZERO, dec!(4)]);

        let summary = summarize_trend(&series).unwrap();
        assert_eq!(summary.start, dec!(15));
        assert_eq!(summary.current, dec!(4));
        assert_eq!(summary.direction, TrendDirection::Falling);
    }

    #[test]
    fn test_monthly_counts_without_value_column() {
        let t = dated(&[
            ("2023-01-15", CellValue::Null),
            ("2023-01-20", CellValue::Null),
            ("2023-09-01", CellValue::Null),
        ]);
        let series = analyze_time_series(&t, "date", None).unwrap();
        assert_eq!(series.granularity, Granularity::Month);
        assert_eq!(series.points.len(), 9);
        assert_eq!(series.points[0].period_end, ymd(2023, 1, 31));
        assert_eq!(series.points[0].value, dec!(2));
        assert_eq!(series.points[8].value, dec!(1));
        assert_eq!(summarize_trend(&series).unwrap().direction, TrendDirection::Falling);
    }

    #[test]
    fn test_single_bucket_has_no_summary() {
        let t = dated(&[("2024-05-01", dec!(3).into()), ("2024-05-01", dec!(3).into())]);
        let series = analyze_time_series(&t, "date", Some("qty")).unwrap();
        assert_eq!(series.points.len(), 1);
        assert!(summarize_trend(&series).is_none());
    }

    #[test]
    fn test_unusable_inputs() {
        let t = dated(&[("someday", dec!(3).into())]);
        assert!(analyze_time_series(&t, "date", Some("qty")).is_none());
        assert!(analyze_time_series(&t, "when", Some("qty")).is_none());
        assert!(analyze_time_series(&t, "date", Some("amount")).is_none());
    }
}
