//! Entity distribution: group-and-sum of one numeric column by one entity
//! column, plus the head/tail name lists derived from it.
//!
//! Rows are admitted when the entity cell is a usable identifier and the
//! metric cell coerces to a non-negative number. Negative volumes drop the
//! row. The distribution keeps positive totals only; the tail list also sees
//! entities whose admitted rows sum to zero.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::table::Table;
use crate::types::{checked_sum, percent_of, Percent, Volume};

/// One entity's summed volume and its share of the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAggregate {
    pub entity_id: String,
    pub total: Volume,
    /// total / grand total * 100
    pub share: Percent,
}

/// Head and long-tail entity names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadTail {
    /// Entities within the first 80% of cumulative volume (at least the top one).
    pub head: Vec<String>,
    /// Smallest entities, ascending by volume.
    pub tail: Vec<String>,
}

/// Per-entity totals, zero totals included, sorted descending (ties by id
/// ascending).
///
/// `None` when either column is absent or a total leaves Decimal's range.
/// When `Some`, the sum of all totals is known to fit.
pub(crate) fn grouped_totals(
    table: &Table,
    entity_column: &str,
    metric_column: &str,
) -> Option<Vec<(String, Decimal)>> {
    let entity_idx = table.column_index(entity_column)?;
    let metric_idx = table.column_index(metric_column)?;

    let mut sums: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut negative_rows = 0usize;
    for row in 0..table.len() {
        let Some(entity) = table.cell(row, entity_idx).as_identifier() else {
            continue;
        };
        let Some(value) = table.cell(row, metric_idx).as_number() else {
            continue;
        };
        if value < Decimal::ZERO {
            negative_rows += 1;
            continue;
        }
        let slot = sums.entry(entity).or_insert(Decimal::ZERO);
        let Some(sum) = slot.checked_add(value) else {
            log::warn!("'{metric_column}' total per '{entity_column}' overflows; distribution unavailable");
            return None;
        };
        *slot = sum;
    }
    if negative_rows > 0 {
        log::debug!("{metric_column}: dropped {negative_rows} rows with negative volume");
    }
    if checked_sum(sums.values().copied()).is_none() {
        log::warn!("'{metric_column}' grand total overflows; distribution unavailable");
        return None;
    }

    let mut totals: Vec<(String, Decimal)> = sums.into_iter().collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Some(totals)
}

/// `grouped_totals` restricted to positive totals.
pub(crate) fn positive_totals(
    table: &Table,
    entity_column: &str,
    metric_column: &str,
) -> Option<Vec<(String, Decimal)>> {
    let mut totals = grouped_totals(table, entity_column, metric_column)?;
    totals.retain(|(_, v)| *v > Decimal::ZERO);
    Some(totals)
}

/// Every admitted entity with its total and share, zero totals included.
///
/// This is the input `head_and_tail` expects. Empty when a column is missing
/// or the totals overflow.
pub fn entity_totals(
    table: &Table,
    entity_column: &str,
    metric_column: &str,
) -> Vec<EntityAggregate> {
    let Some(totals) = grouped_totals(table, entity_column, metric_column) else {
        return Vec::new();
    };
    // grouped_totals guarantees the grand total fits
    let grand_total: Decimal = totals.iter().map(|(_, v)| *v).sum();
    totals
        .into_iter()
        .map(|(entity_id, total)| EntityAggregate {
            share: percent_of(total, grand_total),
            entity_id,
            total,
        })
        .collect()
}

/// Group `table` by `entity_column`, sum `metric_column` and attach shares.
///
/// Returns an empty vector when a column is missing, the totals overflow or
/// nothing positive survives.
pub fn aggregate_entities(
    table: &Table,
    entity_column: &str,
    metric_column: &str,
) -> Vec<EntityAggregate> {
    let mut aggregates = entity_totals(table, entity_column, metric_column);
    aggregates.retain(|a| a.total > Decimal::ZERO);
    aggregates
}

/// Head/tail name lists from a descending distribution.
///
/// Head entities are those whose cumulative share stays within 80% of the
/// total (the top entity when none does); tail entities are the `limit`
/// smallest, smallest first. Zero-total entities only ever reach the tail.
pub fn head_and_tail(aggregates: &[EntityAggregate], limit: usize) -> HeadTail {
    let Some(grand_total) = checked_sum(aggregates.iter().map(|a| a.total)) else {
        return HeadTail::default();
    };
    if grand_total <= Decimal::ZERO || limit == 0 {
        return HeadTail::default();
    }

    let mut head = Vec::new();
    let mut cumulative = Decimal::ZERO;
    for agg in aggregates {
        cumulative += agg.total;
        if cumulative / grand_total > dec!(0.8) {
            break;
        }
        head.push(agg.entity_id.clone());
    }
    if head.is_empty() {
        head.push(aggregates[0].entity_id.clone());
    }
    head.truncate(limit);

    let tail = aggregates
        .iter()
        .rev()
        .take(limit)
        .map(|a| a.entity_id.clone())
        .collect();

    HeadTail { head, tail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn table(rows: &[(&str, CellValue)]) -> Table {
        Table::new(
            vec!["brand".into(), "qty".into()],
            rows.iter()
                .map(|(b, q)| vec![CellValue::from(*b), q.clone()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_grouping_and_shares() {
        let t = table(&[
            ("A", dec!(30).into()),
            ("B", dec!(50).into()),
            ("A", dec!(20).into()),
        ]);
        let aggs = aggregate_entities(&t, "brand", "qty");
        assert_eq!(aggs.len(), 2);
        // A and B tie at 50; id order breaks the tie
        assert_eq!(aggs[0].entity_id, "A");
        assert_eq!(aggs[0].total, dec!(50));
        assert_eq!(aggs[0].share, dec!(50));
    }

    #[test]
    fn test_negative_and_null_rows_skipped() {
        let t = table(&[
            ("A", dec!(-10).into()),
            ("A", dec!(40).into()),
            ("nan", dec!(500).into()),
            ("B", CellValue::Null),
            ("C", "abc".into()),
            ("D", "60".into()),
        ]);
        let aggs = aggregate_entities(&t, "brand", "qty");
        let ids: Vec<&str> = aggs.iter().map(|a| a.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["D", "A"]);
        assert_eq!(aggs[1].total, dec!(40));
    }

    #[test]
    fn test_missing_column_empty() {
        let t = table(&[("A", dec!(1).into())]);
        assert!(aggregate_entities(&t, "brand", "amount").is_empty());
    }

    #[test]
    fn test_head_tail() {
        let t = table(&[
            ("A", dec!(50).into()),
            ("B", dec!(25).into()),
            ("C", dec!(15).into()),
            ("D", dec!(10).into()),
        ]);
        let aggs = aggregate_entities(&t, "brand", "qty");
        let ht = head_and_tail(&aggs, 5);
        assert_eq!(ht.head, vec!["A", "B"]);
        assert_eq!(ht.tail, vec!["D", "C", "B", "A"]);
    }

    #[test]
    fn test_head_falls_back_to_top_entity() {
        let t = table(&[("A", dec!(95).into()), ("B", dec!(5).into())]);
        let aggs = aggregate_entities(&t, "brand", "qty");
        let ht = head_and_tail(&aggs, 1);
        assert_eq!(ht.head, vec!["A"]);
        assert_eq!(ht.tail, vec!["B"]);
    }

    #[test]
    fn test_zero_total_entities_reach_tail_only() {
        let t = table(&[
            ("A", dec!(70).into()),
            ("B", dec!(30).into()),
            ("Z", dec!(0).into()),
        ]);
        let all = entity_totals(&t, "brand", "qty");
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].share, Decimal::ZERO);
        assert_eq!(aggregate_entities(&t, "brand", "qty").len(), 2);

        let ht = head_and_tail(&all, 2);
        assert_eq!(ht.head, vec!["A"]);
        assert_eq!(ht.tail, vec!["Z", "B"]);
    }

    #[test]
    fn test_overflowing_totals_are_unavailable() {
        let huge = Decimal::from_i128_with_scale(5 * 10i128.pow(28), 0);
        let same_entity = table(&[("A", huge.into()), ("A", huge.into())]);
        assert!(grouped_totals(&same_entity, "brand", "qty").is_none());
        assert!(aggregate_entities(&same_entity, "brand", "qty").is_empty());

        let split = table(&[("A", huge.into()), ("B", huge.into())]);
        assert!(entity_totals(&split, "brand", "qty").is_empty());
    }

    #[test]
    fn test_head_tail_overflowing_input_is_empty() {
        let aggs = vec![
            EntityAggregate {
                entity_id: "A".into(),
                total: Decimal::MAX,
                share: dec!(50),
            },
            EntityAggregate {
                entity_id: "B".into(),
                total: Decimal::MAX,
                share: dec!(50),
            },
        ];
        assert_eq!(head_and_tail(&aggs, 5), HeadTail::default());
    }
}
