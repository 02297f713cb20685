//! Leading entities inside each grouping (top three brands per city, for
//! instance) with their shares of the grouping and the combined CR3.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::table::Table;
use crate::types::{checked_sum, percent_of, Percent, Volume};

/// Leaders kept per grouping.
pub const LEADER_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingLeader {
    pub entity_id: String,
    pub volume: Volume,
    /// Share of the grouping total.
    pub share: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingLeaders {
    pub grouping_id: String,
    pub grouping_total: Volume,
    /// At most `LEADER_COUNT`, largest first (ties by id).
    pub leaders: Vec<GroupingLeader>,
    /// Combined share of the listed leaders.
    pub cr3: Percent,
}

/// Top entities of every grouping, groupings in id order.
///
/// Row admission follows the entity distribution. Groupings without positive
/// volume, or whose totals overflow, are left out. Empty when a column is
/// missing.
pub fn grouping_leaders(
    table: &Table,
    grouping_column: &str,
    entity_column: &str,
    metric_column: &str,
) -> Vec<GroupingLeaders> {
    let (Some(grouping_idx), Some(entity_idx), Some(metric_idx)) = (
        table.column_index(grouping_column),
        table.column_index(entity_column),
        table.column_index(metric_column),
    ) else {
        return Vec::new();
    };

    // grouping -> entity -> volume; `None` once the pair overflows
    let mut cells: BTreeMap<String, BTreeMap<String, Option<Decimal>>> = BTreeMap::new();
    for row in 0..table.len() {
        let (Some(grouping), Some(entity), Some(value)) = (
            table.cell(row, grouping_idx).as_identifier(),
            table.cell(row, entity_idx).as_identifier(),
            table.cell(row, metric_idx).as_number(),
        ) else {
            continue;
        };
        if value < Decimal::ZERO {
            continue;
        }
        let slot = cells
            .entry(grouping)
            .or_default()
            .entry(entity)
            .or_insert(Some(Decimal::ZERO));
        *slot = slot.and_then(|sum| sum.checked_add(value));
    }

    let mut out = Vec::with_capacity(cells.len());
    let mut overflowed = 0usize;
    for (grouping_id, entities) in cells {
        let Some(volumes) = entities
            .into_iter()
            .map(|(id, v)| v.map(|v| (id, v)))
            .collect::<Option<Vec<(String, Decimal)>>>()
        else {
            overflowed += 1;
            continue;
        };
        let Some(total) = checked_sum(volumes.iter().map(|(_, v)| *v)) else {
            overflowed += 1;
            continue;
        };
        if total <= Decimal::ZERO {
            continue;
        }
        out.push(rank_leaders(grouping_id, total, volumes));
    }
    if overflowed > 0 {
        log::warn!("leaders: dropped {overflowed} '{grouping_column}' groupings whose total overflows");
    }
    out
}

fn rank_leaders(
    grouping_id: String,
    total: Decimal,
    mut volumes: Vec<(String, Decimal)>,
) -> GroupingLeaders {
    volumes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    volumes.truncate(LEADER_COUNT);
    let leaders: Vec<GroupingLeader> = volumes
        .into_iter()
        .map(|(entity_id, volume)| GroupingLeader {
            share: percent_of(volume, total),
            entity_id,
            volume,
        })
        .collect();
    let leader_volume: Decimal = leaders.iter().map(|l| l.volume).sum();
    GroupingLeaders {
        grouping_id,
        grouping_total: total,
        cr3: percent_of(leader_volume, total),
        leaders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use rust_decimal_macros::dec;

    fn sales(rows: &[(&str, &str, Decimal)]) -> Table {
        Table::new(
            vec!["city".into(), "brand".into(), "qty".into()],
            rows.iter()
                .map(|(c, b, q)| vec![CellValue::from(*c), CellValue::from(*b), (*q).into()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_top_three_and_cr3() {
        let t = sales(&[
            ("Wuxi", "A", dec!(40)),
            ("Wuxi", "B", dec!(25)),
            ("Wuxi", "C", dec!(20)),
            ("Wuxi", "D", dec!(15)),
            ("Suzhou", "B", dec!(9)),
            ("Suzhou", "A", dec!(1)),
            ("Wuxi", "A", dec!(-5)),
        ]);
        let leaders = grouping_leaders(&t, "city", "brand", "qty");
        assert_eq!(leaders.len(), 2);

        let suzhou = &leaders[0];
        assert_eq!(suzhou.grouping_id, "Suzhou");
        assert_eq!(suzhou.leaders.len(), 2);
        assert_eq!(suzhou.leaders[0].share, dec!(90));
        assert_eq!(suzhou.cr3, dec!(100));

        let wuxi = &leaders[1];
        assert_eq!(wuxi.grouping_total, dec!(100));
        let ids: Vec<&str> = wuxi.leaders.iter().map(|l| l.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(wuxi.cr3, dec!(85));
    }

    #[test]
    fn test_zero_and_overflowing_groupings_left_out() {
        let huge = Decimal::from_i128_with_scale(5 * 10i128.pow(28), 0);
        let t = sales(&[
            ("Empty", "A", dec!(0)),
            ("Big", "A", huge),
            ("Big", "B", huge),
            ("Small", "A", dec!(2)),
        ]);
        let leaders = grouping_leaders(&t, "city", "brand", "qty");
        let ids: Vec<&str> = leaders.iter().map(|g| g.grouping_id.as_str()).collect();
        assert_eq!(ids, vec!["Small"]);
    }

    #[test]
    fn test_missing_column() {
        let t = sales(&[("Wuxi", "A", dec!(1))]);
        assert!(grouping_leaders(&t, "province", "brand", "qty").is_empty());
    }
}
