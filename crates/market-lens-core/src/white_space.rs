//! White-space detection: groupings (cities, institutions, categories) with
//! high total volume but a low share captured by the target entity.
//!
//! The output table is the direct input of the opportunity ranking:
//! `grouping_total` is the total volume, `target_share` the current share and
//! `target_captured_volume` the target volume.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::opportunity::{build_opportunity_priority, OpportunityRecord};
use crate::table::{CellValue, Table};
use crate::types::{percent_of, Percent, Volume};
use crate::MarketLensResult;

pub const WHITE_SPACE_COLUMNS: [&str; 4] = [
    "entity_id",
    "grouping_total",
    "target_captured_volume",
    "target_share",
];

/// Running sums for one grouping.
#[derive(Default)]
struct GroupTally {
    total: Decimal,
    captured: Decimal,
    overflowed: bool,
}

/// Target position inside one grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteSpaceRow {
    /// Grouping key (city, institution...).
    pub entity_id: String,
    pub grouping_total: Volume,
    /// Zero when the target entity is absent from the grouping.
    pub target_captured_volume: Volume,
    pub target_share: Percent,
}

/// Per-grouping totals against the target entity's captured volume.
///
/// Sorted by target share ascending, then grouping total descending, so the
/// largest under-penetrated groupings come first. Empty when any column is
/// missing. A grouping whose total leaves Decimal's range is dropped.
pub fn detect_white_space(
    table: &Table,
    entity_col: &str,
    grouping_col: &str,
    metric_col: &str,
    target_entity: &str,
) -> Vec<WhiteSpaceRow> {
    let (Some(entity_idx), Some(grouping_idx), Some(metric_idx)) = (
        table.column_index(entity_col),
        table.column_index(grouping_col),
        table.column_index(metric_col),
    ) else {
        log::debug!("white-space skipped: required column missing");
        return Vec::new();
    };
    let target = target_entity.trim();

    let mut groups: BTreeMap<String, GroupTally> = BTreeMap::new();
    let mut negative_rows = 0usize;
    for row in 0..table.len() {
        let Some(grouping) = table.cell(row, grouping_idx).as_identifier() else {
            continue;
        };
        let Some(value) = table.cell(row, metric_idx).as_number() else {
            continue;
        };
        if value < Decimal::ZERO {
            negative_rows += 1;
            continue;
        }
        let tally = groups.entry(grouping).or_default();
        if tally.overflowed {
            continue;
        }
        let Some(total) = tally.total.checked_add(value) else {
            tally.overflowed = true;
            continue;
        };
        tally.total = total;
        let is_target = table
            .cell(row, entity_idx)
            .as_text()
            .is_some_and(|e| e == target);
        if is_target {
            // captured never exceeds total
            tally.captured += value;
        }
    }
    if negative_rows > 0 {
        log::debug!("white-space: dropped {negative_rows} rows with negative volume");
    }
    let overflowed = groups.values().filter(|t| t.overflowed).count();
    if overflowed > 0 {
        log::warn!("white-space: dropped {overflowed} '{grouping_col}' groupings whose total overflows");
    }

    let mut rows: Vec<WhiteSpaceRow> = groups
        .into_iter()
        .filter(|(_, t)| !t.overflowed && t.total > Decimal::ZERO)
        .map(|(entity_id, t)| WhiteSpaceRow {
            entity_id,
            grouping_total: t.total,
            target_captured_volume: t.captured,
            target_share: percent_of(t.captured, t.total),
        })
        .collect();
    rows.sort_by(|a, b| {
        a.target_share
            .cmp(&b.target_share)
            .then_with(|| b.grouping_total.cmp(&a.grouping_total))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    if rows.iter().all(|r| r.target_captured_volume.is_zero()) && !rows.is_empty() {
        log::warn!("target entity '{target}' has no volume in any '{grouping_col}' grouping");
    }
    rows
}

/// Export rows as a table in `WHITE_SPACE_COLUMNS` order.
pub fn white_space_table(rows: &[WhiteSpaceRow]) -> MarketLensResult<Table> {
    let columns = WHITE_SPACE_COLUMNS.iter().map(|c| c.to_string()).collect();
    let cells = rows
        .iter()
        .map(|r| {
            vec![
                CellValue::from(r.entity_id.as_str()),
                r.grouping_total.into(),
                r.target_captured_volume.into(),
                r.target_share.into(),
            ]
        })
        .collect();
    Table::new(columns, cells)
}

/// Rank white-space rows with the opportunity scorer, using the captured
/// volume as the feasibility base.
pub fn prioritize_white_space(rows: &[WhiteSpaceRow], top_n: i64) -> Vec<OpportunityRecord> {
    let table = match white_space_table(rows) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("white-space export failed: {e}");
            return Vec::new();
        }
    };
    build_opportunity_priority(
        &table,
        WHITE_SPACE_COLUMNS[0],
        WHITE_SPACE_COLUMNS[1],
        WHITE_SPACE_COLUMNS[3],
        Some(WHITE_SPACE_COLUMNS[2]),
        top_n,
    )
}
