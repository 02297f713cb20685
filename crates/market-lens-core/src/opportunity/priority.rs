//! Opportunity priority ranking (impact x feasibility x efficiency).
//!
//! Covers:
//! 1. **Impact** -- uncaptured volume, total * (100 - share) / 100
//! 2. **Feasibility** -- ln(1 + target volume), or the share gap when no
//!    target volume column is available
//! 3. **Efficiency** -- 100 - normalized ln(1 + total); larger groupings
//!    approximate heavier investment
//! 4. **Composite** -- geometric mean of the three normalized factors
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::rationale::{rationale_for, FactorScores};
use super::scoring::{composite_score, ln_1p, normalize_scores, PriorityLabel};
use crate::table::{CellValue, Table};
use crate::types::{clamp_percent, Percent, Score, Volume};
use crate::MarketLensResult;

/// One ranked opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub entity_id: String,
    pub total_volume: Volume,
    pub current_share: Percent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_volume: Option<Volume>,
    pub impact_score: Score,
    pub feasibility_score: Score,
    pub efficiency_score: Score,
    pub composite_score: Score,
    pub priority_label: PriorityLabel,
    pub rationale_text: String,
}

/// Export column order for `opportunity_table`.
pub const OPPORTUNITY_COLUMNS: [&str; 10] = [
    "entity_id",
    "total_volume",
    "current_share",
    "target_volume",
    "impact_score",
    "feasibility_score",
    "efficiency_score",
    "composite_score",
    "priority_label",
    "rationale_text",
];

/// A row that survived validation.
struct Candidate {
    entity_id: String,
    total: Decimal,
    share: Decimal,
    target_volume: Option<Decimal>,
}

/// Rank the entities of `table` as expansion opportunities.
///
/// Returns an empty vector (never an error) when the table is empty, a
/// required column is missing, or no row survives filtering. `top_n <= 0`
/// keeps every record.
pub fn build_opportunity_priority(
    table: &Table,
    entity_col: &str,
    total_col: &str,
    share_col: &str,
    target_volume_col: Option<&str>,
    top_n: i64,
) -> Vec<OpportunityRecord> {
    if table.is_empty() {
        return Vec::new();
    }
    let (Some(entity_idx), Some(total_idx), Some(share_idx)) = (
        table.column_index(entity_col),
        table.column_index(total_col),
        table.column_index(share_col),
    ) else {
        log::debug!("opportunity scoring skipped: required column missing");
        return Vec::new();
    };
    let target_idx = target_volume_col.and_then(|c| table.column_index(c));

    let candidates = collect_candidates(table, entity_idx, total_idx, share_idx, target_idx);
    if candidates.is_empty() {
        log::debug!("opportunity scoring skipped: no rows survived filtering");
        return Vec::new();
    }

    let mut records = score_candidates(candidates, target_idx.is_some());
    records.sort_by(rank_order);
    if top_n > 0 {
        records.truncate(top_n as usize);
    }
    records
}

fn collect_candidates(
    table: &Table,
    entity_idx: usize,
    total_idx: usize,
    share_idx: usize,
    target_idx: Option<usize>,
) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(table.len());
    let mut dropped = 0usize;
    for row in 0..table.len() {
        let total_cell = table.cell(row, total_idx);
        let Some(entity_id) = table.cell(row, entity_idx).as_identifier() else {
            dropped += 1;
            continue;
        };
        if total_cell.is_null() {
            dropped += 1;
            continue;
        }
        let total = total_cell.as_number().unwrap_or(Decimal::ZERO);
        if total <= Decimal::ZERO {
            dropped += 1;
            continue;
        }
        let share = clamp_percent(table.cell(row, share_idx).as_number().unwrap_or(Decimal::ZERO));
        let target_volume = match target_idx {
            Some(idx) => {
                let v = table.cell(row, idx).as_number().unwrap_or(Decimal::ZERO);
                if v < Decimal::ZERO {
                    dropped += 1;
                    continue;
                }
                Some(v)
            }
            None => None,
        };
        out.push(Candidate {
            entity_id,
            total,
            share,
            target_volume,
        });
    }
    if dropped > 0 {
        log::debug!("opportunity scoring: dropped {dropped} invalid rows");
    }
    out
}

fn score_candidates(candidates: Vec<Candidate>, has_target: bool) -> Vec<OpportunityRecord> {
    let gap_ratios: Vec<Decimal> = candidates
        .iter()
        .map(|c| (dec!(100) - c.share) / dec!(100))
        .collect();
    let impact_raw: Vec<Decimal> = candidates
        .iter()
        .zip(&gap_ratios)
        .map(|(c, gap)| c.total * *gap)
        .collect();
    let feasibility_raw: Vec<Decimal> = if has_target {
        candidates
            .iter()
            .map(|c| ln_1p(c.target_volume.unwrap_or(Decimal::ZERO)))
            .collect()
    } else {
        gap_ratios.clone()
    };
    let investment_raw: Vec<Decimal> = candidates.iter().map(|c| ln_1p(c.total)).collect();

    let impact = normalize_scores(&impact_raw);
    let feasibility = normalize_scores(&feasibility_raw);
    let investment = normalize_scores(&investment_raw);

    candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let factors = FactorScores {
                impact: impact[i],
                feasibility: feasibility[i],
                efficiency: clamp_percent(dec!(100) - investment[i]),
            };
            let composite =
                composite_score(factors.impact, factors.feasibility, factors.efficiency);
            OpportunityRecord {
                entity_id: c.entity_id,
                total_volume: c.total,
                current_share: c.share,
                target_volume: c.target_volume,
                impact_score: factors.impact,
                feasibility_score: factors.feasibility,
                efficiency_score: factors.efficiency,
                composite_score: composite,
                priority_label: PriorityLabel::from_composite(composite),
                rationale_text: rationale_for(&factors),
            }
        })
        .collect()
}

/// Composite, impact, feasibility descending; the remaining keys only make
/// the order independent of input row order.
fn rank_order(a: &OpportunityRecord, b: &OpportunityRecord) -> Ordering {
    b.composite_score
        .cmp(&a.composite_score)
        .then_with(|| b.impact_score.cmp(&a.impact_score))
        .then_with(|| b.feasibility_score.cmp(&a.feasibility_score))
        .then_with(|| a.entity_id.cmp(&b.entity_id))
        .then_with(|| b.total_volume.cmp(&a.total_volume))
        .then_with(|| a.current_share.cmp(&b.current_share))
}

/// Export records as a table in `OPPORTUNITY_COLUMNS` order. The
/// `target_volume` column is present only when some record carries one.
pub fn opportunity_table(records: &[OpportunityRecord]) -> MarketLensResult<Table> {
    let with_target = records.iter().any(|r| r.target_volume.is_some());
    let columns: Vec<String> = OPPORTUNITY_COLUMNS
        .iter()
        .filter(|c| with_target || **c != "target_volume")
        .map(|c| c.to_string())
        .collect();

    let rows = records
        .iter()
        .map(|r| {
            let mut row = vec![
                CellValue::from(r.entity_id.as_str()),
                r.total_volume.into(),
                r.current_share.into(),
            ];
            if with_target {
                row.push(r.target_volume.into());
            }
            row.extend([
                r.impact_score.into(),
                r.feasibility_score.into(),
                r.efficiency_score.into(),
                r.composite_score.into(),
                CellValue::Text(r.priority_label.to_string()),
                CellValue::from(r.rationale_text.as_str()),
            ]);
            row
        })
        .collect();
    Table::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_table(rows: &[(&str, Decimal, Decimal)]) -> Table {
        Table::new(
            vec!["city".into(), "total".into(), "share".into()],
            rows.iter()
                .map(|(c, t, s)| vec![CellValue::from(*c), (*t).into(), (*s).into()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_share_gap_fallback_for_feasibility() {
        let t = city_table(&[
            ("A", dec!(1000), dec!(10)),
            ("B", dec!(1000), dec!(50)),
        ]);
        let ranked = build_opportunity_priority(&t, "city", "total", "share", None, 0);
        assert_eq!(ranked.len(), 2);
        // equal totals: investment is constant, so efficiency sits at 50
        assert!(ranked.iter().all(|r| r.efficiency_score == dec!(50)));
        assert_eq!(ranked[0].entity_id, "A");
        assert_eq!(ranked[0].impact_score, dec!(100));
        assert_eq!(ranked[0].feasibility_score, dec!(100));
        assert_eq!(ranked[1].composite_score, Decimal::ZERO);
        assert!(ranked.iter().all(|r| r.target_volume.is_none()));
    }

    #[test]
    fn test_missing_target_column_falls_back() {
        let t = city_table(&[("A", dec!(10), dec!(1)), ("B", dec!(20), dec!(2))]);
        let with_missing = build_opportunity_priority(&t, "city", "total", "share", Some("nope"), 0);
        let without = build_opportunity_priority(&t, "city", "total", "share", None, 0);
        assert_eq!(with_missing, without);
    }

    #[test]
    fn test_share_clamped_and_nonpositive_dropped() {
        let t = city_table(&[
            ("A", dec!(100), dec!(150)),
            ("B", dec!(0), dec!(5)),
            ("C", dec!(-4), dec!(5)),
            ("D", dec!(200), dec!(-20)),
        ]);
        let ranked = build_opportunity_priority(&t, "city", "total", "share", None, 0);
        let ids: Vec<&str> = ranked.iter().map(|r| r.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["D", "A"]);
        assert_eq!(ranked[0].current_share, Decimal::ZERO);
        assert_eq!(ranked[1].current_share, dec!(100));
    }

    #[test]
    fn test_truncation() {
        let t = city_table(&[
            ("A", dec!(100), dec!(1)),
            ("B", dec!(200), dec!(2)),
            ("C", dec!(300), dec!(3)),
        ]);
        assert_eq!(build_opportunity_priority(&t, "city", "total", "share", None, 2).len(), 2);
        assert_eq!(build_opportunity_priority(&t, "city", "total", "share", None, -1).len(), 3);
    }

    #[test]
    fn test_table_export_columns() {
        let t = city_table(&[("A", dec!(100), dec!(1)), ("B", dec!(200), dec!(2))]);
        let ranked = build_opportunity_priority(&t, "city", "total", "share", None, 0);
        let exported = opportunity_table(&ranked).unwrap();
        assert_eq!(exported.columns().len(), 9);
        assert!(!exported.has_column("target_volume"));
        assert_eq!(exported.columns()[0], "entity_id");
        assert_eq!(exported.columns()[8], "rationale_text");
        assert_eq!(exported.len(), 2);
    }
}
