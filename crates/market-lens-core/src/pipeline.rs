use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::concentration::{
    analyze_concentration, entity_totals, grouping_leaders, head_and_tail, ConcentrationReport,
    EntityAggregate, GroupingLeaders, HeadTail,
};
use crate::config::{AnalysisConfig, ResolvedColumns, SignalFlags};
use crate::error::MarketLensError;
use crate::narrative::{compose_narrative, MarketNarrative, NarrativeInput};
use crate::opportunity::{build_opportunity_priority, OpportunityRecord};
use crate::signals::{
    analyze_price_volume, analyze_structure, analyze_time_series, summarize_trend,
    PriceVolumeReport, StructureOverview, TimeSeries, TrendSummary,
};
use crate::table::Table;
use crate::types::{with_metadata, ComputationOutput};
use crate::white_space::{detect_white_space, prioritize_white_space, WhiteSpaceRow};
use crate::MarketLensResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Leaders, white-space table and ranked priorities for one grouping
/// dimension. White space and priorities need a target entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingOpportunities {
    pub grouping_column: String,
    pub label: String,
    pub leaders: Vec<GroupingLeaders>,
    pub white_space: Vec<WhiteSpaceRow>,
    pub priorities: Vec<OpportunityRecord>,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub columns: ResolvedColumns,
    pub concentration: Option<ConcentrationReport>,
    /// Per-entity totals, descending.
    pub distribution: Vec<EntityAggregate>,
    pub head_tail: HeadTail,
    pub groupings: Vec<GroupingOpportunities>,
    /// Direct ranking of entities; only when a share column is configured.
    pub entity_priorities: Vec<OpportunityRecord>,
    pub time_trend: Option<TimeSeries>,
    pub trend_summary: Option<TrendSummary>,
    pub price_volume: Option<PriceVolumeReport>,
    pub structure: Option<StructureOverview>,
    pub signals: SignalFlags,
    pub narrative: MarketNarrative,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every analysis stage over `table` as described by `config`.
///
/// Fails only when the table is empty or the column roles cannot be
/// resolved. Degraded stages (no positive volume, no target entity, a
/// configured signal column without usable data) are reported as warnings
/// in the envelope.
pub fn run_market_analysis(
    table: &Table,
    config: &AnalysisConfig,
) -> MarketLensResult<ComputationOutput<MarketReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if table.is_empty() {
        return Err(MarketLensError::InsufficientData(
            "Table has no rows to analyze".into(),
        ));
    }

    let columns = ResolvedColumns::resolve(config, table)?;

    // --- Concentration ---
    let concentration = analyze_concentration(table, &columns.entity, &columns.metric);
    if concentration.is_none() {
        warnings.push(format!(
            "No usable '{}' volume per '{}'; concentration metrics unavailable",
            columns.metric, columns.entity
        ));
    }
    let all_entities = entity_totals(table, &columns.entity, &columns.metric);
    let head_tail = head_and_tail(&all_entities, config.name_list_limit);
    let distribution: Vec<EntityAggregate> = all_entities
        .into_iter()
        .filter(|a| a.total > Decimal::ZERO)
        .collect();

    // --- Leaders and white space per grouping ---
    let target = config
        .target_entity
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if target.is_none() && !columns.groupings.is_empty() {
        log::warn!("groupings configured without a target entity; white space skipped");
        warnings.push(
            "Groupings configured without a target entity; white-space analysis skipped".into(),
        );
    }
    let groupings = columns
        .groupings
        .iter()
        .map(|spec| {
            let leaders = grouping_leaders(table, &spec.column, &columns.entity, &columns.metric);
            let (white_space, priorities) = match target {
                Some(target) => {
                    let rows = detect_white_space(
                        table,
                        &columns.entity,
                        &spec.column,
                        &columns.metric,
                        target,
                    );
                    if !rows.is_empty()
                        && rows.iter().all(|r| r.target_captured_volume.is_zero())
                    {
                        warnings.push(format!(
                            "Target '{target}' has no volume in any '{}' grouping",
                            spec.column
                        ));
                    }
                    let priorities = prioritize_white_space(&rows, spec.top_n);
                    (rows, priorities)
                }
                None => (Vec::new(), Vec::new()),
            };
            GroupingOpportunities {
                grouping_column: spec.column.clone(),
                label: spec.display_label().to_string(),
                leaders,
                white_space,
                priorities,
            }
        })
        .collect();

    // --- Direct entity ranking (pre-aggregated tables) ---
    let entity_priorities = match columns.share.as_deref() {
        Some(share) => build_opportunity_priority(
            table,
            &columns.entity,
            &columns.metric,
            share,
            columns.target_volume.as_deref(),
            0,
        ),
        None => Vec::new(),
    };

    // --- Optional signals ---
    let time_trend = columns
        .time
        .as_deref()
        .and_then(|time| analyze_time_series(table, time, Some(&columns.metric)));
    let trend_summary = time_trend.as_ref().and_then(summarize_trend);
    if let (Some(time), None) = (columns.time.as_deref(), &trend_summary) {
        warnings.push(format!(
            "Time column '{time}' spans fewer than two periods; trend unavailable"
        ));
    }

    let price_volume = columns.price.as_deref().and_then(|price| {
        analyze_price_volume(table, &columns.entity, &columns.metric, price)
    });
    if let (Some(price), None) = (columns.price.as_deref(), &price_volume) {
        warnings.push(format!(
            "Price column '{price}' has too few priced rows; price analysis unavailable"
        ));
    }

    let structure = columns
        .structure
        .as_deref()
        .and_then(|column| analyze_structure(table, column, &columns.metric));
    if let (Some(column), None) = (columns.structure.as_deref(), &structure) {
        warnings.push(format!(
            "Structure column '{column}' has no positive volume; structure overview unavailable"
        ));
    }

    // --- Narrative ---
    let signals = SignalFlags {
        has_time: trend_summary.is_some(),
        has_price: price_volume
            .as_ref()
            .is_some_and(|p| p.correlation.is_some()),
        has_structure: structure.is_some(),
    };
    let narrative = compose_narrative(&NarrativeInput {
        dimension_label: config
            .dimension_label
            .clone()
            .unwrap_or_else(|| columns.entity.clone()),
        metric_label: config
            .metric_label
            .clone()
            .unwrap_or_else(|| columns.metric.clone()),
        concentration: concentration.clone(),
        head_names: head_tail.head.clone(),
        tail_names: head_tail.tail.clone(),
        signals,
    });

    let output = MarketReport {
        columns,
        concentration,
        distribution,
        head_tail,
        groupings,
        entity_priorities,
        time_trend,
        trend_summary,
        price_volume,
        structure,
        signals,
        narrative,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Market structure analysis (concentration, white space, opportunity priority, market signals)",
        config,
        warnings,
        elapsed,
        output,
    ))
}
