use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

use market_lens_core::signals::{
    analyze_price_volume, analyze_structure, analyze_time_series, summarize_trend,
    PriceVolumeReport, StructureOverview, TimeSeries, TrendSummary,
};
use market_lens_core::with_metadata;

use crate::input;

/// Arguments for the optional market signals
#[derive(Args)]
pub struct SignalsArgs {
    /// Path to a CSV or JSON table (JSON or CSV on stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Entity column, used to name price quadrant members
    #[arg(long)]
    pub entity: String,

    /// Numeric volume column
    #[arg(long)]
    pub metric: String,

    /// Date column for the time trend
    #[arg(long)]
    pub time: Option<String>,

    /// Unit price column
    #[arg(long)]
    pub price: Option<String>,

    /// Product structure / category column
    #[arg(long)]
    pub structure: Option<String>,
}

#[derive(Serialize)]
struct SignalsOutput {
    time_trend: Option<TimeSeries>,
    trend_summary: Option<TrendSummary>,
    price_volume: Option<PriceVolumeReport>,
    structure: Option<StructureOverview>,
}

pub fn run_signals(args: SignalsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let table = input::load_table(args.input.as_deref())?;
    let mut required = vec![args.entity.as_str(), args.metric.as_str()];
    required.extend(args.time.as_deref());
    required.extend(args.price.as_deref());
    required.extend(args.structure.as_deref());
    input::require_columns(&table, &required)?;
    if args.time.is_none() && args.price.is_none() && args.structure.is_none() {
        return Err("at least one of --time, --price or --structure is required".into());
    }

    let mut warnings = Vec::new();
    let time_trend = args
        .time
        .as_deref()
        .and_then(|t| analyze_time_series(&table, t, Some(&args.metric)));
    let trend_summary = time_trend.as_ref().and_then(summarize_trend);
    if args.time.is_some() && trend_summary.is_none() {
        warnings.push("Fewer than two time periods; no trend summary".to_string());
    }
    let price_volume = args
        .price
        .as_deref()
        .and_then(|p| analyze_price_volume(&table, &args.entity, &args.metric, p));
    if args.price.is_some() && price_volume.is_none() {
        warnings.push("Too few priced rows for a price analysis".to_string());
    }
    let structure = args
        .structure
        .as_deref()
        .and_then(|s| analyze_structure(&table, s, &args.metric));
    if args.structure.is_some() && structure.is_none() {
        warnings.push("No positive volume per structure category".to_string());
    }

    let assumptions = json!({
        "entity": args.entity,
        "metric": args.metric,
        "time": args.time,
        "price": args.price,
        "structure": args.structure,
    });
    let output = SignalsOutput {
        time_trend,
        trend_summary,
        price_volume,
        structure,
    };
    let elapsed = start.elapsed().as_micros() as u64;
    let result = with_metadata(
        "Market signals: period-bucketed trend, price-volume correlation, structure mix",
        &assumptions,
        warnings,
        elapsed,
        output,
    );
    Ok(serde_json::to_value(result)?)
}
