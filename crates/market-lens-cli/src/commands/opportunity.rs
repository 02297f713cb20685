use clap::Args;
use serde_json::{json, Value};
use std::time::Instant;

use market_lens_core::opportunity::build_opportunity_priority;
use market_lens_core::with_metadata;

use crate::input;

/// Arguments for opportunity priority scoring
#[derive(Args)]
pub struct OpportunityArgs {
    /// Path to a CSV or JSON table (JSON on stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Entity column to rank (grouping key or entity id)
    #[arg(long)]
    pub entity: String,

    /// Total volume column
    #[arg(long)]
    pub total: String,

    /// Current share column, in percent
    #[arg(long)]
    pub share: String,

    /// Target volume column; share gap is used for feasibility when absent
    #[arg(long)]
    pub target_volume: Option<String>,

    /// Keep the top N records (0 keeps all)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub top_n: i64,
}

pub fn run_opportunity(args: OpportunityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let table = input::load_table(args.input.as_deref())?;
    input::require_columns(&table, &[args.entity.as_str(), args.total.as_str(), args.share.as_str()])?;

    let mut warnings = Vec::new();
    if let Some(col) = args.target_volume.as_deref() {
        if !table.has_column(col) {
            warnings.push(format!(
                "Target volume column '{col}' not found; feasibility uses the share gap"
            ));
        }
    }

    let records = build_opportunity_priority(
        &table,
        &args.entity,
        &args.total,
        &args.share,
        args.target_volume.as_deref(),
        args.top_n,
    );
    if records.is_empty() {
        warnings.push("No rows survived validation (entity id and positive total required)".into());
    }

    let assumptions = json!({
        "entity": args.entity,
        "total": args.total,
        "share": args.share,
        "target_volume": args.target_volume,
        "top_n": args.top_n,
    });
    let elapsed = start.elapsed().as_micros() as u64;
    let result = with_metadata(
        "Opportunity priority: geometric mean of normalized impact, feasibility and efficiency",
        &assumptions,
        warnings,
        elapsed,
        records,
    );
    Ok(serde_json::to_value(result)?)
}
