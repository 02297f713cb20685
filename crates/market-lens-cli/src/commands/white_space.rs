use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

use market_lens_core::opportunity::OpportunityRecord;
use market_lens_core::white_space::{detect_white_space, prioritize_white_space, WhiteSpaceRow};
use market_lens_core::with_metadata;

use crate::input;

/// Arguments for white-space detection
#[derive(Args)]
pub struct WhiteSpaceArgs {
    /// Path to a CSV or JSON table (JSON on stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Entity column the target belongs to
    #[arg(long)]
    pub entity: String,

    /// Grouping column (city, institution, category...)
    #[arg(long)]
    pub grouping: String,

    /// Numeric volume column
    #[arg(long)]
    pub metric: String,

    /// Target entity whose position is benchmarked
    #[arg(long)]
    pub target: String,

    /// Also rank the groupings and keep the top N (0 keeps all)
    #[arg(long)]
    pub top_n: Option<i64>,
}

#[derive(Serialize)]
struct WhiteSpaceOutput {
    white_space: Vec<WhiteSpaceRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priorities: Option<Vec<OpportunityRecord>>,
}

pub fn run_white_space(args: WhiteSpaceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let table = input::load_table(args.input.as_deref())?;
    input::require_columns(&table, &[args.entity.as_str(), args.grouping.as_str(), args.metric.as_str()])?;

    let rows = detect_white_space(&table, &args.entity, &args.grouping, &args.metric, &args.target);
    let mut warnings = Vec::new();
    if !rows.is_empty() && rows.iter().all(|r| r.target_captured_volume.is_zero()) {
        warnings.push(format!(
            "Target '{}' has no volume in any '{}' grouping",
            args.target.trim(),
            args.grouping
        ));
    }
    let priorities = args.top_n.map(|n| prioritize_white_space(&rows, n));

    let assumptions = json!({
        "entity": args.entity,
        "grouping": args.grouping,
        "metric": args.metric,
        "target": args.target,
        "top_n": args.top_n,
    });
    let output = WhiteSpaceOutput {
        white_space: rows,
        priorities,
    };
    let elapsed = start.elapsed().as_micros() as u64;
    let result = with_metadata(
        "White space: grouping total vs. target captured volume and share",
        &assumptions,
        warnings,
        elapsed,
        output,
    );
    Ok(serde_json::to_value(result)?)
}
