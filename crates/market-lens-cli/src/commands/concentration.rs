use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

use market_lens_core::concentration::{
    analyze_concentration, entity_totals, grouping_leaders, head_and_tail, ConcentrationReport,
    EntityAggregate, GroupingLeaders, HeadTail,
};
use market_lens_core::with_metadata;

use crate::input;

/// Arguments for the concentration report
#[derive(Args)]
pub struct ConcentrationArgs {
    /// Path to a CSV or JSON table (JSON on stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Entity column (brand, manufacturer, customer...)
    #[arg(long)]
    pub entity: String,

    /// Numeric volume column
    #[arg(long)]
    pub metric: String,

    /// Maximum names kept in the head and tail lists
    #[arg(long, default_value_t = 5)]
    pub names: usize,

    /// Also list the top three entities inside each value of this column
    #[arg(long)]
    pub grouping: Option<String>,
}

#[derive(Serialize)]
struct ConcentrationOutput {
    report: Option<ConcentrationReport>,
    distribution: Vec<EntityAggregate>,
    head_tail: HeadTail,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaders: Option<Vec<GroupingLeaders>>,
}

pub fn run_concentration(args: ConcentrationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let table = input::load_table(args.input.as_deref())?;
    input::require_columns(&table, &[args.entity.as_str(), args.metric.as_str()])?;
    if let Some(ref grouping) = args.grouping {
        input::require_columns(&table, &[grouping.as_str()])?;
    }

    let mut warnings = Vec::new();
    let report = analyze_concentration(&table, &args.entity, &args.metric);
    if report.is_none() {
        warnings.push(format!(
            "No usable '{}' volume per '{}'",
            args.metric, args.entity
        ));
    }
    let all_entities = entity_totals(&table, &args.entity, &args.metric);
    let head_tail = head_and_tail(&all_entities, args.names);
    let distribution = all_entities
        .into_iter()
        .filter(|a| !a.total.is_zero())
        .collect();
    let leaders = args
        .grouping
        .as_deref()
        .map(|g| grouping_leaders(&table, g, &args.entity, &args.metric));

    let output = ConcentrationOutput {
        report,
        distribution,
        head_tail,
        leaders,
    };
    let assumptions = json!({
        "entity": args.entity,
        "metric": args.metric,
        "name_list_limit": args.names,
        "grouping": args.grouping,
    });
    let elapsed = start.elapsed().as_micros() as u64;
    let result = with_metadata(
        "Entity concentration (top-k share, 80/90% coverage, mean +/- 1.5 std outliers)",
        &assumptions,
        warnings,
        elapsed,
        output,
    );
    Ok(serde_json::to_value(result)?)
}
