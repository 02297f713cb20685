use clap::Args;
use serde_json::Value;

use market_lens_core::config::{AnalysisConfig, GroupingSpec};
use market_lens_core::pipeline::run_market_analysis;

use crate::input;

/// Arguments for the full market analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a CSV or JSON table (JSON on stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Analysis configuration file (YAML or JSON); flags below override it
    #[arg(long)]
    pub config: Option<String>,

    /// Entity column (detected from the table when unset)
    #[arg(long)]
    pub entity: Option<String>,

    /// Numeric volume column (detected from the table when unset)
    #[arg(long)]
    pub metric: Option<String>,

    /// Target entity for white-space analysis
    #[arg(long)]
    pub target: Option<String>,

    /// Grouping column to scan for white space (repeatable)
    #[arg(long = "grouping")]
    pub groupings: Vec<String>,

    /// Priority list length for groupings added with --grouping (0 keeps all)
    #[arg(long, default_value_t = 20, allow_hyphen_values = true)]
    pub top_n: i64,

    /// Current share column of a pre-aggregated table
    #[arg(long)]
    pub share: Option<String>,

    /// Target volume column of a pre-aggregated table
    #[arg(long)]
    pub target_volume: Option<String>,

    /// Date column
    #[arg(long)]
    pub time: Option<String>,

    /// Unit price column
    #[arg(long)]
    pub price: Option<String>,

    /// Product structure / category column
    #[arg(long)]
    pub structure: Option<String>,

    /// Entity dimension label used in the narrative
    #[arg(long)]
    pub dimension_label: Option<String>,

    /// Metric label used in the narrative
    #[arg(long)]
    pub metric_label: Option<String>,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = input::load_table(args.input.as_deref())?;
    let mut config: AnalysisConfig = match args.config.as_deref() {
        Some(path) => input::file::read_config(path)?,
        None => AnalysisConfig::default(),
    };
    apply_overrides(&mut config, args);

    let result = run_market_analysis(&table, &config)?;
    Ok(serde_json::to_value(result)?)
}

fn apply_overrides(config: &mut AnalysisConfig, args: AnalyzeArgs) {
    let roles = &mut config.columns;
    override_with(&mut roles.entity, args.entity);
    override_with(&mut roles.metric, args.metric);
    override_with(&mut roles.share, args.share);
    override_with(&mut roles.target_volume, args.target_volume);
    override_with(&mut roles.time, args.time);
    override_with(&mut roles.price, args.price);
    override_with(&mut roles.structure, args.structure);
    override_with(&mut config.target_entity, args.target);
    override_with(&mut config.dimension_label, args.dimension_label);
    override_with(&mut config.metric_label, args.metric_label);

    for column in args.groupings {
        if config.groupings.iter().any(|g| g.column == column) {
            continue;
        }
        config.groupings.push(GroupingSpec::new(column, args.top_n));
    }
}

fn override_with(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}
