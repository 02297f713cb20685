use clap::Args;
use serde_json::Value;
use std::time::Instant;

use market_lens_core::narrative::{compose_narrative, NarrativeInput};
use market_lens_core::with_metadata;

use crate::input;

/// Arguments for narrative composition
#[derive(Args)]
pub struct NarrativeArgs {
    /// Path to a JSON narrative input (JSON on stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the entity dimension label
    #[arg(long)]
    pub dimension_label: Option<String>,

    /// Override the metric label
    #[arg(long)]
    pub metric_label: Option<String>,
}

pub fn run_narrative(args: NarrativeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut narrative_input: NarrativeInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(parsed) = input::stdin::read_stdin_json()? {
        parsed
    } else {
        return Err("--input file is required for the narrative (or pipe JSON on stdin)".into());
    };

    if let Some(label) = args.dimension_label {
        narrative_input.dimension_label = label;
    }
    if let Some(label) = args.metric_label {
        narrative_input.metric_label = label;
    }

    let narrative = compose_narrative(&narrative_input);
    let elapsed = start.elapsed().as_micros() as u64;
    let result = with_metadata(
        "Rule-based market narrative from concentration and signal coverage",
        &narrative_input,
        Vec::new(),
        elapsed,
        narrative,
    );
    Ok(serde_json::to_value(result)?)
}
