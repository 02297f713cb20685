//! Market narrative for commercial teams.
//!
//! Seven fixed sections assembled from sentence fragments keyed on simple
//! thresholds of the concentration report and on which optional signals
//! (time, price, structure) the dataset carries. Deterministic: the same
//! input always yields the same text.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::concentration::ConcentrationReport;
use crate::config::SignalFlags;

/// Top-3 share from which head accounts are called out as the main lever.
const HEAD_FOCUS_TOP3: Decimal = dec!(60);
/// Top-3 share from which concentration itself is listed as a risk.
const HEAD_RISK_TOP3: Decimal = dec!(70);
/// Names shown per list.
const MAX_NAMES: usize = 3;

pub const SECTION_KEYS: [&str; 7] = [
    "situation",
    "opportunity",
    "strategy",
    "rationale",
    "benefit",
    "risks",
    "mitigation",
];

/// Everything the narrative is derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeInput {
    /// Entity dimension as shown to readers, e.g. "manufacturers".
    pub dimension_label: String,
    /// Metric as shown to readers, e.g. "purchase volume".
    pub metric_label: String,
    #[serde(default)]
    pub concentration: Option<ConcentrationReport>,
    #[serde(default)]
    pub head_names: Vec<String>,
    #[serde(default)]
    pub tail_names: Vec<String>,
    #[serde(default)]
    pub signals: SignalFlags,
}

/// The seven narrative sections. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketNarrative {
    pub situation: String,
    pub opportunity: String,
    pub strategy: String,
    pub rationale: String,
    pub benefit: String,
    pub risks: String,
    pub mitigation: String,
}

impl MarketNarrative {
    /// Sections paired with their keys, in `SECTION_KEYS` order.
    pub fn sections(&self) -> [(&'static str, &str); 7] {
        [
            (SECTION_KEYS[0], self.situation.as_str()),
            (SECTION_KEYS[1], self.opportunity.as_str()),
            (SECTION_KEYS[2], self.strategy.as_str()),
            (SECTION_KEYS[3], self.rationale.as_str()),
            (SECTION_KEYS[4], self.benefit.as_str()),
            (SECTION_KEYS[5], self.risks.as_str()),
            (SECTION_KEYS[6], self.mitigation.as_str()),
        ]
    }
}

/// Compose the narrative sections.
pub fn compose_narrative(input: &NarrativeInput) -> MarketNarrative {
    let dim = label_or(&input.dimension_label, "entities");
    let metric = label_or(&input.metric_label, "volume");
    let head = join_names(&input.head_names);
    let tail = join_names(&input.tail_names);
    let top3 = input
        .concentration
        .as_ref()
        .map_or(Decimal::ZERO, |c| c.top3_share);
    let signals = input.signals;

    let mut situation = match &input.concentration {
        Some(c) => format!(
            "{} is driven mainly by a few leading {dim}: the top one holds about {:.1}% and the top three about {:.1}%.",
            capitalize(metric),
            c.top1_share,
            c.top3_share
        ),
        None => format!(
            "{} already splits into leading and long-tail {dim}, so resources need explicit priorities.",
            capitalize(metric)
        ),
    };
    if let Some(names) = &head {
        situation.push_str(&format!(" Leading examples include {names}."));
    }

    let mut opportunity = Vec::new();
    if top3 >= HEAD_FOCUS_TOP3 {
        opportunity.push(format!(
            "leading {dim} are the most direct lever for near-term volume"
        ));
    }
    if let Some(names) = &tail {
        opportunity.push(format!("long-tail {names} suit low-cost pilots"));
    }
    if opportunity.is_empty() {
        opportunity.push("look for breakthroughs among under-covered, low-share targets".into());
    }

    let strategy = format!(
        "Run a two-track plan of deepening leading accounts and piloting white space: grow share in leading {dim} and make targeted breakthroughs where share is low but potential is high."
    );

    let mut rationale = vec![
        "this concentrates resources on the targets most likely to deliver results without adding much load on the team".to_string(),
    ];
    if top3 >= HEAD_FOCUS_TOP3 {
        rationale.push("it also keeps resources from being spread thin across a low-conversion long tail".into());
    }
    if !signals.has_time {
        rationale.push("without a time series, structure and coverage plays are safer than trend calls".into());
    }

    let benefit = format!(
        "Expected benefit: visible incremental volume sooner, better conversion in key {dim}, and a repeatable playbook for similar targets."
    );

    let mut risks = Vec::new();
    if !signals.has_time {
        risks.push("without a time dimension, feedback on short-term results may arrive late".to_string());
    }
    if !signals.has_price {
        risks.push("without a price dimension, price-band decisions have blind spots".into());
    }
    if !signals.has_structure {
        risks.push("without a stable structure field, substitution paths can only be judged roughly".into());
    }
    if top3 >= HEAD_RISK_TOP3 {
        risks.push("high head concentration means a swing in one account amplifies overall uncertainty".into());
    }
    if risks.is_empty() {
        risks.push("the main risk is an inconsistent execution rhythm".into());
    }

    let mitigation = format!(
        "Hold a weekly review of the targeted {dim}: track progress per target, fill in missing key fields (time, price, structure), set stop-loss thresholds and reallocate resources promptly."
    );

    MarketNarrative {
        situation,
        opportunity: sentence(&opportunity),
        strategy,
        rationale: sentence(&rationale),
        benefit,
        risks: sentence(&risks),
        mitigation,
    }
}

fn label_or<'a>(label: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

fn join_names(names: &[String]) -> Option<String> {
    let shown: Vec<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .take(MAX_NAMES)
        .collect();
    if shown.is_empty() {
        None
    } else {
        Some(shown.join(", "))
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Join fragments with "; " into one capitalized sentence.
fn sentence(fragments: &[String]) -> String {
    format!("{}.", capitalize(&fragments.join("; ")))
}
