use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Business volume (quantities, GMV, purchase demand). Never negative once admitted.
pub type Volume = Decimal;

/// Percentages expressed on a 0-100 scale (18.5 = 18.5%).
pub type Percent = Decimal;

/// Normalized scores on a 0-100 scale.
pub type Score = Decimal;

/// Clamp a percentage or score into [0, 100].
pub fn clamp_percent(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(dec!(100))
}

/// `part / whole * 100`, clamped to [0, 100]. Zero when `whole` is not positive.
pub fn percent_of(part: Decimal, whole: Decimal) -> Percent {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    clamp_percent(part / whole * dec!(100))
}

/// Sum of `values`, or `None` when it leaves Decimal's range.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
