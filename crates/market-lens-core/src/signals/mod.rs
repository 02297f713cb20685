//! Optional market signals read from the time, price and structure column
//! roles. Each analysis returns `None` when the data cannot support it.

pub mod price;
pub mod structure;
pub mod trend;

pub use price::{analyze_price_volume, CorrelationStrength, PriceVolumeReport};
pub use structure::{analyze_structure, StructureOverview};
pub use trend::{
    analyze_time_series, summarize_trend, Granularity, TimeSeries, TrendDirection, TrendPoint,
    TrendSummary,
};
