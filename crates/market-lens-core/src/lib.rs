pub mod config;
pub mod error;
pub mod table;
pub mod types;

#[cfg(feature = "concentration")]
pub mod concentration;

#[cfg(feature = "opportunity")]
pub mod opportunity;

#[cfg(feature = "white_space")]
pub mod white_space;

#[cfg(feature = "signals")]
pub mod signals;

#[cfg(feature = "narrative")]
pub mod narrative;

#[cfg(feature = "pipeline")]
pub mod pipeline;

pub use error::MarketLensError;
pub use table::{CellValue, Table};
pub use types::*;

/// Standard result type for all market-lens operations
pub type MarketLensResult<T> = Result<T, MarketLensError>;
