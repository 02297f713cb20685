use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketLensError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for MarketLensError {
    fn from(e: serde_json::Error) -> Self {
        MarketLensError::SerializationError(e.to_string())
    }
}
