use thiserror::Error;

#[derive(Debug, Error)]
pub enum InflaError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No inflation data for year {0}")]
    MissingInflationYear(i32),

    #[error("Empty price series for {ticker}")]
    EmptyPriceSeries { ticker: String },

    #[error("Failed to fetch prices for {ticker}: {reason}")]
    FetchFailed { ticker: String, reason: String },

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Length mismatch: expected {expected} observations, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Empty series: {0}")]
    EmptySeries(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for InflaError {
    fn from(e: serde_json::Error) -> Self {
        InflaError::SerializationError(e.to_string())
    }
}
