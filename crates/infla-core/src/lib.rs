pub mod adjust;
pub mod analysis;
pub mod error;
pub mod expression;
pub mod inflation;
pub mod report;
pub mod series;
pub mod types;

pub use error::InflaError;
pub use types::*;

/// Standard result type for all infla operations
pub type InflaResult<T> = Result<T, InflaError>;
