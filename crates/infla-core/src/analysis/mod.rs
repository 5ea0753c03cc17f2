pub mod compare;
pub mod range;
pub mod source;
pub mod target;

pub use compare::{compare, compare_years, AnalysisContext, CompareRequest, Comparison, YearOutcome};
pub use range::{AnalysisConfig, AnalysisRange};
pub use source::{fetch_all, PriceSource, StaticPriceSource};
pub use target::{Holding, PreparedTarget, Target};
