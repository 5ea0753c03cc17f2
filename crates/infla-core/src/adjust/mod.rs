pub mod splits;

pub use splits::{CompoundSplit, SplitRule, SplitTable};
