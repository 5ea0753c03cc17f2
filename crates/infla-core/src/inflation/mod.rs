pub mod amortizer;
pub mod table;
