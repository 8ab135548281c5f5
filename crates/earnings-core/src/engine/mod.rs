//! Earnings comparison engine
//!
//! Coordinates the per-ticker pipeline and assembles the final report

pub mod analysis_engine;
pub mod result;

pub use analysis_engine::EarningsComparison;
pub use result::{AnalysisRequest, ComparisonReport, EventSelection, PairCorrelation, TickerReport};
