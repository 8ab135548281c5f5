//! Earnings event-window analytics
//!
//! This crate compares how equities trade around their earnings releases.
//! It includes:
//!
//! - Price history caching with a moving-average lookback (`PriceCache`)
//! - Technical indicators per bar: daily and cumulative return, RSI(14),
//!   MA50, MA200 and historical volatility (`IndicatorEngine`)
//! - Pre/post event windows with gap, volume and RSI-zone figures
//!   (`EventWindowExtractor`)
//! - Cross-ticker return correlation (`correlate`)
//! - Per-ticker summaries of event reactions (`SummaryAggregator`)
//! - Yahoo Finance and Alpha Vantage adapters behind `MarketDataProvider`
//!
//! # Architecture
//!
//! The pipeline is synchronous and runs one ticker at a time:
//! prices and events → indicators → windows → summary, then every ticker
//! pair is correlated. `EarningsComparison` drives the whole flow.
//!
//! # Example
//!
//! ```rust,ignore
//! use earnings_core::{AnalysisConfig, AnalysisRequest, EarningsComparison, MarketDataClient};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = AnalysisConfig::default().with_env_api_key();
//!     let provider = MarketDataClient::new(&config)?;
//!     let mut engine = EarningsComparison::new(provider, config)?;
//!
//!     let selection = engine.calendar_selection();
//!     let report = engine.run(&AnalysisRequest::new("AAPL", ["MSFT"], selection))?;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod model;
pub mod provider;
pub mod signals;
pub mod summary;
pub mod window;

// Re-export main types for convenience
pub use api::{AlphaVantageClient, MarketDataClient, YahooFinanceClient};
pub use cache::PriceCache;
pub use config::AnalysisConfig;
pub use correlation::{CorrelationCategory, CorrelationResult, correlate};
pub use engine::{
    AnalysisRequest, ComparisonReport, EarningsComparison, EventSelection, PairCorrelation,
    TickerReport,
};
pub use error::{AnalysisError, Result};
pub use indicators::{EnrichedSeries, IndicatorEngine, IndicatorSet};
pub use model::{EarningsEvent, PriceBar, PriceSeries};
pub use provider::{ImpliedVolatility, MarketDataProvider, ProviderError};
pub use signals::{MaSignals, TickerSnapshot};
pub use summary::{ComparisonSummary, EpsSurpriseSummary, SummaryAggregator};
pub use window::{AnalysisWindow, EventWindowExtractor, IndicatorSnapshot, RsiThresholds, RsiZone};
