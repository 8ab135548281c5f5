//! API clients for market data providers

pub mod alpha_vantage;
pub mod client;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use client::MarketDataClient;
pub use yahoo::YahooFinanceClient;
