//! Blocking market-data provider over the async API clients

use chrono::NaiveDate;
use tokio::runtime::{Builder, Runtime};
use tracing::warn;

use super::alpha_vantage::AlphaVantageClient;
use super::yahoo::YahooFinanceClient;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::model::{EarningsEvent, PriceBar};
use crate::provider::{ImpliedVolatility, MarketDataProvider, ProviderError};

const YAHOO: &str = "Yahoo Finance";
const ALPHA_VANTAGE: &str = "Alpha Vantage";

/// Yahoo Finance for prices and option chains, Alpha Vantage for the
/// earnings calendar. Owns a current-thread runtime and blocks on each
/// request, so it must not be called from inside another tokio runtime.
pub struct MarketDataClient {
    runtime: Runtime,
    yahoo: YahooFinanceClient,
    alpha_vantage: Option<AlphaVantageClient>,
}

impl MarketDataClient {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AnalysisError::ConfigError(format!("Failed to start runtime: {e}")))?;

        let yahoo = YahooFinanceClient::with_timeout(config.request_timeout)?;
        let alpha_vantage = config
            .alpha_vantage_api_key
            .as_deref()
            .map(|key| {
                AlphaVantageClient::with_timeout(
                    key,
                    config.alpha_vantage_rate_limit,
                    config.request_timeout,
                )
            })
            .transpose()?;

        if alpha_vantage.is_none() {
            warn!("ALPHA_VANTAGE_API_KEY not set; earnings calendars will be empty");
        }

        Ok(Self {
            runtime,
            yahoo,
            alpha_vantage,
        })
    }

    pub fn has_earnings_calendar(&self) -> bool {
        self.alpha_vantage.is_some()
    }
}

impl MarketDataProvider for MarketDataClient {
    fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<PriceBar>, ProviderError> {
        self.runtime
            .block_on(self.yahoo.get_history(ticker, start, end))
            .map_err(|e| provider_error(YAHOO, ticker, e))
    }

    fn fetch_earnings_calendar(
        &self,
        ticker: &str,
    ) -> std::result::Result<Vec<EarningsEvent>, ProviderError> {
        let Some(client) = &self.alpha_vantage else {
            let err = AnalysisError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: "no Alpha Vantage API key configured".to_string(),
            };
            warn!("{err}");
            return Ok(Vec::new());
        };

        self.runtime
            .block_on(client.get_earnings(ticker))
            .map_err(|e| provider_error(ALPHA_VANTAGE, ticker, e))
    }

    fn fetch_option_chain(
        &self,
        ticker: &str,
        expiry: Option<NaiveDate>,
    ) -> std::result::Result<ImpliedVolatility, ProviderError> {
        self.runtime
            .block_on(self.yahoo.get_implied_volatility(ticker, expiry))
            .map_err(|e| provider_error(YAHOO, ticker, e))
    }
}

fn provider_error(provider: &str, ticker: &str, err: AnalysisError) -> ProviderError {
    let provider = provider.to_string();
    match err {
        AnalysisError::RateLimitExceeded { .. } => ProviderError::RateLimited { provider },
        AnalysisError::InvalidTicker(_) => ProviderError::NotFound {
            provider,
            ticker: ticker.to_string(),
        },
        AnalysisError::JsonError(e) => ProviderError::Malformed {
            provider,
            message: e.to_string(),
        },
        other => ProviderError::Transport {
            provider,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_mapping() {
        let err = provider_error(
            ALPHA_VANTAGE,
            "IBM",
            AnalysisError::RateLimitExceeded {
                provider: ALPHA_VANTAGE.to_string(),
            },
        );
        assert!(matches!(err, ProviderError::RateLimited { .. }));

        let err = provider_error(ALPHA_VANTAGE, "NOPE", AnalysisError::InvalidTicker("NOPE".into()));
        assert!(matches!(err, ProviderError::NotFound { ref ticker, .. } if ticker == "NOPE"));

        let err = provider_error(YAHOO, "AAPL", AnalysisError::YahooFinanceError("boom".into()));
        assert_eq!(err.provider(), YAHOO);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_calendar_empty_without_key() {
        let client = MarketDataClient::new(&AnalysisConfig::default()).unwrap();
        assert!(!client.has_earnings_calendar());
        assert!(client.fetch_earnings_calendar("AAPL").unwrap().is_empty());
    }

    #[test]
    #[ignore] // Requires network access
    fn test_fetch_history_blocking() {
        let client = MarketDataClient::new(&AnalysisConfig::default()).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let bars = client.fetch_history("MSFT", start, end).unwrap();
        assert!(!bars.is_empty());
    }
}
