//! Market-data provider seam
//!
//! The pipeline only ever talks to [`MarketDataProvider`]. Concrete network
//! clients live in [`crate::api`]; tests inject in-memory fakes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EarningsEvent, PriceBar};

/// Failures reported by a market-data provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error from {provider}: {message}")]
    Transport { provider: String, message: String },

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("{provider} has no data for {ticker}")]
    NotFound { provider: String, ticker: String },

    #[error("{provider} does not support {operation}")]
    Unsupported { provider: String, operation: String },

    #[error("malformed response from {provider}: {message}")]
    Malformed { provider: String, message: String },
}

impl ProviderError {
    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::RateLimited { provider }
            | Self::NotFound { provider, .. }
            | Self::Unsupported { provider, .. }
            | Self::Malformed { provider, .. } => provider,
        }
    }
}

/// Mean implied volatility of one option expiry, as a fraction (0.35 = 35%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolatility {
    pub expiry: NaiveDate,
    pub call_iv: Option<f64>,
    pub put_iv: Option<f64>,
}

impl ImpliedVolatility {
    /// Average of whichever sides are present.
    pub fn combined(&self) -> Option<f64> {
        match (self.call_iv, self.put_iv) {
            (Some(c), Some(p)) => Some((c + p) / 2.0),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        }
    }
}

/// Blocking source of prices, earnings dates and option data.
#[cfg_attr(test, mockall::automock)]
pub trait MarketDataProvider {
    /// Daily bars for `[start, end]`, ascending by date.
    fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProviderError>;

    /// Earnings events, most recent first.
    fn fetch_earnings_calendar(&self, ticker: &str) -> Result<Vec<EarningsEvent>, ProviderError>;

    /// Implied volatility for the nearest expiry strictly after `expiry`,
    /// averaged over near-the-money strikes, or for the nearest listed
    /// expiry over the whole chain when `None`.
    fn fetch_option_chain(
        &self,
        ticker: &str,
        expiry: Option<NaiveDate>,
    ) -> Result<ImpliedVolatility, ProviderError>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        (**self).fetch_history(ticker, start, end)
    }

    fn fetch_earnings_calendar(&self, ticker: &str) -> Result<Vec<EarningsEvent>, ProviderError> {
        (**self).fetch_earnings_calendar(ticker)
    }

    fn fetch_option_chain(
        &self,
        ticker: &str,
        expiry: Option<NaiveDate>,
    ) -> Result<ImpliedVolatility, ProviderError> {
        (**self).fetch_option_chain(ticker, expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_iv() {
        let expiry = NaiveDate::from_ymd_opt(2024, 8, 16).unwrap();
        let iv = ImpliedVolatility {
            expiry,
            call_iv: Some(0.30),
            put_iv: Some(0.40),
        };
        assert!((iv.combined().unwrap() - 0.35).abs() < 1e-12);

        let iv = ImpliedVolatility {
            expiry,
            call_iv: None,
            put_iv: Some(0.40),
        };
        assert_eq!(iv.combined(), Some(0.40));

        let iv = ImpliedVolatility {
            expiry,
            call_iv: None,
            put_iv: None,
        };
        assert_eq!(iv.combined(), None);
    }

    #[test]
    fn test_provider_name_in_error() {
        let err = ProviderError::Unsupported {
            provider: "yahoo".to_string(),
            operation: "earnings calendar".to_string(),
        };
        assert_eq!(err.provider(), "yahoo");
        assert_eq!(err.to_string(), "yahoo does not support earnings calendar");
    }
}
