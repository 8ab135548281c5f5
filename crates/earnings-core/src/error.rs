//! Error types for event-window analysis

use chrono::NaiveDate;
use thiserror::Error;

use crate::provider::ProviderError;

/// Errors raised while fetching or analysing price data around events.
///
/// Most of these never escape the pipeline: missing data, short windows and
/// indeterminate statistics are absorbed into `Option`s and empty lists, and
/// the error value only carries the reason into the logs.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The provider returned nothing usable for the requested range
    #[error("Data not available for {ticker}: {reason}")]
    DataUnavailable {
        ticker: String,
        reason: String,
    },

    /// Too few bars around an event to form a window
    #[error("Insufficient window for {ticker} around {event_date}: {bars} bar(s) in range")]
    InsufficientWindow {
        ticker: String,
        event_date: NaiveDate,
        bars: usize,
    },

    /// A statistic could not be computed (zero variance, too few points)
    #[error("Computation indeterminate: {0}")]
    ComputationIndeterminate(String),

    /// Transport or protocol fault from the market-data collaborator
    #[error("Provider failure from {provider}: {message}")]
    ProviderFailure {
        provider: String,
        message: String,
    },

    /// Malformed input series (out-of-order or duplicate timestamps)
    #[error("Invalid price series for {ticker}: {reason}")]
    InvalidSeries {
        ticker: String,
        reason: String,
    },

    /// Invalid ticker symbol provided
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        provider: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantageError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Whether this error represents an expected missing-data condition
    /// that should be absorbed rather than propagated.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. }
                | Self::InsufficientWindow { .. }
                | Self::ComputationIndeterminate(_)
                | Self::ProviderFailure { .. }
                | Self::RateLimitExceeded { .. }
        )
    }
}

impl From<ProviderError> for AnalysisError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited { provider } => Self::RateLimitExceeded { provider },
            other => Self::ProviderFailure {
                provider: other.provider().to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::InvalidTicker("???".to_string());
        assert_eq!(err.to_string(), "Invalid ticker: ???");

        let err = AnalysisError::DataUnavailable {
            ticker: "AAPL".to_string(),
            reason: "No bars returned".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No bars returned");

        let err = AnalysisError::InsufficientWindow {
            ticker: "MSFT".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 7, 30).unwrap(),
            bars: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient window for MSFT around 2024-07-30: 1 bar(s) in range"
        );
    }

    #[test]
    fn test_provider_error_conversion() {
        let err: AnalysisError = ProviderError::Transport {
            provider: "yahoo".to_string(),
            message: "connection reset".to_string(),
        }
        .into();

        match err {
            AnalysisError::ProviderFailure { provider, message } => {
                assert_eq!(provider, "yahoo");
                assert!(message.contains("connection reset"));
            },
            _ => panic!("Expected ProviderFailure variant"),
        }

        let err: AnalysisError = ProviderError::RateLimited {
            provider: "alpha_vantage".to_string(),
        }
        .into();
        assert!(matches!(err, AnalysisError::RateLimitExceeded { .. }));
    }

    #[test]
    fn test_recoverable_taxonomy() {
        assert!(AnalysisError::ComputationIndeterminate("zero variance".into()).is_recoverable());
        assert!(
            !AnalysisError::InvalidSeries {
                ticker: "AAPL".into(),
                reason: "duplicate".into(),
            }
            .is_recoverable()
        );
        assert!(!AnalysisError::ConfigError("bad".into()).is_recoverable());
    }
}
