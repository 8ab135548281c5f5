//! Configuration for event-window analysis

use crate::error::{AnalysisError, Result};
use crate::indicators::MA_LONG;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Calendar days needed to cover `MA_LONG` trading days with margin.
const DEFAULT_LOOKBACK_DAYS: i64 = 400;

/// Configuration for an analysis session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Extra calendar days fetched before each requested range so that the
    /// long moving average is defined from the first requested bar
    pub lookback_days: i64,

    /// Calendar days before the event included in its window
    pub days_before: i64,

    /// Calendar days after the event included in its window
    pub days_after: i64,

    /// Most recent calendar events analysed per ticker
    pub max_events: usize,

    /// RSI at or above this is overbought
    pub overbought: f64,

    /// RSI at or below this is oversold
    pub oversold: f64,

    /// Fetch option chains for the current implied volatility column
    pub include_implied_volatility: bool,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Alpha Vantage API key (optional, needed for earnings calendars)
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub alpha_vantage_rate_limit: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            days_before: 5,
            days_after: 5,
            max_events: 8,
            overbought: 70.0,
            oversold: 30.0,
            include_implied_volatility: true,
            request_timeout: Duration::from_secs(30),
            alpha_vantage_api_key: None,
            alpha_vantage_rate_limit: 5, // free tier
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Ok(key) = std::env::var("ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_api_key = Some(key);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days < MA_LONG as i64 {
            return Err(AnalysisError::ConfigError(format!(
                "lookback_days must cover at least {MA_LONG} days"
            )));
        }

        if self.days_before < 0 || self.days_after < 0 {
            return Err(AnalysisError::ConfigError(
                "window days must not be negative".to_string(),
            ));
        }

        if self.max_events == 0 {
            return Err(AnalysisError::ConfigError(
                "max_events must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.oversold)
            || !(0.0..=100.0).contains(&self.overbought)
            || self.oversold >= self.overbought
        {
            return Err(AnalysisError::ConfigError(format!(
                "RSI thresholds must satisfy 0 <= oversold < overbought <= 100 (got {} / {})",
                self.oversold, self.overbought
            )));
        }

        if self.alpha_vantage_rate_limit == 0 {
            return Err(AnalysisError::ConfigError(
                "alpha_vantage_rate_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for AnalysisConfig
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    lookback_days: Option<i64>,
    days_before: Option<i64>,
    days_after: Option<i64>,
    max_events: Option<usize>,
    overbought: Option<f64>,
    oversold: Option<f64>,
    include_implied_volatility: Option<bool>,
    request_timeout: Option<Duration>,
    alpha_vantage_api_key: Option<String>,
    alpha_vantage_rate_limit: Option<u32>,
}

impl AnalysisConfigBuilder {
    pub fn lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = Some(days);
        self
    }

    pub fn days_before(mut self, days: i64) -> Self {
        self.days_before = Some(days);
        self
    }

    pub fn days_after(mut self, days: i64) -> Self {
        self.days_after = Some(days);
        self
    }

    /// Set both window sides at once
    pub fn window_days(self, days: i64) -> Self {
        self.days_before(days).days_after(days)
    }

    pub fn max_events(mut self, max: usize) -> Self {
        self.max_events = Some(max);
        self
    }

    pub fn rsi_thresholds(mut self, oversold: f64, overbought: f64) -> Self {
        self.oversold = Some(oversold);
        self.overbought = Some(overbought);
        self
    }

    pub fn include_implied_volatility(mut self, include: bool) -> Self {
        self.include_implied_volatility = Some(include);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn alpha_vantage_rate_limit(mut self, per_minute: u32) -> Self {
        self.alpha_vantage_rate_limit = Some(per_minute);
        self
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Ok(key) = std::env::var("ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_api_key = Some(key);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalysisConfig> {
        let defaults = AnalysisConfig::default();

        let config = AnalysisConfig {
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            days_before: self.days_before.unwrap_or(defaults.days_before),
            days_after: self.days_after.unwrap_or(defaults.days_after),
            max_events: self.max_events.unwrap_or(defaults.max_events),
            overbought: self.overbought.unwrap_or(defaults.overbought),
            oversold: self.oversold.unwrap_or(defaults.oversold),
            include_implied_volatility: self
                .include_implied_volatility
                .unwrap_or(defaults.include_implied_volatility),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            alpha_vantage_rate_limit: self
                .alpha_vantage_rate_limit
                .unwrap_or(defaults.alpha_vantage_rate_limit),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.lookback_days, 400);
        assert_eq!(config.days_before, 5);
        assert_eq!(config.max_events, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AnalysisConfig::builder()
            .window_days(7)
            .max_events(4)
            .request_timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        assert_eq!(config.days_before, 7);
        assert_eq!(config.days_after, 7);
        assert_eq!(config.max_events, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation_short_lookback() {
        let config = AnalysisConfig {
            lookback_days: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_inverted_thresholds() {
        let result = AnalysisConfig::builder().rsi_thresholds(80.0, 20.0).build();
        assert!(matches!(result, Err(AnalysisError::ConfigError(_))));
    }

    #[test]
    fn test_validation_zero_events() {
        let config = AnalysisConfig {
            max_events: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
