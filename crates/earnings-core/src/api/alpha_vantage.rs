//! Alpha Vantage API client (earnings calendar)

use crate::error::{AnalysisError, Result};
use crate::model::EarningsEvent;
use chrono::NaiveDate;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarningsResponse {
    #[serde(default)]
    quarterly_earnings: Vec<QuarterlyEarnings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuarterlyEarnings {
    reported_date: String,
    #[serde(rename = "reportedEPS")]
    reported_eps: Option<String>,
    #[serde(rename = "estimatedEPS")]
    estimated_eps: Option<String>,
    surprise_percentage: Option<String>,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client with API key and rate limit
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (5 on the free tier)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        Self::with_client(Client::new(), api_key, rate_limit)
    }

    /// Same as [`new`](Self::new) with a request timeout
    pub fn with_timeout(
        api_key: impl Into<String>,
        rate_limit: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_key, rate_limit))
    }

    fn with_client(client: Client, api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create from environment variable ALPHA_VANTAGE_API_KEY with default rate limit
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            AnalysisError::ConfigError(
                "ALPHA_VANTAGE_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self::new(api_key, 5))
    }

    /// Quarterly earnings releases, most recent first
    pub async fn get_earnings(&self, symbol: &str) -> Result<Vec<EarningsEvent>> {
        self.rate_limiter.until_ready().await;

        let params = [
            ("function", "EARNINGS"),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];
        let response = self.client.get(BASE_URL).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(AnalysisError::AlphaVantageError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;
        parse_earnings(symbol, data)
    }
}

fn parse_earnings(symbol: &str, data: serde_json::Value) -> Result<Vec<EarningsEvent>> {
    if let Some(error) = data.get("Error Message") {
        return Err(AnalysisError::AlphaVantageError(error.to_string()));
    }

    // throttled responses carry a "Note" (older) or "Information" (newer)
    if data.get("Note").is_some() || data.get("Information").is_some() {
        return Err(AnalysisError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
        });
    }

    if data.as_object().is_none_or(serde_json::Map::is_empty) {
        return Err(AnalysisError::InvalidTicker(symbol.to_string()));
    }

    let response: EarningsResponse = serde_json::from_value(data)?;

    let mut events: Vec<EarningsEvent> = response
        .quarterly_earnings
        .into_iter()
        .filter_map(|q| {
            let Ok(date) = NaiveDate::parse_from_str(&q.reported_date, "%Y-%m-%d") else {
                debug!(symbol, reported_date = %q.reported_date, "Skipping unparseable date");
                return None;
            };
            Some(
                EarningsEvent::new(symbol, date)
                    .with_surprise(parse_number(q.surprise_percentage.as_deref()))
                    .with_eps(
                        parse_number(q.reported_eps.as_deref()),
                        parse_number(q.estimated_eps.as_deref()),
                    ),
            )
        })
        .collect();

    events.sort_by(|a, b| b.event_date.cmp(&a.event_date));
    Ok(events)
}

/// Alpha Vantage sends numbers as strings and `"None"` for missing values
fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
