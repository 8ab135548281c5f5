//! Yahoo Finance API client

use crate::error::{AnalysisError, Result};
use crate::model::PriceBar;
use crate::provider::ImpliedVolatility;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

const OPTIONS_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";

/// Yahoo Finance API client
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a client whose option-chain requests time out after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Daily bars for `[start, end]`, ascending with one bar per date.
    ///
    /// Bar dates are the UTC date of Yahoo's bar timestamp, which can sit one
    /// day off the local session date for Asia-Pacific listings.
    pub async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| AnalysisError::YahooFinanceError(e.to_string()))?;

        // the upper bound is exclusive on Yahoo's side
        let end_exclusive = end.checked_add_days(Days::new(1)).unwrap_or(end);
        let start_odt = to_offset_datetime(start)?;
        let end_odt = to_offset_datetime(end_exclusive)?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| AnalysisError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| AnalysisError::YahooFinanceError(e.to_string()))?;

        let bars = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PriceBar::new(date, q.open, q.high, q.low, q.close, q.volume))
            })
            .filter(|bar| bar.date >= start && bar.date <= end)
            .collect();

        Ok(normalize_bars(bars))
    }

    /// Mean implied volatility of one option expiry.
    ///
    /// With `expiry` set, the nearest expiry strictly after that date is used
    /// and only strikes within 10% of the underlying's market price count.
    /// Without it, every strike of the nearest listed expiry counts.
    pub async fn get_implied_volatility(
        &self,
        symbol: &str,
        expiry: Option<NaiveDate>,
    ) -> Result<ImpliedVolatility> {
        let url = format!("{OPTIONS_URL}/{symbol}");
        let page = self.fetch_options(&url, None).await?;

        let target = select_expiry(&page.expiration_dates, expiry).ok_or_else(|| {
            AnalysisError::YahooFinanceError(format!("No option expiries listed for {symbol}"))
        })?;

        let page = if page.options.first().map(|o| o.expiration_date) == Some(target) {
            page
        } else {
            self.fetch_options(&url, Some(target)).await?
        };

        let spot = match expiry {
            Some(_) => Some(page.underlying_price().ok_or_else(|| {
                AnalysisError::YahooFinanceError(format!("No market price quoted for {symbol}"))
            })?),
            None => None,
        };

        summarize_chain(&page, target, spot)
    }

    async fn fetch_options(&self, url: &str, date: Option<i64>) -> Result<OptionChainResult> {
        let mut request = self.client.get(url);
        if let Some(ts) = date {
            request = request.query(&[("date", ts)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AnalysisError::YahooFinanceError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body: OptionsResponse = response.json().await?;
        body.option_chain
            .result
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::YahooFinanceError("Empty option chain".to_string()))
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime> {
    let ts = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(ts)
        .map_err(|e| AnalysisError::YahooFinanceError(format!("Invalid timestamp: {e}")))
}

/// Sort by date and keep the last bar seen for each date
pub(crate) fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.reverse();
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: OptionChainEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionChainEnvelope {
    #[serde(default)]
    result: Vec<OptionChainResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionChainResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    quote: Option<UnderlyingQuote>,
    #[serde(default)]
    options: Vec<OptionSet>,
}

impl OptionChainResult {
    fn underlying_price(&self) -> Option<f64> {
        self.quote
            .as_ref()
            .and_then(|q| q.regular_market_price)
            .filter(|p| p.is_finite() && *p > 0.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnderlyingQuote {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionSet {
    expiration_date: i64,
    #[serde(default)]
    calls: Vec<OptionContract>,
    #[serde(default)]
    puts: Vec<OptionContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionContract {
    #[serde(default)]
    strike: Option<f64>,
    implied_volatility: Option<f64>,
}

/// Nearest expiry strictly after `target`, or the nearest listed one
fn select_expiry(expirations: &[i64], target: Option<NaiveDate>) -> Option<i64> {
    let mut sorted = expirations.to_vec();
    sorted.sort_unstable();
    match target {
        None => sorted.first().copied(),
        Some(date) => sorted.into_iter().find(|ts| {
            DateTime::from_timestamp(*ts, 0).is_some_and(|dt| dt.date_naive() > date)
        }),
    }
}

/// Share of the spot price a strike may sit from it and still count
const ATM_BAND: f64 = 0.1;

fn summarize_chain(
    page: &OptionChainResult,
    expiry: i64,
    spot: Option<f64>,
) -> Result<ImpliedVolatility> {
    let set = page
        .options
        .iter()
        .find(|o| o.expiration_date == expiry)
        .ok_or_else(|| {
            AnalysisError::YahooFinanceError(format!("Expiry {expiry} missing from option chain"))
        })?;

    let expiry_date = DateTime::from_timestamp(expiry, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| AnalysisError::YahooFinanceError(format!("Invalid expiry {expiry}")))?;

    Ok(ImpliedVolatility {
        expiry: expiry_date,
        call_iv: mean_iv(&set.calls, spot),
        put_iv: mean_iv(&set.puts, spot),
    })
}

fn near_the_money(contract: &OptionContract, spot: f64) -> bool {
    contract
        .strike
        .is_some_and(|k| (k - spot).abs() < spot * ATM_BAND)
}

fn mean_iv(contracts: &[OptionContract], spot: Option<f64>) -> Option<f64> {
    let values: Vec<f64> = contracts
        .iter()
        .filter(|c| spot.is_none_or(|s| near_the_money(c, s)))
        .filter_map(|c| c.implied_volatility)
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_bars_sorts_and_dedups() {
        let bars = vec![
            PriceBar::new(date(2024, 1, 3), 1.0, 1.0, 1.0, 3.0, 1),
            PriceBar::new(date(2024, 1, 2), 1.0, 1.0, 1.0, 2.0, 1),
            PriceBar::new(date(2024, 1, 3), 1.0, 1.0, 1.0, 3.5, 1),
        ];
        let bars = normalize_bars(bars);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date(2024, 1, 2));
        // the later duplicate wins
        assert_eq!(bars[1].close, 3.5);
    }

    #[test]
    fn test_select_expiry() {
        // 2024-08-16 and 2024-09-20 at midnight UTC
        let expirations = [1_726_790_400, 1_723_766_400];
        assert_eq!(select_expiry(&expirations, None), Some(1_723_766_400));
        assert_eq!(
            select_expiry(&expirations, Some(date(2024, 8, 20))),
            Some(1_726_790_400)
        );
        // an expiry on the target date itself does not count
        assert_eq!(
            select_expiry(&expirations, Some(date(2024, 8, 16))),
            Some(1_726_790_400)
        );
        assert_eq!(
            select_expiry(&expirations, Some(date(2024, 8, 15))),
            Some(1_723_766_400)
        );
        assert_eq!(select_expiry(&expirations, Some(date(2024, 10, 1))), None);
    }

    #[test]
    fn test_parse_option_chain() {
        let json = r#"{
            "optionChain": {
                "result": [{
                    "expirationDates": [1723766400],
                    "options": [{
                        "expirationDate": 1723766400,
                        "calls": [{"impliedVolatility": 0.30}, {"impliedVolatility": 0.50}],
                        "puts": [{"impliedVolatility": 0.45}, {}]
                    }]
                }],
                "error": null
            }
        }"#;
        let response: OptionsResponse = serde_json::from_str(json).unwrap();
        let page = response.option_chain.result.into_iter().next().unwrap();
        let iv = summarize_chain(&page, 1_723_766_400, None).unwrap();

        assert_eq!(iv.expiry, date(2024, 8, 16));
        assert!((iv.call_iv.unwrap() - 0.40).abs() < 1e-12);
        assert!((iv.put_iv.unwrap() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_near_the_money_filter() {
        let json = r#"{
            "optionChain": {
                "result": [{
                    "expirationDates": [1723766400],
                    "quote": {"regularMarketPrice": 200.0},
                    "options": [{
                        "expirationDate": 1723766400,
                        "calls": [
                            {"strike": 150.0, "impliedVolatility": 0.90},
                            {"strike": 195.0, "impliedVolatility": 0.30},
                            {"strike": 210.0, "impliedVolatility": 0.40},
                            {"strike": 225.0, "impliedVolatility": 0.80}
                        ],
                        "puts": [{"strike": 260.0, "impliedVolatility": 0.70}]
                    }]
                }]
            }
        }"#;
        let response: OptionsResponse = serde_json::from_str(json).unwrap();
        let page = response.option_chain.result.into_iter().next().unwrap();
        let spot = page.underlying_price();
        assert_eq!(spot, Some(200.0));

        let iv = summarize_chain(&page, 1_723_766_400, spot).unwrap();
        // 150 and 225 sit outside the 10% band
        assert!((iv.call_iv.unwrap() - 0.35).abs() < 1e-12);
        // no put within the band
        assert_eq!(iv.put_iv, None);
        assert!((iv.combined().unwrap() - 0.35).abs() < 1e-12);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_history() {
        let client = YahooFinanceClient::new();
        let bars = client
            .get_history("AAPL", date(2024, 1, 2), date(2024, 1, 31))
            .await
            .unwrap();
        assert!(!bars.is_empty());
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_implied_volatility() {
        let client = YahooFinanceClient::new();
        let iv = client.get_implied_volatility("AAPL", None).await;
        assert!(iv.is_ok());
    }
}
