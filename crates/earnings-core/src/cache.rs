//! Session cache for indicator-enriched price history

use cached::{Cached, UnboundCache};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::indicators::{EnrichedSeries, IndicatorEngine};
use crate::model::PriceSeries;
use crate::provider::MarketDataProvider;

/// Cache key for a price history request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceKey {
    /// Normalized ticker symbol
    pub ticker: String,
    /// First requested date (before lookback expansion)
    pub start: NaiveDate,
    /// Last requested date
    pub end: NaiveDate,
}

impl PriceKey {
    pub fn new(ticker: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: normalize_ticker(ticker),
            start,
            end,
        }
    }
}

/// Upper-case, whitespace-trimmed ticker
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Memoizes enriched price fetches for one analysis session.
///
/// Each miss widens the request backwards by `lookback_days` so the long
/// moving average is valid from the first requested bar, computes
/// indicators over the widened history, then trims back to the requested
/// range. Entries are never evicted. Not designed for concurrent use:
/// parallel batches need one cache per worker.
pub struct PriceCache<P> {
    provider: P,
    engine: IndicatorEngine,
    lookback_days: u64,
    entries: UnboundCache<PriceKey, Arc<EnrichedSeries>>,
}

impl<P: MarketDataProvider> PriceCache<P> {
    pub fn new(provider: P, lookback_days: i64) -> Self {
        Self {
            provider,
            engine: IndicatorEngine::new(),
            lookback_days: lookback_days.max(0) as u64,
            entries: UnboundCache::new(),
        }
    }

    /// The provider this cache fetches through
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Return the enriched series for `[start, end]`, fetching on a miss.
    ///
    /// `Ok(None)` means no data: the provider failed or returned no bars in
    /// range. Only a malformed series from the provider is an error.
    pub fn get_or_fetch(
        &mut self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Arc<EnrichedSeries>>> {
        let key = PriceKey::new(ticker, start, end);

        if let Some(series) = self.entries.cache_get(&key) {
            debug!("Cache hit for key: {:?}", key);
            return Ok(Some(Arc::clone(series)));
        }

        debug!("Cache miss for key: {:?}", key);

        if start > end {
            warn!(ticker = %key.ticker, %start, %end, "Requested range is empty");
            return Ok(None);
        }

        let Some(series) = self.fetch_enriched(&key)? else {
            return Ok(None);
        };

        let series = Arc::new(series);
        self.entries.cache_set(key, Arc::clone(&series));
        Ok(Some(series))
    }

    fn fetch_enriched(&self, key: &PriceKey) -> Result<Option<EnrichedSeries>> {
        let extended_start = key
            .start
            .checked_sub_days(Days::new(self.lookback_days))
            .unwrap_or(NaiveDate::MIN);

        let bars = match self
            .provider
            .fetch_history(&key.ticker, extended_start, key.end)
        {
            Ok(bars) => bars,
            Err(e) => {
                let err = AnalysisError::from(e);
                warn!(ticker = %key.ticker, error = %err, "Price history unavailable");
                return Ok(None);
            },
        };

        if bars.is_empty() {
            let err = AnalysisError::DataUnavailable {
                ticker: key.ticker.clone(),
                reason: format!("no bars between {extended_start} and {}", key.end),
            };
            warn!("{err}");
            return Ok(None);
        }

        let series = PriceSeries::new(key.ticker.clone(), bars)?;
        let enriched = self.engine.enrich(series)?.trimmed(key.start, key.end)?;

        if enriched.is_empty() {
            warn!(
                ticker = %key.ticker,
                start = %key.start,
                end = %key.end,
                "No bars inside the requested range"
            );
            return Ok(None);
        }

        debug!(
            ticker = %key.ticker,
            bars = enriched.len(),
            "Fetched and enriched price history"
        );
        Ok(Some(enriched))
    }

    /// Number of cached series
    pub fn len(&self) -> usize {
        self.entries.cache_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached series
    pub fn clear(&mut self) {
        self.entries.cache_clear();
    }
}
