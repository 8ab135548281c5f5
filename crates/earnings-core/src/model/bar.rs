//! Daily price bars and ordered price series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// One daily OHLCV bar with a timezone-naive date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Bars for one ticker, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate dates.
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self> {
        let ticker = ticker.into();
        if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(AnalysisError::InvalidSeries {
                ticker,
                reason: format!(
                    "timestamps not strictly increasing ({} followed by {})",
                    pair[0].date, pair[1].date
                ),
            });
        }
        Ok(Self { ticker, bars })
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            bars: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.close)
    }

    /// Index of the first bar dated on or after `date` (the insertion point).
    pub fn insertion_index(&self, date: NaiveDate) -> usize {
        self.bars.partition_point(|b| b.date < date)
    }

    /// Index range of bars dated within `[start, end]`.
    pub fn range_indices(&self, start: NaiveDate, end: NaiveDate) -> std::ops::Range<usize> {
        let lo = self.insertion_index(start);
        let hi = self.bars.partition_point(|b| b.date <= end);
        lo..hi.max(lo)
    }
}
