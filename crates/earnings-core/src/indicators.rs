//! Technical indicators attached per bar
//!
//! [`IndicatorEngine`] turns a raw [`PriceSeries`] into an [`EnrichedSeries`]:
//! the same bars, each paired with an immutable [`IndicatorSet`]. Every field
//! of the set is `None` until enough preceding history exists.
//!
//! - daily return: `close[t] / close[t-1] - 1`
//! - cumulative return: compounded daily returns, anchored at the first bar
//! - RSI(14): simple 14-period means of zero-floored gains and losses
//! - MA(50), MA(200): simple rolling means of close
//! - historical volatility: 20-bar sample std of daily returns, annualised, in percent

use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::SimpleMovingAverage;

use crate::error::{AnalysisError, Result};
use crate::model::{PriceBar, PriceSeries};

pub const RSI_PERIOD: usize = 14;
pub const MA_SHORT: usize = 50;
pub const MA_LONG: usize = 200;
pub const VOLATILITY_WINDOW: usize = 20;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Derived per-bar fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub daily_return: Option<f64>,
    pub cumulative_return: Option<f64>,
    pub rsi: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    pub volatility: Option<f64>,
}

/// Stateless indicator calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute one [`IndicatorSet`] per bar. Pure and deterministic.
    pub fn compute(&self, series: &PriceSeries) -> Result<Vec<IndicatorSet>> {
        let bars = series.bars();
        let mut ma_short = sma(MA_SHORT)?;
        let mut ma_long = sma(MA_LONG)?;
        let mut avg_gain = sma(RSI_PERIOD)?;
        let mut avg_loss = sma(RSI_PERIOD)?;

        let mut growth = 1.0_f64;
        let mut daily_returns: Vec<Option<f64>> = Vec::with_capacity(bars.len());
        let mut sets = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            let short = ma_short.next(bar.close);
            let long = ma_long.next(bar.close);

            let prev = i.checked_sub(1).map(|p| bars[p].close);
            let daily_return = prev.and_then(|p| pct_change(p, bar.close));
            daily_returns.push(daily_return);

            let cumulative_return = if i == 0 {
                Some(0.0)
            } else {
                if let Some(r) = daily_return {
                    growth *= 1.0 + r;
                }
                Some(growth - 1.0)
            };

            let rsi = prev.and_then(|p| {
                let delta = bar.close - p;
                let gain = avg_gain.next(delta.max(0.0));
                let loss = avg_loss.next((-delta).max(0.0));
                (i >= RSI_PERIOD).then(|| rsi_from_averages(gain, loss)).flatten()
            });

            sets.push(IndicatorSet {
                daily_return,
                cumulative_return,
                rsi,
                ma50: (i + 1 >= MA_SHORT).then_some(short),
                ma200: (i + 1 >= MA_LONG).then_some(long),
                volatility: rolling_volatility(&daily_returns),
            });
        }

        Ok(sets)
    }

    /// Attach indicators to a series, consuming it.
    pub fn enrich(&self, series: PriceSeries) -> Result<EnrichedSeries> {
        let indicators = self.compute(&series)?;
        Ok(EnrichedSeries { series, indicators })
    }
}

fn sma(period: usize) -> Result<SimpleMovingAverage> {
    SimpleMovingAverage::new(period).map_err(|e| AnalysisError::IndicatorError(e.to_string()))
}

fn pct_change(prev: f64, current: f64) -> Option<f64> {
    (prev != 0.0).then(|| current / prev - 1.0)
}

/// RSI from average gain/loss. An upward-only window pins at 100; a flat
/// window (no gains, no losses) is undefined.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    // running sums can leave a few ulps of negative residue
    let gain = avg_gain.max(0.0);
    let loss = avg_loss.max(0.0);
    if loss == 0.0 {
        return (gain > 0.0).then_some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + gain / loss))
}

fn rolling_volatility(daily_returns: &[Option<f64>]) -> Option<f64> {
    if daily_returns.len() < VOLATILITY_WINDOW {
        return None;
    }
    let window = &daily_returns[daily_returns.len() - VOLATILITY_WINDOW..];
    let values: Option<Vec<f64>> = window.iter().copied().collect();
    let values = values?;
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// A price series with an [`IndicatorSet`] per bar. Never mutated after
/// construction; trimming produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSeries {
    series: PriceSeries,
    indicators: Vec<IndicatorSet>,
}

impl EnrichedSeries {
    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn ticker(&self) -> &str {
        self.series.ticker()
    }

    pub fn bars(&self) -> &[PriceBar] {
        self.series.bars()
    }

    pub fn indicators(&self) -> &[IndicatorSet] {
        &self.indicators
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(&PriceBar, &IndicatorSet)> {
        Some((self.series.bars().get(index)?, self.indicators.get(index)?))
    }

    pub fn last(&self) -> Option<(&PriceBar, &IndicatorSet)> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PriceBar, &IndicatorSet)> {
        self.series.bars().iter().zip(self.indicators.iter())
    }

    /// Keep only bars dated within `[start, end]`; indicators keep the
    /// values computed over the full history.
    pub fn trimmed(&self, start: chrono::NaiveDate, end: chrono::NaiveDate) -> Result<Self> {
        let range = self.series.range_indices(start, end);
        let bars = self.series.bars()[range.clone()].to_vec();
        Ok(Self {
            series: PriceSeries::new(self.series.ticker(), bars)?,
            indicators: self.indicators[range].to_vec(),
        })
    }
}
