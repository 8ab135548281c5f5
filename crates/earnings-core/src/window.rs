//! Pre/post event windows
//!
//! A window pairs the last bar before an event with the first bar on or
//! after it. The reaction is measured from the pre-event close to the
//! event-day open, so overnight gaps on the release are captured.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::indicators::{EnrichedSeries, IndicatorSet};
use crate::model::{EarningsEvent, PriceBar};

/// RSI regime of the pre-event bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Overbought => "Overbought",
            Self::Oversold => "Oversold",
            Self::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Inclusive RSI bounds for the overbought/oversold zones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiThresholds {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl RsiThresholds {
    /// Undefined RSI reads as neutral.
    pub fn classify(&self, rsi: Option<f64>) -> RsiZone {
        match rsi {
            Some(v) if v >= self.overbought => RsiZone::Overbought,
            Some(v) if v <= self.oversold => RsiZone::Oversold,
            _ => RsiZone::Neutral,
        }
    }
}

/// Indicator state of the pre-event bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub rsi_zone: RsiZone,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    pub above_ma50: Option<bool>,
    pub above_ma200: Option<bool>,
}

impl IndicatorSnapshot {
    fn capture(bar: &PriceBar, set: &IndicatorSet, thresholds: &RsiThresholds) -> Self {
        Self {
            rsi: set.rsi,
            rsi_zone: thresholds.classify(set.rsi),
            ma50: set.ma50,
            ma200: set.ma200,
            above_ma50: set.ma50.map(|ma| bar.close > ma),
            above_ma200: set.ma200.map(|ma| bar.close > ma),
        }
    }
}

/// Price reaction around a single event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub ticker: String,
    pub event_date: NaiveDate,
    pub pre_bar: PriceBar,
    pub post_bar: PriceBar,
    /// `(post.open / pre.close - 1) * 100`
    pub pct_change: f64,
    /// Mean post-event volume over mean pre-event volume within the span
    pub volume_ratio: Option<f64>,
    /// Mean volume over every bar in the span
    pub mean_volume: f64,
    /// Sum of daily returns in the span before the event
    pub pre_return: Option<f64>,
    /// Sum of daily returns in the span from the event on
    pub post_return: Option<f64>,
    pub indicator_snapshot: IndicatorSnapshot,
    pub actual_eps: Option<f64>,
    pub estimated_eps: Option<f64>,
    pub surprise_pct: Option<f64>,
    /// Implied volatility priced after the pre-event bar
    pub pre_iv: Option<f64>,
    /// Implied volatility priced after the post-event bar
    pub post_iv: Option<f64>,
    /// `(post_iv / pre_iv - 1) * 100`
    pub iv_change: Option<f64>,
}

impl AnalysisWindow {
    /// Attach pre/post implied volatility; the change needs both sides.
    #[must_use]
    pub fn with_implied_volatility(mut self, pre_iv: Option<f64>, post_iv: Option<f64>) -> Self {
        self.pre_iv = pre_iv;
        self.post_iv = post_iv;
        self.iv_change = match (pre_iv, post_iv) {
            (Some(pre), Some(post)) if pre > 0.0 => Some((post / pre - 1.0) * 100.0),
            _ => None,
        };
        self
    }
}

/// Slices enriched series into per-event windows
#[derive(Debug, Clone, Copy, Default)]
pub struct EventWindowExtractor {
    thresholds: RsiThresholds,
}

impl EventWindowExtractor {
    pub fn new(thresholds: RsiThresholds) -> Self {
        Self { thresholds }
    }

    /// Window around `event_date`, or `None` when the event falls outside
    /// the series or fewer than two bars lie in
    /// `[event_date - days_before, event_date + days_after]`.
    pub fn extract(
        &self,
        series: &EnrichedSeries,
        event_date: NaiveDate,
        days_before: i64,
        days_after: i64,
    ) -> Option<AnalysisWindow> {
        self.try_extract(series, event_date, days_before, days_after)
            .inspect_err(|e| debug!("Skipping event: {e}"))
            .ok()
    }

    /// Like [`extract`](Self::extract), carrying the event's EPS fields.
    pub fn extract_event(
        &self,
        series: &EnrichedSeries,
        event: &EarningsEvent,
        days_before: i64,
        days_after: i64,
    ) -> Option<AnalysisWindow> {
        self.extract(series, event.event_date, days_before, days_after)
            .map(|mut window| {
                window.actual_eps = event.actual_eps;
                window.estimated_eps = event.estimated_eps;
                window.surprise_pct = event.surprise_pct;
                window
            })
    }

    /// Extraction with the skip reason kept
    pub fn try_extract(
        &self,
        series: &EnrichedSeries,
        event_date: NaiveDate,
        days_before: i64,
        days_after: i64,
    ) -> Result<AnalysisWindow> {
        let ticker = series.ticker();
        let insufficient = |bars: usize| AnalysisError::InsufficientWindow {
            ticker: ticker.to_string(),
            event_date,
            bars,
        };

        let idx = series.series().insertion_index(event_date);
        if idx == 0 || idx >= series.len() {
            return Err(AnalysisError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: format!("event {event_date} lies outside the price history"),
            });
        }

        let span_start = shift(event_date, -days_before);
        let span_end = shift(event_date, days_after);
        let span = series.series().range_indices(span_start, span_end);
        if span.len() < 2 {
            return Err(insufficient(span.len()));
        }

        let (pre_bar, pre_set) = series.get(idx - 1).ok_or_else(|| insufficient(span.len()))?;
        let (post_bar, _) = series.get(idx).ok_or_else(|| insufficient(span.len()))?;

        if pre_bar.close == 0.0 {
            return Err(AnalysisError::ComputationIndeterminate(format!(
                "{ticker} closed at zero before {event_date}"
            )));
        }
        let pct_change = (post_bar.open / pre_bar.close - 1.0) * 100.0;

        // pre slice: span bars before the event; post slice: from the event on
        let split = idx.clamp(span.start, span.end);
        let bars = series.bars();
        let sets = series.indicators();
        let pre_bars = &bars[span.start..split];
        let post_bars = &bars[split..span.end];

        let volume_ratio = match (mean_volume(pre_bars), mean_volume(post_bars)) {
            (Some(pre), Some(post)) if pre > 0.0 => Some(post / pre),
            _ => None,
        };

        Ok(AnalysisWindow {
            ticker: ticker.to_string(),
            event_date,
            pre_bar: *pre_bar,
            post_bar: *post_bar,
            pct_change,
            volume_ratio,
            mean_volume: mean_volume(&bars[span.clone()]).unwrap_or_default(),
            pre_return: sum_returns(&sets[span.start..split]),
            post_return: sum_returns(&sets[split..span.end]),
            indicator_snapshot: IndicatorSnapshot::capture(pre_bar, pre_set, &self.thresholds),
            actual_eps: None,
            estimated_eps: None,
            surprise_pct: None,
            pre_iv: None,
            post_iv: None,
            iv_change: None,
        })
    }
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

fn mean_volume(bars: &[PriceBar]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    Some(bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64)
}

fn sum_returns(sets: &[IndicatorSet]) -> Option<f64> {
    sets.iter()
        .filter_map(|s| s.daily_return)
        .fold(None, |acc, r| Some(acc.unwrap_or(0.0) + r))
}
