//! Per-ticker aggregation of event windows

use serde::{Deserialize, Serialize};

use crate::window::{AnalysisWindow, RsiZone};

/// EPS surprise statistics over the events that reported one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsSurpriseSummary {
    pub mean_surprise_pct: f64,
    pub positive_count: usize,
    pub negative_count: usize,
    /// Events that carried a surprise value
    pub reported_count: usize,
}

/// Aggregate reaction of one ticker across its events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub ticker: String,
    pub event_count: usize,
    pub mean_pct_change: Option<f64>,
    pub positive_count: usize,
    pub negative_count: usize,
    pub mean_volume: Option<f64>,
    pub mean_rsi: Option<f64>,
    /// Share of events whose pre-event close sat above MA200, in percent
    pub pct_above_ma200: Option<f64>,
    pub overbought_count: usize,
    pub oversold_count: usize,
    /// Omitted entirely when no event carried a surprise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<EpsSurpriseSummary>,
}

impl ComparisonSummary {
    /// Summary of a ticker with no usable events
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            event_count: 0,
            mean_pct_change: None,
            positive_count: 0,
            negative_count: 0,
            mean_volume: None,
            mean_rsi: None,
            pct_above_ma200: None,
            overbought_count: 0,
            oversold_count: 0,
            eps: None,
        }
    }
}

/// Reduces window lists into [`ComparisonSummary`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryAggregator;

impl SummaryAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(&self, ticker: &str, windows: &[AnalysisWindow]) -> ComparisonSummary {
        if windows.is_empty() {
            return ComparisonSummary::empty(ticker);
        }

        let event_count = windows.len();
        let changes: Vec<f64> = windows.iter().map(|w| w.pct_change).collect();
        let volumes: Vec<f64> = windows.iter().map(|w| w.mean_volume).collect();
        let rsis: Vec<f64> = windows
            .iter()
            .filter_map(|w| w.indicator_snapshot.rsi)
            .collect();

        let above_ma200 = windows
            .iter()
            .filter(|w| w.indicator_snapshot.above_ma200 == Some(true))
            .count();
        let zone_count = |zone: RsiZone| {
            windows
                .iter()
                .filter(|w| w.indicator_snapshot.rsi_zone == zone)
                .count()
        };

        ComparisonSummary {
            ticker: ticker.to_string(),
            event_count,
            mean_pct_change: mean(&changes),
            positive_count: changes.iter().filter(|c| **c > 0.0).count(),
            negative_count: changes.iter().filter(|c| **c < 0.0).count(),
            mean_volume: mean(&volumes),
            mean_rsi: mean(&rsis),
            pct_above_ma200: Some(above_ma200 as f64 / event_count as f64 * 100.0),
            overbought_count: zone_count(RsiZone::Overbought),
            oversold_count: zone_count(RsiZone::Oversold),
            eps: eps_summary(windows),
        }
    }
}

fn eps_summary(windows: &[AnalysisWindow]) -> Option<EpsSurpriseSummary> {
    let surprises: Vec<f64> = windows
        .iter()
        .filter_map(|w| w.surprise_pct)
        .filter(|s| s.is_finite())
        .collect();

    Some(EpsSurpriseSummary {
        mean_surprise_pct: mean(&surprises)?,
        positive_count: surprises.iter().filter(|s| **s > 0.0).count(),
        negative_count: surprises.iter().filter(|s| **s < 0.0).count(),
        reported_count: surprises.len(),
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
