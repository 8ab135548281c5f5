//! Latest-bar moving-average signals

use serde::{Deserialize, Serialize};

use crate::indicators::EnrichedSeries;

/// Moving-average position of the latest bar. Each flag is absent while the
/// averages it needs are still warming up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaSignals {
    pub above_ma50: Option<bool>,
    pub above_ma200: Option<bool>,
    /// MA50 above MA200
    pub golden_cross: Option<bool>,
}

/// Current technical state of one ticker
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub latest_close: Option<f64>,
    pub latest_rsi: Option<f64>,
    pub latest_volatility: Option<f64>,
    /// `(close / MA50 - 1) * 100`
    pub price_vs_ma50_pct: Option<f64>,
    /// `(close / MA200 - 1) * 100`
    pub price_vs_ma200_pct: Option<f64>,
    pub signals: MaSignals,
    /// Combined call/put implied volatility, as a fraction
    pub implied_volatility: Option<f64>,
}

impl TickerSnapshot {
    /// Snapshot of the last bar; all fields absent for an empty series.
    pub fn from_series(series: &EnrichedSeries) -> Self {
        let Some((bar, set)) = series.last() else {
            return Self::default();
        };

        let vs = |ma: Option<f64>| ma.filter(|m| *m != 0.0).map(|m| (bar.close / m - 1.0) * 100.0);

        Self {
            latest_close: Some(bar.close),
            latest_rsi: set.rsi,
            latest_volatility: set.volatility,
            price_vs_ma50_pct: vs(set.ma50),
            price_vs_ma200_pct: vs(set.ma200),
            signals: MaSignals {
                above_ma50: set.ma50.map(|ma| bar.close > ma),
                above_ma200: set.ma200.map(|ma| bar.close > ma),
                golden_cross: set.ma50.zip(set.ma200).map(|(short, long)| short > long),
            },
            implied_volatility: None,
        }
    }

    pub fn with_implied_volatility(mut self, iv: Option<f64>) -> Self {
        self.implied_volatility = iv;
        self
    }
}
