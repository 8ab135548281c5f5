//! Earnings events

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single earnings release. EPS fields are optional and never block
/// price-window computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsEvent {
    pub ticker: String,
    pub event_date: NaiveDate,
    pub actual_eps: Option<f64>,
    pub estimated_eps: Option<f64>,
    pub surprise_pct: Option<f64>,
}

impl EarningsEvent {
    pub fn new(ticker: impl Into<String>, event_date: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            event_date,
            actual_eps: None,
            estimated_eps: None,
            surprise_pct: None,
        }
    }

    pub fn with_eps(mut self, actual: Option<f64>, estimated: Option<f64>) -> Self {
        self.actual_eps = actual;
        self.estimated_eps = estimated;
        if self.surprise_pct.is_none() {
            self.surprise_pct = surprise_from(actual, estimated);
        }
        self
    }

    pub fn with_surprise(mut self, surprise_pct: Option<f64>) -> Self {
        if surprise_pct.is_some() {
            self.surprise_pct = surprise_pct;
        }
        self
    }
}

/// Percentage deviation of actual EPS from the estimate.
fn surprise_from(actual: Option<f64>, estimated: Option<f64>) -> Option<f64> {
    match (actual, estimated) {
        (Some(a), Some(e)) if e != 0.0 => Some((a - e) / e.abs() * 100.0),
        _ => None,
    }
}
