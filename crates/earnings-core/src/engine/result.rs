//! Comparison request and report types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::normalize_ticker;
use crate::correlation::CorrelationResult;
use crate::model::EarningsEvent;
use crate::signals::TickerSnapshot;
use crate::summary::ComparisonSummary;
use crate::window::AnalysisWindow;

/// Which events each ticker is analysed around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EventSelection {
    /// One date shared by every ticker
    Date { date: NaiveDate },
    /// Each ticker's own calendar, newest first, capped at `max_events`
    Calendar { max_events: usize },
}

/// Tickers to compare, primary first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub tickers: Vec<String>,
    pub selection: EventSelection,
}

impl AnalysisRequest {
    /// Compare `primary` against `peers`; duplicates and blank peers are
    /// dropped. A blank primary yields an empty request.
    pub fn new<I, S>(primary: &str, peers: I, selection: EventSelection) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let primary = normalize_ticker(primary);
        if primary.is_empty() {
            return Self {
                tickers: Vec::new(),
                selection,
            };
        }

        let mut tickers = vec![primary];
        for ticker in peers.into_iter().map(|p| normalize_ticker(p.as_ref())) {
            if !ticker.is_empty() && !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }
        Self { tickers, selection }
    }

    pub fn primary(&self) -> Option<&str> {
        self.tickers.first().map(String::as_str)
    }
}

/// Everything computed for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerReport {
    pub ticker: String,
    /// Events the windows were requested for
    pub events: Vec<EarningsEvent>,
    /// One per event that had a usable window
    pub windows: Vec<AnalysisWindow>,
    pub summary: ComparisonSummary,
    pub snapshot: TickerSnapshot,
    /// Bars fetched for the analysed span
    pub bar_count: usize,
}

impl TickerReport {
    /// Report for a ticker with no usable data
    pub fn empty(ticker: impl Into<String>, events: Vec<EarningsEvent>) -> Self {
        let ticker = ticker.into();
        Self {
            summary: ComparisonSummary::empty(ticker.clone()),
            ticker,
            events,
            windows: Vec::new(),
            snapshot: TickerSnapshot::default(),
            bar_count: 0,
        }
    }

    /// Events that produced no window
    pub fn skipped_events(&self) -> usize {
        self.events.len().saturating_sub(self.windows.len())
    }
}

/// Return correlation between two tickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCorrelation {
    pub first: String,
    pub second: String,
    pub result: CorrelationResult,
}

impl PairCorrelation {
    fn matches(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

/// Outcome of one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub primary: String,
    pub request: AnalysisRequest,
    /// In request order
    pub tickers: Vec<TickerReport>,
    /// One per ticker pair, in request order
    pub correlations: Vec<PairCorrelation>,
}

impl ComparisonReport {
    pub fn ticker(&self, ticker: &str) -> Option<&TickerReport> {
        let ticker = normalize_ticker(ticker);
        self.tickers.iter().find(|t| t.ticker == ticker)
    }

    /// Correlation between two tickers, in either order
    pub fn correlation(&self, a: &str, b: &str) -> Option<&CorrelationResult> {
        let (a, b) = (normalize_ticker(a), normalize_ticker(b));
        self.correlations
            .iter()
            .find(|p| p.matches(&a, &b))
            .map(|p| &p.result)
    }

    pub fn primary_report(&self) -> Option<&TickerReport> {
        self.ticker(&self.primary)
    }
}
