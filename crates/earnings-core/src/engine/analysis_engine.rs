//! Earnings comparison pipeline

use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::cache::{PriceCache, normalize_ticker};
use crate::config::AnalysisConfig;
use crate::correlation::{CorrelationResult, correlate};
use crate::error::{AnalysisError, Result};
use crate::indicators::EnrichedSeries;
use crate::model::EarningsEvent;
use crate::provider::MarketDataProvider;
use crate::signals::TickerSnapshot;
use crate::summary::SummaryAggregator;
use crate::window::{AnalysisWindow, EventWindowExtractor, RsiThresholds};

use super::result::{
    AnalysisRequest, ComparisonReport, EventSelection, PairCorrelation, TickerReport,
};

/// Runs the full pipeline for a set of tickers: events, enriched prices,
/// windows, summaries, then pairwise correlation.
///
/// Tickers are processed one after another through a single
/// [`PriceCache`], so repeated runs over the same ranges reuse fetched data.
pub struct EarningsComparison<P> {
    cache: PriceCache<P>,
    config: AnalysisConfig,
    extractor: EventWindowExtractor,
    aggregator: SummaryAggregator,
}

impl<P: MarketDataProvider> EarningsComparison<P> {
    pub fn new(provider: P, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let thresholds = RsiThresholds {
            overbought: config.overbought,
            oversold: config.oversold,
        };

        Ok(Self {
            cache: PriceCache::new(provider, config.lookback_days),
            extractor: EventWindowExtractor::new(thresholds),
            aggregator: SummaryAggregator::new(),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cache(&self) -> &PriceCache<P> {
        &self.cache
    }

    /// Calendar selection using the configured event cap
    pub fn calendar_selection(&self) -> EventSelection {
        EventSelection::Calendar {
            max_events: self.config.max_events,
        }
    }

    /// Earnings calendar for one ticker, newest first. Provider failures
    /// degrade to an empty list.
    pub fn earnings_calendar(&self, ticker: &str) -> Vec<EarningsEvent> {
        let ticker = normalize_ticker(ticker);
        match self.cache.provider().fetch_earnings_calendar(&ticker) {
            Ok(mut events) => {
                events.sort_by(|a, b| b.event_date.cmp(&a.event_date));
                events
            },
            Err(e) => {
                let err = AnalysisError::from(e);
                warn!(ticker = %ticker, error = %err, "Earnings calendar unavailable");
                Vec::new()
            },
        }
    }

    pub fn run(&mut self, request: &AnalysisRequest) -> Result<ComparisonReport> {
        let primary = request
            .primary()
            .ok_or_else(|| AnalysisError::InvalidTicker("no tickers requested".to_string()))?
            .to_string();

        let run_id = Uuid::new_v4();
        info!(%run_id, tickers = ?request.tickers, "Starting earnings comparison");

        let mut reports = Vec::with_capacity(request.tickers.len());
        let mut series = Vec::with_capacity(request.tickers.len());

        for ticker in &request.tickers {
            let span = info_span!("ticker", ticker = %ticker, %run_id);
            let _enter = span.enter();

            let (report, fetched) = self.analyze_ticker(ticker, request.selection)?;
            info!(
                events = report.events.len(),
                windows = report.windows.len(),
                skipped = report.skipped_events(),
                "Ticker analysed"
            );
            reports.push(report);
            series.push(fetched);
        }

        let correlations = pairwise_correlations(&request.tickers, &series);

        info!(%run_id, pairs = correlations.len(), "Earnings comparison complete");

        Ok(ComparisonReport {
            run_id,
            generated_at: Utc::now(),
            primary,
            request: request.clone(),
            tickers: reports,
            correlations,
        })
    }

    fn analyze_ticker(
        &mut self,
        ticker: &str,
        selection: EventSelection,
    ) -> Result<(TickerReport, Option<Arc<EnrichedSeries>>)> {
        let events = self.resolve_events(ticker, selection);

        let earliest = events.iter().map(|e| e.event_date).min();
        let latest = events.iter().map(|e| e.event_date).max();
        let (Some(earliest), Some(latest)) = (earliest, latest) else {
            warn!("No earnings events to analyse");
            return Ok((TickerReport::empty(ticker, events), None));
        };

        let start = shift_back(earliest, self.config.days_before);
        let end = shift_forward(latest, self.config.days_after);

        let Some(series) = self.cache.get_or_fetch(ticker, start, end)? else {
            return Ok((TickerReport::empty(ticker, events), None));
        };

        let windows: Vec<_> = events
            .iter()
            .filter_map(|event| {
                self.extractor.extract_event(
                    &series,
                    event,
                    self.config.days_before,
                    self.config.days_after,
                )
            })
            .map(|window| self.attach_event_iv(ticker, window))
            .collect();

        let summary = self.aggregator.summarize(ticker, &windows);
        let snapshot = TickerSnapshot::from_series(&series)
            .with_implied_volatility(self.implied_volatility(ticker, None));

        let report = TickerReport {
            ticker: ticker.to_string(),
            bar_count: series.len(),
            events,
            windows,
            summary,
            snapshot,
        };
        Ok((report, Some(series)))
    }

    fn resolve_events(&self, ticker: &str, selection: EventSelection) -> Vec<EarningsEvent> {
        match selection {
            EventSelection::Date { date } => vec![EarningsEvent::new(ticker, date)],
            EventSelection::Calendar { max_events } => {
                let mut events = self.earnings_calendar(ticker);
                events.truncate(max_events);
                debug!(count = events.len(), "Resolved calendar events");
                events
            },
        }
    }

    /// Combined IV of the expiry following `after`, or of the nearest
    /// listed expiry. Failures read as absent.
    fn implied_volatility(&self, ticker: &str, after: Option<NaiveDate>) -> Option<f64> {
        if !self.config.include_implied_volatility {
            return None;
        }
        match self.cache.provider().fetch_option_chain(ticker, after) {
            Ok(iv) => iv.combined(),
            Err(e) => {
                debug!(error = %e, ?after, "Implied volatility unavailable");
                None
            },
        }
    }

    fn attach_event_iv(&self, ticker: &str, window: AnalysisWindow) -> AnalysisWindow {
        if !self.config.include_implied_volatility {
            return window;
        }
        let pre_iv = self.implied_volatility(ticker, Some(window.pre_bar.date));
        let post_iv = self.implied_volatility(ticker, Some(window.post_bar.date));
        window.with_implied_volatility(pre_iv, post_iv)
    }
}

fn pairwise_correlations(
    tickers: &[String],
    series: &[Option<Arc<EnrichedSeries>>],
) -> Vec<PairCorrelation> {
    let mut pairs = Vec::new();
    for i in 0..tickers.len() {
        for j in (i + 1)..tickers.len() {
            let result = match (&series[i], &series[j]) {
                (Some(a), Some(b)) => correlate(a.series(), b.series()),
                _ => CorrelationResult::not_available(0),
            };
            pairs.push(PairCorrelation {
                first: tickers[i].clone(),
                second: tickers[j].clone(),
                result,
            });
        }
    }
    pairs
}

fn shift_back(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_sub_days(Days::new(days.max(0).unsigned_abs()))
        .unwrap_or(NaiveDate::MIN)
}

fn shift_forward(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_days(Days::new(days.max(0).unsigned_abs()))
        .unwrap_or(NaiveDate::MAX)
}
