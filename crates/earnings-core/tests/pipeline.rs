//! End-to-end pipeline runs against an in-memory provider

use chrono::{Datelike, NaiveDate, Weekday};
use earnings_core::{
    AnalysisConfig, AnalysisRequest, CorrelationCategory, EarningsComparison, EarningsEvent,
    EventSelection, ImpliedVolatility, MarketDataProvider, PriceBar, ProviderError,
};
use std::cell::Cell;
use std::collections::HashMap;

struct FakeProvider {
    bars: HashMap<String, Vec<PriceBar>>,
    calendars: HashMap<String, Vec<EarningsEvent>>,
    history_calls: Cell<usize>,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            bars: HashMap::new(),
            calendars: HashMap::new(),
            history_calls: Cell::new(0),
        }
    }

    fn with_ticker(mut self, ticker: &str, bars: Vec<PriceBar>, events: &[NaiveDate]) -> Self {
        let calendar = events
            .iter()
            .map(|d| EarningsEvent::new(ticker, *d).with_eps(Some(1.1), Some(1.0)))
            .collect();
        self.bars.insert(ticker.to_string(), bars);
        self.calendars.insert(ticker.to_string(), calendar);
        self
    }
}

impl MarketDataProvider for FakeProvider {
    fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        self.history_calls.set(self.history_calls.get() + 1);
        let bars = self.bars.get(ticker).ok_or_else(|| ProviderError::NotFound {
            provider: "fake".to_string(),
            ticker: ticker.to_string(),
        })?;
        Ok(bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .copied()
            .collect())
    }

    fn fetch_earnings_calendar(&self, ticker: &str) -> Result<Vec<EarningsEvent>, ProviderError> {
        Ok(self.calendars.get(ticker).cloned().unwrap_or_default())
    }

    fn fetch_option_chain(
        &self,
        _ticker: &str,
        _expiry: Option<NaiveDate>,
    ) -> Result<ImpliedVolatility, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: "fake".to_string(),
            operation: "option chains".to_string(),
        })
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Weekday bars from mid-2022 through 2024 with a wavy uptrend
fn weekday_bars(scale: f64, skip: impl Fn(NaiveDate) -> bool) -> Vec<PriceBar> {
    date(2022, 6, 1)
        .iter_days()
        .take_while(|d| *d <= date(2024, 12, 31))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .enumerate()
        .filter(|(_, d)| !skip(*d))
        .map(|(i, d)| {
            let x = i as f64;
            let close = scale * (100.0 + 10.0 * (x / 7.0).sin() + 0.05 * x);
            let open = close * (1.0 + 0.01 * (x / 3.0).cos());
            let volume = 1_000 + (i as u64 % 50) * 10;
            PriceBar::new(d, open, close.max(open), close.min(open), close, volume)
        })
        .collect()
}

fn events() -> Vec<NaiveDate> {
    vec![
        date(2023, 11, 2),
        date(2024, 2, 1),
        date(2024, 5, 2),
        date(2024, 8, 1),
    ]
}

fn config() -> AnalysisConfig {
    AnalysisConfig::builder()
        .window_days(5)
        .max_events(4)
        .include_implied_volatility(false)
        .build()
        .unwrap()
}

#[test]
fn test_calendar_comparison() {
    let provider = FakeProvider::new()
        .with_ticker("AAA", weekday_bars(1.0, |_| false), &events())
        .with_ticker("BBB", weekday_bars(2.5, |_| false), &events());

    let mut engine = EarningsComparison::new(provider, config()).unwrap();
    let selection = engine.calendar_selection();
    let report = engine
        .run(&AnalysisRequest::new("AAA", ["BBB"], selection))
        .unwrap();

    let aaa = report.ticker("AAA").unwrap();
    assert_eq!(aaa.events.len(), 4);
    assert_eq!(aaa.windows.len(), 4);
    assert_eq!(aaa.summary.event_count, 4);
    assert_eq!(
        aaa.summary.positive_count + aaa.summary.negative_count,
        aaa.windows.iter().filter(|w| w.pct_change != 0.0).count()
    );
    // the long average is valid from the first analysed bar
    assert!(aaa.windows.iter().all(|w| w.indicator_snapshot.ma200.is_some()));
    assert!(aaa.summary.pct_above_ma200.is_some());

    let eps = aaa.summary.eps.unwrap();
    assert_eq!(eps.positive_count, 4);
    assert!((eps.mean_surprise_pct - 10.0).abs() < 1e-9);

    // same shape at a different price level
    let correlation = report.correlation("BBB", "AAA").unwrap();
    assert!((correlation.coefficient.unwrap() - 1.0).abs() < 1e-6);
    assert_eq!(correlation.category, CorrelationCategory::High);
}

#[test]
fn test_sparse_ticker_loses_single_bar_event() {
    // around 2024-08-01 only the event day itself trades
    let sparse = |d: NaiveDate| {
        d >= date(2024, 7, 27) && d <= date(2024, 8, 6) && d != date(2024, 8, 1)
    };
    let provider = FakeProvider::new()
        .with_ticker("AAA", weekday_bars(1.0, |_| false), &events())
        .with_ticker("THIN", weekday_bars(1.0, sparse), &events());

    let mut engine = EarningsComparison::new(provider, config()).unwrap();
    let selection = engine.calendar_selection();
    let report = engine
        .run(&AnalysisRequest::new("AAA", ["THIN"], selection))
        .unwrap();

    assert_eq!(report.ticker("AAA").unwrap().summary.event_count, 4);
    let thin = report.ticker("THIN").unwrap();
    assert_eq!(thin.summary.event_count, 3);
    assert_eq!(thin.skipped_events(), 1);
    assert!(thin.windows.iter().all(|w| w.event_date != date(2024, 8, 1)));
}

#[test]
fn test_repeat_run_is_served_from_cache() {
    let provider = FakeProvider::new().with_ticker("AAA", weekday_bars(1.0, |_| false), &events());

    let mut engine = EarningsComparison::new(provider, config()).unwrap();
    let selection = engine.calendar_selection();
    let request = AnalysisRequest::new("AAA", Vec::<String>::new(), selection);

    let first = engine.run(&request).unwrap();
    let calls = engine.cache().provider().history_calls.get();
    let second = engine.run(&request).unwrap();

    assert_eq!(calls, 1);
    assert_eq!(engine.cache().provider().history_calls.get(), 1);
    // deterministic apart from run identity
    assert_eq!(first.tickers, second.tickers);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn test_unknown_ticker_appears_empty() {
    let provider = FakeProvider::new().with_ticker("AAA", weekday_bars(1.0, |_| false), &events());

    let mut engine = EarningsComparison::new(provider, config()).unwrap();
    let selection = EventSelection::Date {
        date: date(2024, 5, 2),
    };
    let report = engine
        .run(&AnalysisRequest::new("AAA", ["ZZZ"], selection))
        .unwrap();

    assert_eq!(report.tickers.len(), 2);
    let zzz = report.ticker("ZZZ").unwrap();
    assert!(zzz.windows.is_empty());
    assert_eq!(zzz.summary.event_count, 0);
    assert_eq!(zzz.summary.mean_rsi, None);
    assert_eq!(
        report.correlation("AAA", "ZZZ").unwrap().category,
        CorrelationCategory::NotAvailable
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["primary"], "AAA");
    assert_eq!(json["tickers"].as_array().unwrap().len(), 2);
}
