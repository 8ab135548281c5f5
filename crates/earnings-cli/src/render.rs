//! Terminal table rendering for comparison reports

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use earnings_core::{ComparisonReport, EarningsEvent, TickerReport};

const NA: &str = "N/A";

fn new_table<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn number(value: Option<f64>, decimals: usize) -> Cell {
    let text = value.map_or_else(|| NA.to_string(), |v| format!("{v:.decimals$}"));
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn percent(value: Option<f64>) -> Cell {
    let text = value.map_or_else(|| NA.to_string(), |v| format!("{v:+.2}%"));
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Yes",
        Some(false) => "No",
        None => NA,
    }
}

/// One row per event window of a ticker
pub fn windows_table(report: &TickerReport) -> Table {
    let mut table = new_table([
        "Event", "Pre Close", "Post Open", "Change", "Vol Ratio", "RSI", "Zone", "> MA200",
        "EPS Surprise", "Pre IV", "Post IV", "IV Change",
    ]);
    for w in &report.windows {
        table.add_row(vec![
            Cell::new(w.event_date),
            number(Some(w.pre_bar.close), 2),
            number(Some(w.post_bar.open), 2),
            percent(Some(w.pct_change)),
            number(w.volume_ratio, 2),
            number(w.indicator_snapshot.rsi, 1),
            Cell::new(w.indicator_snapshot.rsi_zone),
            Cell::new(flag(w.indicator_snapshot.above_ma200)),
            percent(w.surprise_pct),
            number(w.pre_iv.map(|iv| iv * 100.0), 1),
            number(w.post_iv.map(|iv| iv * 100.0), 1),
            percent(w.iv_change),
        ]);
    }
    table
}

/// Side-by-side summary of every ticker
pub fn summary_table(report: &ComparisonReport) -> Table {
    let mut table = new_table([
        "Ticker", "Events", "Mean Change", "Up", "Down", "Mean Volume", "Mean RSI", "% > MA200",
        "Overbought", "Oversold", "Mean Surprise",
    ]);
    for t in &report.tickers {
        let s = &t.summary;
        table.add_row(vec![
            Cell::new(&s.ticker),
            Cell::new(s.event_count),
            percent(s.mean_pct_change),
            Cell::new(s.positive_count),
            Cell::new(s.negative_count),
            number(s.mean_volume, 0),
            number(s.mean_rsi, 1),
            number(s.pct_above_ma200, 1),
            Cell::new(s.overbought_count),
            Cell::new(s.oversold_count),
            percent(s.eps.map(|e| e.mean_surprise_pct)),
        ]);
    }
    table
}

/// Latest-bar state of every ticker
pub fn snapshot_table(report: &ComparisonReport) -> Table {
    let mut table = new_table([
        "Ticker", "Close", "RSI", "Volatility", "vs MA50", "vs MA200", "Golden Cross", "IV",
    ]);
    for t in &report.tickers {
        let s = &t.snapshot;
        table.add_row(vec![
            Cell::new(&t.ticker),
            number(s.latest_close, 2),
            number(s.latest_rsi, 1),
            number(s.latest_volatility, 1),
            percent(s.price_vs_ma50_pct),
            percent(s.price_vs_ma200_pct),
            Cell::new(flag(s.signals.golden_cross)),
            number(s.implied_volatility.map(|iv| iv * 100.0), 1),
        ]);
    }
    table
}

/// Return correlation per ticker pair
pub fn correlation_table(report: &ComparisonReport) -> Table {
    let mut table = new_table(["Pair", "Correlation", "Observations"]);
    for pair in &report.correlations {
        table.add_row(vec![
            Cell::new(format!("{} / {}", pair.first, pair.second)),
            Cell::new(pair.result.label()),
            Cell::new(pair.result.observations),
        ]);
    }
    table
}

/// Earnings calendar listing
pub fn events_table(events: &[EarningsEvent]) -> Table {
    let mut table = new_table(["Date", "Reported EPS", "Estimated EPS", "Surprise"]);
    for e in events {
        table.add_row(vec![
            Cell::new(e.event_date),
            number(e.actual_eps, 2),
            number(e.estimated_eps, 2),
            percent(e.surprise_pct),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_absent_values_render_na() {
        let event = EarningsEvent::new("AAPL", NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        let rendered = events_table(&[event]).to_string();
        assert!(rendered.contains("2024-08-01"));
        assert_eq!(rendered.matches(NA).count(), 3);
    }

    #[test]
    fn test_percent_is_signed() {
        let event = EarningsEvent::new("AAPL", NaiveDate::from_ymd_opt(2024, 8, 1).unwrap())
            .with_eps(Some(1.1), Some(1.0));
        let rendered = events_table(&[event]).to_string();
        assert!(rendered.contains("+10.00%"));
        assert!(rendered.contains("1.10"));
    }

    #[test]
    fn test_flag() {
        assert_eq!(flag(Some(true)), "Yes");
        assert_eq!(flag(None), NA);
    }
}
