//! Command-line interface for earnings comparisons

mod render;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use earnings_core::{
    AnalysisConfig, AnalysisRequest, EarningsComparison, EventSelection, MarketDataClient,
};
use earnings_utils::Config;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "earnings-cli")]
#[command(about = "Compare how stocks trade around their earnings releases", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a ticker and its peers around earnings events
    Compare {
        /// Primary ticker
        ticker: String,

        /// Comma-separated peer tickers
        #[arg(long, value_delimiter = ',')]
        peers: Vec<String>,

        /// Analyse one shared date (YYYY-MM-DD) instead of each calendar
        #[arg(long)]
        event_date: Option<NaiveDate>,

        /// Calendar days before each event
        #[arg(long)]
        days_before: Option<i64>,

        /// Calendar days after each event
        #[arg(long)]
        days_after: Option<i64>,

        /// Most recent calendar events per ticker
        #[arg(long)]
        max_events: Option<usize>,

        /// Skip option-chain implied volatility
        #[arg(long)]
        no_iv: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a ticker's earnings calendar
    Events {
        ticker: String,

        /// Print the events as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let app = Config::from_env("earnings-cli");
    if earnings_utils::init_tracing_from(&app).is_err() {
        eprintln!("tracing subscriber already installed");
    }

    let args = Args::parse();

    info!(environment = %app.environment, "Starting {}", app.app_name);

    match args.command {
        Command::Compare {
            ticker,
            peers,
            event_date,
            days_before,
            days_after,
            max_events,
            no_iv,
            json,
        } => {
            let defaults = AnalysisConfig::default();
            let config = AnalysisConfig::builder()
                .with_env_api_key()
                .days_before(days_before.unwrap_or(defaults.days_before))
                .days_after(days_after.unwrap_or(defaults.days_after))
                .max_events(max_events.unwrap_or(defaults.max_events))
                .include_implied_volatility(!no_iv)
                .build()
                .context("invalid analysis options")?;

            let provider = MarketDataClient::new(&config)?;
            let mut engine = EarningsComparison::new(provider, config)?;

            let selection = match event_date {
                Some(date) => EventSelection::Date { date },
                None => engine.calendar_selection(),
            };
            let request = AnalysisRequest::new(&ticker, &peers, selection);
            let report = engine.run(&request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            for ticker_report in &report.tickers {
                println!("\n{} event windows", ticker_report.ticker);
                if ticker_report.windows.is_empty() {
                    println!("No usable event windows");
                } else {
                    println!("{}", render::windows_table(ticker_report));
                }
            }

            println!("\nSummary");
            println!("{}", render::summary_table(&report));
            println!("\nCurrent technicals");
            println!("{}", render::snapshot_table(&report));
            if !report.correlations.is_empty() {
                println!("\nReturn correlation");
                println!("{}", render::correlation_table(&report));
            }
        },
        Command::Events { ticker, json } => {
            let config = AnalysisConfig::default().with_env_api_key();
            let provider = MarketDataClient::new(&config)?;
            let engine = EarningsComparison::new(provider, config)?;
            let events = engine.earnings_calendar(&ticker);

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("No earnings events found for {ticker}");
            } else {
                println!("{}", render::events_table(&events));
            }
        },
    }

    Ok(())
}
