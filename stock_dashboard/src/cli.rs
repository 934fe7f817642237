//! Command-line surface and the interactive line grammar.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::Level;

use crate::{
    indicators::IndicatorKind,
    request::{ChartType, DashboardRequest, Period, RequestError, parse_indicators},
};

#[derive(Parser, Debug)]
#[command(version, about = "Single-ticker stock dashboard")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch once and print the dashboard
    Show(ShowArgs),

    /// Read `TICKER PERIOD CHART [sma,ema]` lines and refresh on each one
    Interactive {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    #[arg(long, default_value = "AAPL")]
    pub ticker: String,

    /// 1d, 1wk, 1mo, 1y or max
    #[arg(long, default_value = "1d")]
    pub period: Period,

    /// line or candlestick
    #[arg(long, default_value = "line")]
    pub chart: ChartType,

    /// sma or ema; repeat for both
    #[arg(long = "indicator")]
    pub indicators: Vec<IndicatorKind>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ShowArgs {
    pub fn request(&self) -> Result<DashboardRequest, RequestError> {
        DashboardRequest::new(
            &self.ticker,
            self.period,
            self.chart,
            self.indicators.iter().copied(),
        )
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One line typed in interactive mode.
#[derive(Debug, PartialEq, Eq)]
pub enum InteractiveInput {
    Blank,
    Quit,
    Refresh(DashboardRequest),
}

/// `TICKER [PERIOD] [CHART] [sma,ema]`; missing fields take the defaults.
pub fn parse_interactive_line(line: &str) -> Result<InteractiveInput, RequestError> {
    let mut words = line.split_whitespace();
    let Some(ticker) = words.next() else {
        return Ok(InteractiveInput::Blank);
    };
    if matches!(ticker.to_ascii_lowercase().as_str(), "quit" | "exit" | "q") {
        return Ok(InteractiveInput::Quit);
    }

    let period = words.next().map(str::parse::<Period>).transpose()?.unwrap_or_default();
    let chart = words.next().map(str::parse::<ChartType>).transpose()?.unwrap_or_default();
    let indicators = match words.next() {
        Some(list) => parse_indicators(list)?,
        None => Vec::new(),
    };
    DashboardRequest::new(ticker, period, chart, indicators).map(InteractiveInput::Refresh)
}
