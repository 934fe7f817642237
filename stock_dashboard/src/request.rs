//! The user's selections for one refresh, rebuilt every time.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use market_data_ingestor::models::{
    request_params::{BarsRange, BarsRequestParams, RangePeriod},
    timeframe::{TimeFrame, TimeFrameUnit},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::IndicatorKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("unknown period {0:?} (expected 1d, 1wk, 1mo, 1y or max)")]
    UnknownPeriod(String),

    #[error("unknown chart type {0:?} (expected line or candlestick)")]
    UnknownChartType(String),

    #[error("{0}")]
    UnknownIndicator(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::OneDay,
        Period::OneWeek,
        Period::OneMonth,
        Period::OneYear,
        Period::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::OneWeek => "1wk",
            Period::OneMonth => "1mo",
            Period::OneYear => "1y",
            Period::Max => "max",
        }
    }

    /// Bar granularity fetched for this period.
    pub fn interval(&self) -> TimeFrame {
        match self {
            Period::OneDay => TimeFrame {
                amount: 1,
                unit: TimeFrameUnit::Minute,
            },
            Period::OneWeek => TimeFrame {
                amount: 30,
                unit: TimeFrameUnit::Minute,
            },
            Period::OneMonth => TimeFrame::day(),
            Period::OneYear | Period::Max => TimeFrame::week(),
        }
    }

    /// Uppercased form used in chart titles, e.g. `1WK`.
    pub fn label(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    /// The slice of history to ask the provider for.
    ///
    /// One week is an explicit seven-day window ending at `now`; the rest are
    /// provider lookbacks.
    pub fn range(&self, now: DateTime<Utc>) -> BarsRange {
        match self {
            Period::OneDay => BarsRange::Period(RangePeriod::OneDay),
            Period::OneWeek => BarsRange::Between {
                start: now - Duration::days(7),
                end: now,
            },
            Period::OneMonth => BarsRange::Period(RangePeriod::OneMonth),
            Period::OneYear => BarsRange::Period(RangePeriod::OneYear),
            Period::Max => BarsRange::Period(RangePeriod::Max),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Period::OneDay),
            "1wk" | "1w" => Ok(Period::OneWeek),
            "1mo" => Ok(Period::OneMonth),
            "1y" => Ok(Period::OneYear),
            "max" => Ok(Period::Max),
            _ => Err(RequestError::UnknownPeriod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Line,
    Candlestick,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartType::Line => f.write_str("Line"),
            ChartType::Candlestick => f.write_str("Candlestick"),
        }
    }
}

impl FromStr for ChartType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(ChartType::Line),
            "candlestick" | "candle" => Ok(ChartType::Candlestick),
            _ => Err(RequestError::UnknownChartType(s.to_string())),
        }
    }
}

/// One refresh worth of selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardRequest {
    ticker: String,
    pub period: Period,
    pub chart_type: ChartType,
    indicators: Vec<IndicatorKind>,
}

impl DashboardRequest {
    pub fn new(
        ticker: &str,
        period: Period,
        chart_type: ChartType,
        indicators: impl IntoIterator<Item = IndicatorKind>,
    ) -> Result<Self, RequestError> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(RequestError::EmptyTicker);
        }
        let mut selected = Vec::new();
        for kind in indicators {
            if !selected.contains(&kind) {
                selected.push(kind);
            }
        }
        Ok(Self {
            ticker,
            period,
            chart_type,
            indicators: selected,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn indicators(&self) -> &[IndicatorKind] {
        &self.indicators
    }

    pub fn to_params(&self, now: DateTime<Utc>) -> BarsRequestParams {
        BarsRequestParams::new(
            self.ticker.clone(),
            self.period.interval(),
            self.period.range(now),
        )
    }
}

/// Parses the comma-separated indicator list used on the command line and in
/// interactive mode (`sma,ema`). Blank input selects nothing.
pub fn parse_indicators(s: &str) -> Result<Vec<IndicatorKind>, RequestError> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<IndicatorKind>().map_err(RequestError::UnknownIndicator))
        .collect()
}
