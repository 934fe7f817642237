use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeframe::TimeFrame;

/// Provider-side lookback windows ending "now".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePeriod {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    YearToDate,
    Max,
}

impl RangePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePeriod::OneDay => "1d",
            RangePeriod::FiveDays => "5d",
            RangePeriod::OneMonth => "1mo",
            RangePeriod::ThreeMonths => "3mo",
            RangePeriod::SixMonths => "6mo",
            RangePeriod::OneYear => "1y",
            RangePeriod::TwoYears => "2y",
            RangePeriod::FiveYears => "5y",
            RangePeriod::YearToDate => "ytd",
            RangePeriod::Max => "max",
        }
    }
}

/// Which slice of history to request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BarsRange {
    /// A lookback resolved by the provider relative to its own clock.
    Period(RangePeriod),
    /// An explicit window: `start` inclusive, `end` exclusive.
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Universal parameters for requesting time-series bar data from a market data provider.
///
/// Validation of the granularity is performed by each provider implementation,
/// according to its own API rules.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// Symbol to request (e.g. `"AAPL"`, `"^GSPC"`).
    pub symbol: String,

    /// The time interval for each bar (e.g., 1 minute, 1 day).
    pub timeframe: TimeFrame,

    /// The requested slice of history.
    pub range: BarsRange,

    /// Include pre- and post-market bars for intraday requests.
    #[serde(default)]
    pub include_pre_post: bool,
}

impl BarsRequestParams {
    pub fn new(symbol: impl Into<String>, timeframe: TimeFrame, range: BarsRange) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            range,
            include_pre_post: false,
        }
    }
}
