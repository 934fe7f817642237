//! Canonical in-memory representation of a bar table.
//!
//! Every stage after normalization works on [`Series`]: fixed field names,
//! one display time zone, ascending unique timestamps.

use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use indexmap::IndexMap;
use market_data_ingestor::models::frame::{RawFrame, RawIndex};
use serde::{Serialize, Serializer};

pub const TIMESTAMP: &str = "Datetime";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";

/// A single OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    /// Start of the bar interval, on the display clock.
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Ordered bars for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub symbol: String,
    pub currency: Option<String>,
    #[serde(serialize_with = "serialize_zone")]
    pub timezone: Tz,
    pub bars: Vec<Bar>,
}

impl Series {
    pub fn empty(symbol: impl Into<String>, timezone: Tz) -> Self {
        Self {
            symbol: symbol.into(),
            currency: None,
            timezone,
            bars: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The last `n` bars (fewer when the series is shorter).
    pub fn tail(&self, n: usize) -> &[Bar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }
}

/// Back to a provider-shaped frame with canonical labels.
impl From<&Series> for RawFrame {
    fn from(series: &Series) -> Self {
        let index = series
            .bars
            .iter()
            .map(|b| b.timestamp.fixed_offset())
            .collect();
        let column = |f: fn(&Bar) -> f64| -> Vec<Option<f64>> {
            series.bars.iter().map(|b| Some(f(b))).collect()
        };

        let mut columns: IndexMap<String, Vec<Option<f64>>> = IndexMap::new();
        columns.insert(OPEN.to_string(), column(|b| b.open));
        columns.insert(HIGH.to_string(), column(|b| b.high));
        columns.insert(LOW.to_string(), column(|b| b.low));
        columns.insert(CLOSE.to_string(), column(|b| b.close));
        columns.insert(VOLUME.to_string(), column(|b| b.volume as f64));

        RawFrame {
            symbol: series.symbol.clone(),
            currency: series.currency.clone(),
            index_label: TIMESTAMP.to_string(),
            index: RawIndex::Zoned(index),
            columns,
        }
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Tz>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Tz>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

fn serialize_zone<S: Serializer>(tz: &Tz, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(tz.name())
}
