//! Wire schema of the chart endpoint and its conversion into a [`RawFrame`].

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    models::{
        frame::{RawFrame, RawIndex},
        timeframe::TimeFrame,
    },
    providers::{ApiSnafu, InternalSnafu, ProviderError},
};

#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Deserialize, Debug)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Absent when the window holds no bars.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: ChartIndicators,
}

#[derive(Deserialize, Debug)]
pub struct ChartMeta {
    pub symbol: String,
    pub currency: Option<String>,
    /// Seconds east of UTC for the exchange.
    #[serde(rename = "gmtoffset", default)]
    pub gmt_offset: i32,
    #[serde(rename = "exchangeTimezoneName")]
    pub exchange_timezone_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartEnvelope {
    /// Extracts the single result, turning the envelope's error object into an API error.
    pub fn into_result(self) -> Result<ChartResult, ProviderError> {
        if let Some(err) = self.chart.error {
            return ApiSnafu {
                message: format!("{}: {}", err.code, err.description),
            }
            .fail();
        }
        match self.chart.result.and_then(|r| r.into_iter().next()) {
            Some(result) => Ok(result),
            None => ApiSnafu {
                message: "chart response carried no result",
            }
            .fail(),
        }
    }
}

impl ChartResult {
    /// Converts the columnar response into a provider-native frame.
    ///
    /// The index is labelled `Datetime` for intraday `requested` intervals and
    /// `Date` otherwise.
    pub fn into_frame(self, requested: &TimeFrame) -> Result<RawFrame, ProviderError> {
        let index_label = if requested.is_intraday() {
            "Datetime"
        } else {
            "Date"
        };

        if self.timestamp.is_empty() {
            let mut frame = RawFrame::empty(self.meta.symbol, index_label);
            frame.currency = self.meta.currency;
            return Ok(frame);
        }

        let offset = FixedOffset::east_opt(self.meta.gmt_offset).ok_or_else(|| {
            InternalSnafu {
                message: format!("gmtoffset {} out of range", self.meta.gmt_offset),
            }
            .build()
        })?;

        let index = self
            .timestamp
            .iter()
            .map(|&ts| {
                DateTime::from_timestamp(ts, 0)
                    .map(|dt| dt.with_timezone(&offset))
                    .ok_or_else(|| {
                        InternalSnafu {
                            message: format!("timestamp {ts} out of range"),
                        }
                        .build()
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = index.len();
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        let adjclose = self
            .indicators
            .adjclose
            .into_iter()
            .next()
            .map(|a| a.adjclose);

        let mut columns: IndexMap<String, Vec<Option<f64>>> = IndexMap::new();
        for (label, values) in [
            ("Open", quote.open),
            ("High", quote.high),
            ("Low", quote.low),
            ("Close", quote.close),
        ] {
            columns.insert(label.to_string(), fit_column(label, values, rows)?);
        }
        if let Some(values) = adjclose {
            columns.insert("Adj Close".to_string(), fit_column("Adj Close", values, rows)?);
        }
        columns.insert("Volume".to_string(), fit_column("Volume", quote.volume, rows)?);

        tracing::debug!(
            symbol = %self.meta.symbol,
            rows,
            timezone = self.meta.exchange_timezone_name.as_deref().unwrap_or("unknown"),
            "decoded chart response"
        );

        Ok(RawFrame {
            symbol: self.meta.symbol,
            currency: self.meta.currency,
            index_label: index_label.to_string(),
            index: RawIndex::Zoned(index),
            columns,
        })
    }
}

/// An omitted array means "no data" for every row; a present one must match the index.
fn fit_column(
    label: &str,
    values: Vec<Option<f64>>,
    rows: usize,
) -> Result<Vec<Option<f64>>, ProviderError> {
    if values.is_empty() {
        return Ok(vec![None; rows]);
    }
    if values.len() != rows {
        return InternalSnafu {
            message: format!(
                "column {label} has {} values for {rows} timestamps",
                values.len()
            ),
        }
        .fail();
    }
    Ok(values)
}
