//! Summary statistics over a canonical series.

use serde::Serialize;
use thiserror::Error;

use crate::series::Series;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("cannot compute metrics over an empty series")]
    EmptyInput,
}

/// Snapshot of one refresh.
///
/// `reference_close` is the first close inside the requested window, not the
/// prior session's close, so `change` spans the window itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub last_close: f64,
    pub reference_close: f64,
    pub change: f64,
    /// `None` when `reference_close` is zero.
    pub pct_change: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
}

pub fn calculate(series: &Series) -> Result<Metrics, MetricsError> {
    let (first, last) = match (series.bars.first(), series.bars.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(MetricsError::EmptyInput),
    };

    let last_close = last.close;
    let reference_close = first.close;
    let change = last_close - reference_close;
    let pct_change = if reference_close == 0.0 {
        tracing::warn!(
            symbol = %series.symbol,
            "reference close is zero; percent change undefined"
        );
        None
    } else {
        Some(change / reference_close * 100.0)
    };

    let high = series
        .bars
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let low = series
        .bars
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);
    let volume = series
        .bars
        .iter()
        .fold(0u64, |acc, b| acc.saturating_add(b.volume));

    Ok(Metrics {
        last_close,
        reference_close,
        change,
        pct_change,
        high,
        low,
        volume,
    })
}
