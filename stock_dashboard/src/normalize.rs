//! Provider frame to canonical [`Series`].
//!
//! - Timestamps end up on one reference clock (`US/Eastern` unless configured).
//!   A naive index is first read as wall time in the baseline zone (UTC by default).
//! - Columns are found by case-insensitive label, so `Close`, `close` and `c` all work.
//! - Rows with a missing or non-finite price are dropped; a missing volume reads as zero.
//! - A repeated timestamp keeps the later row; a timestamp going backwards is an error.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use market_data_ingestor::models::frame::{RawFrame, RawIndex};
use thiserror::Error;

use crate::{
    series::{Bar, Series},
    tz::{self, DstPolicy, TzError},
};

const OPEN_ALIASES: &[&str] = &["open", "o"];
const HIGH_ALIASES: &[&str] = &["high", "h"];
const LOW_ALIASES: &[&str] = &["low", "l"];
const CLOSE_ALIASES: &[&str] = &["close", "c"];
const VOLUME_ALIASES: &[&str] = &["volume", "v", "vol"];

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("frame for {symbol} has no {field} column")]
    MissingColumn { symbol: String, field: &'static str },

    #[error("column {label:?} has {len} cells for {rows} rows")]
    LengthMismatch {
        label: String,
        len: usize,
        rows: usize,
    },

    #[error("row {row} ({at}) is earlier than the row before it")]
    Unordered { row: usize, at: DateTime<Utc> },

    #[error(transparent)]
    Tz(#[from] TzError),
}

/// Where timestamps end up, and how naive ones are read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizerOptions {
    /// Display clock for the canonical series.
    pub reference: Tz,
    /// Zone assumed for a timezone-naive index.
    pub naive_baseline: Tz,
    pub dst_policy: DstPolicy,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            reference: chrono_tz::US::Eastern,
            naive_baseline: Tz::UTC,
            dst_policy: DstPolicy::default(),
        }
    }
}

fn find_column<'a>(
    frame: &'a RawFrame,
    aliases: &[&str],
) -> Option<(&'a str, &'a [Option<f64>])> {
    aliases.iter().find_map(|alias| {
        frame
            .columns
            .iter()
            .find(|(label, _)| label.trim().eq_ignore_ascii_case(alias))
            .map(|(label, cells)| (label.as_str(), cells.as_slice()))
    })
}

fn required_column<'a>(
    frame: &'a RawFrame,
    aliases: &[&str],
    field: &'static str,
) -> Result<&'a [Option<f64>], NormalizeError> {
    let (label, cells) =
        find_column(frame, aliases).ok_or_else(|| NormalizeError::MissingColumn {
            symbol: frame.symbol.clone(),
            field,
        })?;
    check_len(label, cells, frame.len())?;
    Ok(cells)
}

fn check_len(label: &str, cells: &[Option<f64>], rows: usize) -> Result<(), NormalizeError> {
    if cells.len() != rows {
        return Err(NormalizeError::LengthMismatch {
            label: label.to_string(),
            len: cells.len(),
            rows,
        });
    }
    Ok(())
}

fn instants(index: &RawIndex, options: &NormalizerOptions) -> Result<Vec<DateTime<Utc>>, TzError> {
    match index {
        RawIndex::Naive(ts) => ts
            .iter()
            .map(|naive| tz::localize(*naive, options.naive_baseline, options.dst_policy))
            .collect(),
        RawIndex::Zoned(ts) => Ok(ts.iter().map(|dt| dt.with_timezone(&Utc)).collect()),
    }
}

fn finite(cell: Option<f64>) -> Option<f64> {
    cell.filter(|v| v.is_finite())
}

/// Normalizes a provider frame into a canonical series.
///
/// An empty frame yields an empty series; callers decide what "no data" means.
pub fn normalize(frame: &RawFrame, options: &NormalizerOptions) -> Result<Series, NormalizeError> {
    let mut series = Series::empty(frame.symbol.clone(), options.reference);
    series.currency = frame.currency.clone();
    if frame.is_empty() {
        return Ok(series);
    }

    let rows = frame.len();
    let open = required_column(frame, OPEN_ALIASES, "open")?;
    let high = required_column(frame, HIGH_ALIASES, "high")?;
    let low = required_column(frame, LOW_ALIASES, "low")?;
    let close = required_column(frame, CLOSE_ALIASES, "close")?;
    let volume = match find_column(frame, VOLUME_ALIASES) {
        Some((label, cells)) => {
            check_len(label, cells, rows)?;
            Some(cells)
        }
        None => None,
    };

    let instants = instants(&frame.index, options)?;
    let mut dropped = 0usize;
    let mut collapsed = 0usize;
    series.bars.reserve(rows);

    for (row, at) in instants.into_iter().enumerate() {
        let (Some(o), Some(h), Some(l), Some(c)) = (
            finite(open[row]),
            finite(high[row]),
            finite(low[row]),
            finite(close[row]),
        ) else {
            dropped += 1;
            continue;
        };
        let v = volume
            .and_then(|cells| finite(cells[row]))
            .map(|v| v.max(0.0).round() as u64)
            .unwrap_or(0);

        if let Some(prev) = series.bars.last() {
            let prev_at = prev.timestamp.with_timezone(&Utc);
            if at < prev_at {
                return Err(NormalizeError::Unordered { row, at });
            }
            if at == prev_at {
                series.bars.pop();
                collapsed += 1;
            }
        }

        series.bars.push(Bar {
            timestamp: at.with_timezone(&options.reference),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
        });
    }

    if dropped > 0 {
        tracing::warn!(symbol = %frame.symbol, dropped, "dropped rows with missing prices");
    }
    if collapsed > 0 {
        tracing::debug!(symbol = %frame.symbol, collapsed, "collapsed repeated timestamps");
    }
    tracing::debug!(
        symbol = %frame.symbol,
        rows = series.len(),
        reference = %options.reference,
        "normalized frame"
    );
    Ok(series)
}
