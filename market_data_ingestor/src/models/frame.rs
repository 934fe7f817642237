//! Provider-native representation of a bar table.
//!
//! A [`RawFrame`] mirrors what a vendor hands back before any cleanup: column
//! labels are whatever the vendor calls them, cells may be missing, and the
//! index may or may not carry a UTC offset. Turning it into a canonical series
//! is the consumer's job.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use indexmap::IndexMap;

/// Row index of a [`RawFrame`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawIndex {
    /// Wall-clock timestamps with no zone information.
    Naive(Vec<NaiveDateTime>),
    /// Timestamps carrying a UTC offset.
    Zoned(Vec<DateTime<FixedOffset>>),
}

impl RawIndex {
    pub fn len(&self) -> usize {
        match self {
            RawIndex::Naive(v) => v.len(),
            RawIndex::Zoned(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A column-labelled table of bars for one symbol, as delivered by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// The symbol this data represents (e.g., "AAPL").
    pub symbol: String,
    /// Quote currency reported by the provider, if any.
    pub currency: Option<String>,
    /// Name of the index column (`"Date"`, `"Datetime"`, ...).
    pub index_label: String,
    pub index: RawIndex,
    /// Provider-labelled columns; every column has one cell per index entry.
    pub columns: IndexMap<String, Vec<Option<f64>>>,
}

impl RawFrame {
    /// An empty frame for a valid request that produced no rows.
    pub fn empty(symbol: impl Into<String>, index_label: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            currency: None,
            index_label: index_label.into(),
            index: RawIndex::Zoned(Vec::new()),
            columns: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Looks a column up by exact label.
    pub fn column(&self, label: &str) -> Option<&[Option<f64>]> {
        self.columns.get(label).map(Vec::as_slice)
    }
}
