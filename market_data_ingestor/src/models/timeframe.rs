//! Bar granularity (amount × unit).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// The time-bucket size of each bar, e.g. 30 minutes or 1 week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub fn new(amount: u32, unit: TimeFrameUnit) -> Result<Self, TimeFrameError> {
        if amount == 0 {
            return Err(TimeFrameError::InvalidAmount {
                unit,
                message: "amount must be at least 1".into(),
            });
        }
        Ok(Self { amount, unit })
    }

    pub fn minutes(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Minute)
    }

    pub fn hours(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Hour)
    }

    pub fn months(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Month)
    }

    pub const fn day() -> Self {
        Self {
            amount: 1,
            unit: TimeFrameUnit::Day,
        }
    }

    pub const fn week() -> Self {
        Self {
            amount: 1,
            unit: TimeFrameUnit::Week,
        }
    }

    /// Bars finer than one day carry a time-of-day component.
    pub fn is_intraday(&self) -> bool {
        matches!(self.unit, TimeFrameUnit::Minute | TimeFrameUnit::Hour)
    }
}

/// Compact interval notation: `1m`, `30m`, `1h`, `1d`, `1wk`, `1mo`.
impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeFrameUnit::Minute => "m",
            TimeFrameUnit::Hour => "h",
            TimeFrameUnit::Day => "d",
            TimeFrameUnit::Week => "wk",
            TimeFrameUnit::Month => "mo",
        };
        write!(f, "{}{}", self.amount, unit)
    }
}
