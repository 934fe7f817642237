//! Time zone helpers for placing provider timestamps on the display clock.
//!
//! - [`parse_zone`]: IANA name (or legacy alias such as `"US/Eastern"`) to [`Tz`].
//! - [`localize`]: attach a zone to a naive wall-clock timestamp and get the instant,
//!   resolving DST gaps and overlaps through a [`DstPolicy`].
//!
//! Ambiguous local times happen during "fall back" when a wall time occurs twice.
//! Nonexistent local times happen during "spring forward" when a wall time is skipped.
//! A naive baseline of UTC never hits either case.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TzError {
    #[error("unknown time zone {0:?}")]
    UnknownZone(String),

    #[error("local time {naive} is ambiguous in {zone}")]
    Ambiguous { naive: NaiveDateTime, zone: Tz },

    #[error("local time {naive} does not exist in {zone}")]
    Nonexistent { naive: NaiveDateTime, zone: Tz },
}

/// Policy for handling DST edge cases when localizing naive timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Error on ambiguous (fall-back) or nonexistent (spring-forward) local times.
    Strict,
    /// For ambiguous local times, pick the earlier instant.
    #[default]
    PreferEarliest,
    /// For ambiguous local times, pick the later instant.
    PreferLatest,
    /// For nonexistent local times, step forward a minute at a time (at most 2 hours)
    /// until a valid instant is found. Ambiguous times resolve to the earlier instant.
    ShiftForward,
}

/// Parses a zone name such as `"America/New_York"`, `"US/Eastern"` or `"UTC"`.
pub fn parse_zone(name: &str) -> Result<Tz, TzError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TzError::UnknownZone(name.to_string()))
}

/// Interprets `naive` as wall-clock time in `zone` and returns the instant.
pub fn localize(
    naive: NaiveDateTime,
    zone: Tz,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TzError> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(a, b) => match policy {
            DstPolicy::PreferEarliest | DstPolicy::ShiftForward => Ok(a.with_timezone(&Utc)),
            DstPolicy::PreferLatest => Ok(b.with_timezone(&Utc)),
            DstPolicy::Strict => Err(TzError::Ambiguous { naive, zone }),
        },
        LocalResult::None => {
            if policy == DstPolicy::ShiftForward {
                let mut t = naive;
                for _ in 0..120 {
                    t += Duration::minutes(1);
                    if let LocalResult::Single(dt) = zone.from_local_datetime(&t) {
                        return Ok(dt.with_timezone(&Utc));
                    }
                }
            }
            Err(TzError::Nonexistent { naive, zone })
        }
    }
}
