use crate::{
    models::{
        request_params::{BarsRange, BarsRequestParams},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Maps a [`TimeFrame`] onto one of the chart API's `interval` values.
///
/// The API accepts 1m 2m 5m 15m 30m 60m 90m 1h 1d 5d 1wk 1mo 3mo.
pub fn interval_param(timeframe: &TimeFrame) -> Result<&'static str, ProviderError> {
    let interval = match (timeframe.unit, timeframe.amount) {
        (TimeFrameUnit::Minute, 1) => "1m",
        (TimeFrameUnit::Minute, 2) => "2m",
        (TimeFrameUnit::Minute, 5) => "5m",
        (TimeFrameUnit::Minute, 15) => "15m",
        (TimeFrameUnit::Minute, 30) => "30m",
        (TimeFrameUnit::Minute, 60) => "60m",
        (TimeFrameUnit::Minute, 90) => "90m",
        (TimeFrameUnit::Hour, 1) => "1h",
        (TimeFrameUnit::Day, 1) => "1d",
        (TimeFrameUnit::Day, 5) => "5d",
        (TimeFrameUnit::Week, 1) => "1wk",
        (TimeFrameUnit::Month, 1) => "1mo",
        (TimeFrameUnit::Month, 3) => "3mo",
        _ => {
            return ValidationSnafu {
                message: format!("unsupported interval {timeframe}"),
            }
            .fail();
        }
    };
    Ok(interval)
}

/// Checks the request before any network I/O happens.
pub fn validate_params(params: &BarsRequestParams) -> Result<(), ProviderError> {
    if params.symbol.trim().is_empty() {
        return ValidationSnafu {
            message: "symbol must not be empty",
        }
        .fail();
    }
    if let BarsRange::Between { start, end } = &params.range {
        if start >= end {
            return ValidationSnafu {
                message: format!("empty window: start {start} is not before end {end}"),
            }
            .fail();
        }
    }
    interval_param(&params.timeframe).map(|_| ())
}

/// Builds the query string for a chart request.
pub fn construct_params(
    params: &BarsRequestParams,
) -> Result<Vec<(String, String)>, ProviderError> {
    validate_params(params)?;

    let mut query = vec![(
        "interval".to_string(),
        interval_param(&params.timeframe)?.to_string(),
    )];
    match &params.range {
        BarsRange::Period(period) => {
            query.push(("range".to_string(), period.as_str().to_string()));
        }
        BarsRange::Between { start, end } => {
            query.push(("period1".to_string(), start.timestamp().to_string()));
            query.push(("period2".to_string(), end.timestamp().to_string()));
        }
    }
    query.push((
        "includePrePost".to_string(),
        params.include_pre_post.to_string(),
    ));
    query.push(("events".to_string(), "div,splits".to_string()));
    Ok(query)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::request_params::RangePeriod;

    fn lookup<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn lookback_request_uses_range() {
        let params = BarsRequestParams::new(
            "AAPL",
            TimeFrame::minutes(1).unwrap(),
            BarsRange::Period(RangePeriod::OneDay),
        );
        let query = construct_params(&params).unwrap();
        assert_eq!(lookup(&query, "interval"), Some("1m"));
        assert_eq!(lookup(&query, "range"), Some("1d"));
        assert_eq!(lookup(&query, "period1"), None);
        assert_eq!(lookup(&query, "includePrePost"), Some("false"));
    }

    #[test]
    fn window_request_uses_unix_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        let params = BarsRequestParams::new(
            "MSFT",
            TimeFrame::minutes(30).unwrap(),
            BarsRange::Between { start, end },
        );
        let query = construct_params(&params).unwrap();
        assert_eq!(lookup(&query, "interval"), Some("30m"));
        assert_eq!(lookup(&query, "period1"), Some("1717372800"));
        assert_eq!(lookup(&query, "period2"), Some("1717977600"));
        assert_eq!(lookup(&query, "range"), None);
    }

    #[test]
    fn unsupported_interval_is_a_validation_error() {
        let params = BarsRequestParams::new(
            "AAPL",
            TimeFrame::minutes(7).unwrap(),
            BarsRange::Period(RangePeriod::OneDay),
        );
        let err = construct_params(&params).unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
        assert!(err.to_string().contains("7m"));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let t = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        let params = BarsRequestParams::new(
            "AAPL",
            TimeFrame::day(),
            BarsRange::Between { start: t, end: t },
        );
        assert!(matches!(
            validate_params(&params),
            Err(ProviderError::Validation { .. })
        ));
    }

    #[test]
    fn blank_symbol_is_rejected() {
        let params = BarsRequestParams::new(
            "  ",
            TimeFrame::day(),
            BarsRange::Period(RangePeriod::OneMonth),
        );
        assert!(validate_params(&params).is_err());
    }
}
