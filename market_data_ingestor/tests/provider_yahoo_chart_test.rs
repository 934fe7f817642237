use chrono::{Duration, Utc};
use market_data_ingestor::{
    models::{
        frame::RawIndex,
        request_params::{BarsRange, BarsRequestParams, RangePeriod},
        timeframe::TimeFrame,
    },
    providers::{DataProvider, ProviderError, yahoo_chart::YahooChartProvider},
};
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore]
async fn test_yahoo_provider_fetch_daily_bars() {
    let provider = YahooChartProvider::new().expect("Failed to create YahooChartProvider");

    let params = BarsRequestParams::new(
        "AAPL",
        TimeFrame::day(),
        BarsRange::Period(RangePeriod::OneMonth),
    );

    let result = provider.fetch_bars(params).await;
    assert!(result.is_ok(), "fetch_bars returned an error: {:?}", result.err());

    let frame = result.unwrap();
    assert_eq!(frame.symbol, "AAPL");
    assert_eq!(frame.index_label, "Date");
    assert!(!frame.is_empty(), "Expected at least one bar for AAPL");
    assert!(frame.column("Close").is_some());

    // Bars come back oldest first.
    if let RawIndex::Zoned(ts) = &frame.index {
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
    }
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_yahoo_provider_fetch_window() {
    let provider = YahooChartProvider::new().expect("Failed to create YahooChartProvider");

    let end = Utc::now();
    let params = BarsRequestParams::new(
        "MSFT",
        TimeFrame::minutes(30).unwrap(),
        BarsRange::Between {
            start: end - Duration::days(7),
            end,
        },
    );

    let frame = provider.fetch_bars(params).await.expect("window request");
    assert_eq!(frame.index_label, "Datetime");
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_yahoo_provider_unknown_symbol() {
    let provider = YahooChartProvider::new().expect("Failed to create YahooChartProvider");

    let params = BarsRequestParams::new(
        "THIS-IS-NOT-A-TICKER-1234",
        TimeFrame::day(),
        BarsRange::Period(RangePeriod::OneMonth),
    );

    let err = provider.fetch_bars(params).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn test_yahoo_provider_rejects_unsupported_interval_offline() {
    // Validation happens before any request is sent, so this needs no network.
    let provider = YahooChartProvider::new().expect("Failed to create YahooChartProvider");

    let params = BarsRequestParams::new(
        "AAPL",
        TimeFrame::hours(4).unwrap(),
        BarsRange::Period(RangePeriod::OneMonth),
    );

    let err = provider.fetch_bars(params).await.unwrap_err();
    assert!(matches!(err, ProviderError::Validation { .. }));
}
