use std::{num::NonZeroUsize, sync::Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use market_data_ingestor::{
    models::{
        frame::RawFrame,
        request_params::{BarsRange, BarsRequestParams},
    },
    providers::{DataProvider, ProviderError, yahoo_chart::response::ChartEnvelope},
};
use serde_json::Value;
use stock_dashboard::{
    indicators::{EmaSeed, IndicatorEngine, IndicatorKind},
    normalize::{NormalizerOptions, normalize},
    refresh::{Dashboard, PipelineOptions, RefreshError, RefreshState},
    report,
    request::{ChartType, DashboardRequest, Period},
};

/// One minute session start, a halted minute, and a provisional last bar repeated.
const INTRADAY: &str = r#"{
    "chart": {
        "result": [{
            "meta": {
                "currency": "USD",
                "symbol": "AAPL",
                "gmtoffset": -14400,
                "exchangeTimezoneName": "America/New_York",
                "dataGranularity": "1m"
            },
            "timestamp": [1717421400, 1717421460, 1717421520, 1717421580, 1717421580],
            "indicators": {
                "quote": [{
                    "open":   [99.5,  null, 100.5, 101.0, 101.0],
                    "high":   [100.5, null, 101.5, 102.5, 103.0],
                    "low":    [99.0,  null, 100.0, 100.5, 100.5],
                    "close":  [100.0, null, 101.0, 102.0, 102.5],
                    "volume": [1000,  null, 1500,  600,   700]
                }]
            }
        }],
        "error": null
    }
}"#;

const CLOSED: &str = r#"{
    "chart": {
        "result": [{
            "meta": {
                "currency": "USD",
                "symbol": "AAPL",
                "gmtoffset": -14400,
                "dataGranularity": "1m"
            },
            "indicators": { "quote": [{}] }
        }],
        "error": null
    }
}"#;

const UNKNOWN: &str = r#"{
    "chart": {
        "result": null,
        "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
    }
}"#;

/// Answers every request with the same recorded response body.
struct RecordedProvider {
    body: &'static str,
    seen: Mutex<Vec<BarsRequestParams>>,
}

impl RecordedProvider {
    fn new(body: &'static str) -> Self {
        Self {
            body,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DataProvider for RecordedProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<RawFrame, ProviderError> {
        let timeframe = params.timeframe;
        self.seen.lock().unwrap().push(params);
        let envelope: ChartEnvelope = serde_json::from_str(self.body).unwrap();
        envelope.into_result()?.into_frame(&timeframe)
    }
}

fn options() -> PipelineOptions {
    PipelineOptions {
        engine: IndicatorEngine::new(NonZeroUsize::new(2).unwrap(), EmaSeed::SimpleMean),
        ..PipelineOptions::default()
    }
}

fn request(period: Period, chart: ChartType) -> DashboardRequest {
    DashboardRequest::new(
        "aapl",
        period,
        chart,
        [IndicatorKind::Sma, IndicatorKind::Ema],
    )
    .unwrap()
}

#[tokio::test]
async fn intraday_refresh_builds_full_view() {
    let mut dash = Dashboard::new(RecordedProvider::new(INTRADAY), options());
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 13, 40, 0).unwrap();

    let view = dash
        .refresh(&request(Period::OneDay, ChartType::Line), now)
        .await
        .unwrap();
    assert_eq!(dash.state(), RefreshState::Idle);

    let closes: Vec<f64> = view.series.closes();
    assert_eq!(closes, [100.0, 101.0, 102.5]);
    assert_eq!(view.series.timezone.name(), "US/Eastern");
    assert_eq!(
        view.series.bars[0].timestamp.to_rfc3339(),
        "2024-06-03T09:30:00-04:00"
    );

    assert_eq!(view.metrics.reference_close, 100.0);
    assert_eq!(view.metrics.change, 2.5);
    assert!((view.metrics.pct_change.unwrap() - 2.5).abs() < 1e-12);
    assert_eq!(view.metrics.high, 103.0);
    assert_eq!(view.metrics.low, 99.0);
    assert_eq!(view.metrics.volume, 3_200);

    assert_eq!(view.indicators[0].values, [None, Some(100.5), Some(101.75)]);
    assert_eq!(view.indicators[1].values[1], view.indicators[0].values[1]);

    let text = report::render_text(&view);
    assert!(text.starts_with("AAPL 1D Chart\n"));
    assert!(text.contains("AAPL Last Price: $102.50 USD  +$2.50 (+2.50%)"));
    assert!(text.contains("Volume: 3,200 shares"));
    assert!(text.contains("Technical Indicators"));
    assert!(text.contains("SMA_2"));
}

#[tokio::test]
async fn json_rendering_carries_figure_and_tables() {
    let mut dash = Dashboard::new(RecordedProvider::new(INTRADAY), options());
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 13, 40, 0).unwrap();
    let view = dash
        .refresh(&request(Period::OneDay, ChartType::Candlestick), now)
        .await
        .unwrap();

    let json: Value = serde_json::from_str(&report::render_json(&view).unwrap()).unwrap();
    assert_eq!(json["figure"]["data"][0]["type"], "candlestick");
    assert_eq!(json["figure"]["data"][1]["name"], "SMA 2");
    assert_eq!(json["figure"]["data"][2]["name"], "EMA 2");
    assert_eq!(json["figure"]["layout"]["yaxis"]["title"]["text"], "Price (USD)");
    assert_eq!(json["summary"]["delta"], "+$2.50 (+2.50%)");
    assert_eq!(json["historical"]["rows"].as_array().unwrap().len(), 3);
    assert_eq!(json["indicators"]["headers"][1], "SMA_2");
}

#[tokio::test]
async fn text_rendering_keeps_indicator_table_without_overlays() {
    let mut dash = Dashboard::new(RecordedProvider::new(INTRADAY), options());
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 13, 40, 0).unwrap();
    let bare = DashboardRequest::new("aapl", Period::OneDay, ChartType::Line, []).unwrap();
    let view = dash.refresh(&bare, now).await.unwrap();
    assert!(view.indicators.is_empty());

    let table = report::indicators_table(&view.series, &view.indicators, 10);
    assert_eq!(table.headers, ["Datetime"]);
    assert_eq!(table.rows.len(), 3);

    let text = report::render_text(&view);
    assert!(text.contains("\nTechnical Indicators\n"));

    let json: Value = serde_json::from_str(&report::render_json(&view).unwrap()).unwrap();
    assert_eq!(json["indicators"]["headers"], serde_json::json!(["Datetime"]));
}

#[tokio::test]
async fn week_requests_an_explicit_window() {
    let mut dash = Dashboard::new(RecordedProvider::new(INTRADAY), options());
    let now = Utc.with_ymd_and_hms(2024, 6, 7, 20, 0, 0).unwrap();
    dash.refresh(&request(Period::OneWeek, ChartType::Line), now)
        .await
        .unwrap();
    dash.refresh(&request(Period::OneYear, ChartType::Line), now)
        .await
        .unwrap();

    let seen = dash.provider().seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].symbol, "AAPL");
    assert_eq!(seen[0].timeframe.to_string(), "30m");
    assert_eq!(
        seen[0].range,
        BarsRange::Between {
            start: now - Duration::days(7),
            end: now,
        }
    );
    assert_eq!(seen[1].timeframe.to_string(), "1wk");
    assert!(matches!(seen[1].range, BarsRange::Period(_)));
}

#[tokio::test]
async fn closed_market_is_empty_not_failure() {
    let mut dash = Dashboard::new(RecordedProvider::new(CLOSED), options());
    let err = dash
        .refresh(&request(Period::OneDay, ChartType::Line), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RefreshError::EmptyResult { ref ticker, period: Period::OneDay } if ticker == "AAPL"
    ));
    assert_eq!(dash.state(), RefreshState::Idle);
    assert!(report::render_no_data("AAPL", Period::OneDay).contains("No data for AAPL"));
}

#[tokio::test]
async fn unknown_symbol_is_a_fetch_error() {
    let mut dash = Dashboard::new(RecordedProvider::new(UNKNOWN), options());
    let err = dash
        .refresh(&request(Period::OneMonth, ChartType::Line), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, RefreshError::Fetch { source: ProviderError::Api { .. }, .. }));
    assert!(!err.is_empty_result());
    assert_eq!(dash.state(), RefreshState::Idle);
}

#[tokio::test]
async fn canonical_series_normalizes_to_itself() {
    let mut dash = Dashboard::new(RecordedProvider::new(INTRADAY), options());
    let view = dash
        .refresh(&request(Period::OneDay, ChartType::Line), Utc::now())
        .await
        .unwrap();

    let again = normalize(&RawFrame::from(&view.series), &NormalizerOptions::default()).unwrap();
    assert_eq!(again, view.series);
}
