//! One refresh: fetch, normalize, compute, build the figure.
//!
//! Either a complete [`DashboardView`] comes back or a single [`RefreshError`];
//! nothing partial is ever handed to the renderer.

use chrono::{DateTime, Utc};
use market_data_ingestor::providers::{DataProvider, ProviderError};
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::{
    chart::{self, Figure},
    indicators::{IndicatorEngine, IndicatorSeries},
    metrics::{self, Metrics},
    normalize::{self, NormalizeError, NormalizerOptions},
    request::{DashboardRequest, Period},
    series::Series,
};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to fetch {ticker}: {source}")]
    Fetch {
        ticker: String,
        #[source]
        source: ProviderError,
    },

    #[error("unusable data for {ticker}: {source}")]
    Normalize {
        ticker: String,
        #[source]
        source: NormalizeError,
    },

    #[error("no data for {ticker} over {period}")]
    EmptyResult { ticker: String, period: Period },
}

impl RefreshError {
    /// A valid request that matched no bars, as opposed to a failure.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, RefreshError::EmptyResult { .. })
    }
}

/// Settings shared by every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub normalizer: NormalizerOptions,
    pub engine: IndicatorEngine,
    pub table_rows: usize,
    pub default_currency: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            normalizer: NormalizerOptions::default(),
            engine: IndicatorEngine::default(),
            table_rows: 10,
            default_currency: "USD".to_string(),
        }
    }
}

/// `refresh` borrows the dashboard mutably, so [`Dashboard::state`] only ever reads
/// `Idle`. Transitions are reported to the observer set with
/// [`Dashboard::with_state_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Everything the presentation layer needs for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub request: DashboardRequest,
    pub currency: String,
    pub series: Series,
    pub metrics: Metrics,
    pub indicators: Vec<IndicatorSeries>,
    pub figure: Figure,
    #[serde(skip)]
    pub table_rows: usize,
}

type StateObserver = Box<dyn Fn(RefreshState) + Send + Sync>;

/// Resets the state on every exit path, including a dropped future.
struct Refreshing<'a> {
    state: &'a mut RefreshState,
    observer: Option<&'a StateObserver>,
}

impl<'a> Refreshing<'a> {
    fn enter(state: &'a mut RefreshState, observer: Option<&'a StateObserver>) -> Self {
        let mut guard = Self { state, observer };
        guard.set(RefreshState::Refreshing);
        guard
    }

    fn set(&mut self, next: RefreshState) {
        *self.state = next;
        if let Some(observe) = self.observer {
            observe(next);
        }
    }
}

impl Drop for Refreshing<'_> {
    fn drop(&mut self) {
        self.set(RefreshState::Idle);
    }
}

pub struct Dashboard<P> {
    provider: P,
    options: PipelineOptions,
    state: RefreshState,
    observer: Option<StateObserver>,
}

impl<P> Dashboard<P>
where
    P: DataProvider + Send + Sync,
{
    pub fn new(provider: P, options: PipelineOptions) -> Self {
        Self {
            provider,
            options,
            state: RefreshState::Idle,
            observer: None,
        }
    }

    /// Calls `observe` on every state transition.
    pub fn with_state_observer(
        mut self,
        observe: impl Fn(RefreshState) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observe));
        self
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs the whole pipeline for `request`, with `now` anchoring date windows.
    ///
    /// Taking `&mut self` means a second refresh cannot start while one is running.
    pub async fn refresh(
        &mut self,
        request: &DashboardRequest,
        now: DateTime<Utc>,
    ) -> Result<DashboardView, RefreshError> {
        let _state = Refreshing::enter(&mut self.state, self.observer.as_ref());
        tracing::info!(
            ticker = request.ticker(),
            period = %request.period,
            chart = %request.chart_type,
            "refresh started"
        );

        let span = tracing::info_span!("refresh", ticker = request.ticker());
        let result = run_pipeline(&self.provider, &self.options, request, now)
            .instrument(span)
            .await;
        match &result {
            Ok(view) => tracing::info!(
                ticker = request.ticker(),
                bars = view.series.len(),
                "refresh finished"
            ),
            Err(e) if e.is_empty_result() => {
                tracing::info!(ticker = request.ticker(), "refresh found no data")
            }
            Err(e) => tracing::warn!(ticker = request.ticker(), error = %e, "refresh failed"),
        }
        result
    }
}

async fn run_pipeline<P>(
    provider: &P,
    options: &PipelineOptions,
    request: &DashboardRequest,
    now: DateTime<Utc>,
) -> Result<DashboardView, RefreshError>
where
    P: DataProvider + Send + Sync,
{
    let ticker = request.ticker().to_string();
    let params = request.to_params(now);
    tracing::debug!(
        symbol = %params.symbol,
        interval = %params.timeframe,
        range = ?params.range,
        "fetching bars"
    );

    let frame = match provider.fetch_bars(params).await {
        Ok(frame) => frame,
        Err(source) => return Err(RefreshError::Fetch { ticker, source }),
    };
    tracing::debug!(rows = frame.len(), "fetched frame");

    let series = match normalize::normalize(&frame, &options.normalizer) {
        Ok(series) => series,
        Err(source) => return Err(RefreshError::Normalize { ticker, source }),
    };
    if series.is_empty() {
        return Err(RefreshError::EmptyResult {
            ticker,
            period: request.period,
        });
    }

    let metrics = metrics::calculate(&series).map_err(|_| RefreshError::EmptyResult {
        ticker: ticker.clone(),
        period: request.period,
    })?;
    let indicators: Vec<IndicatorSeries> = request
        .indicators()
        .iter()
        .map(|kind| options.engine.compute(&series, *kind))
        .collect();

    let currency = series
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(&options.default_currency)
        .to_ascii_uppercase();
    let figure = chart::build_figure(request, &series, &indicators, &currency);

    Ok(DashboardView {
        request: request.clone(),
        currency,
        series,
        metrics,
        indicators,
        figure,
        table_rows: options.table_rows,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use indexmap::IndexMap;
    use market_data_ingestor::{
        models::{
            frame::{RawFrame, RawIndex},
            request_params::BarsRequestParams,
        },
        providers::ApiSnafu,
    };

    use super::*;
    use crate::{indicators::IndicatorKind, request::ChartType};

    struct FixedProvider {
        frame: RawFrame,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DataProvider for FixedProvider {
        async fn fetch_bars(&self, params: BarsRequestParams) -> Result<RawFrame, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if params.symbol == "NOPE" {
                return ApiSnafu {
                    message: "No data found, symbol may be delisted",
                }
                .fail();
            }
            Ok(self.frame.clone())
        }
    }

    fn frame(closes: &[f64]) -> RawFrame {
        let utc = FixedOffset::east_opt(0).unwrap();
        let start = utc.with_ymd_and_hms(2024, 6, 3, 13, 30, 0).unwrap();
        let mut columns = IndexMap::new();
        let cells: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
        for label in ["Open", "High", "Low", "Close"] {
            columns.insert(label.to_string(), cells.clone());
        }
        columns.insert("Volume".to_string(), vec![Some(100.0); closes.len()]);
        RawFrame {
            symbol: "AAPL".into(),
            currency: None,
            index_label: "Datetime".into(),
            index: RawIndex::Zoned(
                (0..closes.len())
                    .map(|i| start + chrono::Duration::minutes(i as i64))
                    .collect(),
            ),
            columns,
        }
    }

    fn dashboard(closes: &[f64]) -> (Dashboard<FixedProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = FixedProvider {
            frame: frame(closes),
            calls: calls.clone(),
        };
        (Dashboard::new(provider, PipelineOptions::default()), calls)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 20, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn full_view_on_success() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let (mut dash, calls) = dashboard(&closes);
        let req = DashboardRequest::new(
            "aapl",
            Period::OneDay,
            ChartType::Line,
            [IndicatorKind::Sma, IndicatorKind::Ema],
        )
        .unwrap();

        let view = dash.refresh(&req, now()).await.unwrap();
        assert_eq!(dash.state(), RefreshState::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(view.series.len(), 25);
        assert_eq!(view.currency, "USD");
        assert_eq!(view.metrics.change, 24.0);
        assert_eq!(view.indicators.len(), 2);
        assert_eq!(view.indicators[0].values[19], Some(109.5));
        assert_eq!(view.indicators[1].values[19], view.indicators[0].values[19]);
        assert_eq!(view.figure.data.len(), 3);
    }

    #[tokio::test]
    async fn empty_frame_is_empty_result() {
        let (mut dash, _) = dashboard(&[]);
        let req = DashboardRequest::new("AAPL", Period::OneDay, ChartType::Line, []).unwrap();
        let err = dash.refresh(&req, now()).await.unwrap_err();
        assert!(err.is_empty_result());
        assert_eq!(dash.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn provider_failure_is_fetch_error() {
        let (mut dash, _) = dashboard(&[1.0]);
        let req = DashboardRequest::new("nope", Period::OneMonth, ChartType::Line, []).unwrap();
        let err = dash.refresh(&req, now()).await.unwrap_err();
        assert!(matches!(err, RefreshError::Fetch { ref ticker, .. } if ticker == "NOPE"));
        assert_eq!(dash.state(), RefreshState::Idle);
    }

    struct StalledProvider;

    #[async_trait]
    impl DataProvider for StalledProvider {
        async fn fetch_bars(&self, _: BarsRequestParams) -> Result<RawFrame, ProviderError> {
            std::future::pending().await
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<RefreshState>>>, impl Fn(RefreshState) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |state| sink.lock().unwrap().push(state))
    }

    #[tokio::test]
    async fn observer_sees_refreshing_then_idle() {
        let (seen, observe) = recorder();
        let (dash, _) = dashboard(&[1.0, 2.0]);
        let mut dash = dash.with_state_observer(observe);
        let req = DashboardRequest::new("AAPL", Period::OneDay, ChartType::Line, []).unwrap();

        dash.refresh(&req, now()).await.unwrap();
        dash.refresh(&req, now()).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            [
                RefreshState::Refreshing,
                RefreshState::Idle,
                RefreshState::Refreshing,
                RefreshState::Idle
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_refresh_returns_to_idle() {
        let (seen, observe) = recorder();
        let mut dash = Dashboard::new(StalledProvider, PipelineOptions::default())
            .with_state_observer(observe);
        let req = DashboardRequest::new("AAPL", Period::OneDay, ChartType::Line, []).unwrap();

        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(20), dash.refresh(&req, now()))
                .await;
        assert!(outcome.is_err());
        assert_eq!(dash.state(), RefreshState::Idle);
        assert_eq!(
            *seen.lock().unwrap(),
            [RefreshState::Refreshing, RefreshState::Idle]
        );
    }

    #[tokio::test]
    async fn short_series_still_renders() {
        let (mut dash, _) = dashboard(&[10.0, 11.0, 12.0]);
        let req =
            DashboardRequest::new("AAPL", Period::OneDay, ChartType::Line, [IndicatorKind::Sma])
                .unwrap();
        let view = dash.refresh(&req, now()).await.unwrap();
        assert!(view.indicators[0].values.iter().all(Option::is_none));
        assert_eq!(view.metrics.last_close, 12.0);
    }
}
