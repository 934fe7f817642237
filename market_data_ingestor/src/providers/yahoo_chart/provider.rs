use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use snafu::ResultExt;

use crate::{
    models::{frame::RawFrame, request_params::BarsRequestParams},
    providers::{
        ApiSnafu, BaseUrlSnafu, ClientBuildSnafu, DataProvider, DecodeSnafu, ProviderError,
        ProviderInitError, ReqwestSnafu,
        yahoo_chart::{
            params::construct_params,
            response::{ChartBody, ChartEnvelope},
        },
    },
};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// The chart endpoint rejects requests without a browser-like user agent.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/124.0 Safari/537.36"
);

/// Connection settings for [`YahooChartProvider`].
#[derive(Clone, Debug)]
pub struct YahooChartConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for YahooChartConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct YahooChartProvider {
    client: Client,
    base_url: Url,
}

impl YahooChartProvider {
    /// Creates a provider against the public Yahoo Finance endpoint.
    pub fn new() -> Result<Self, ProviderInitError> {
        Self::with_config(YahooChartConfig::default())
    }

    /// Creates a provider with explicit endpoint, user agent and request timeout.
    pub fn with_config(config: YahooChartConfig) -> Result<Self, ProviderInitError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            BaseUrlSnafu {
                url: config.base_url.clone(),
                message: e.to_string(),
            }
            .build()
        })?;
        if base_url.cannot_be_a_base() {
            return BaseUrlSnafu {
                url: config.base_url,
                message: "not a hierarchical URL",
            }
            .fail();
        }

        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self { client, base_url })
    }

    /// `{base}/v8/finance/chart/{symbol}`, with the symbol as one encoded segment.
    pub fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v8", "finance", "chart", symbol]);
        }
        url
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<RawFrame, ProviderError> {
        // Validate before proceeding.
        let query = construct_params(&params)?;
        let url = self.chart_url(params.symbol.trim());

        tracing::debug!(%url, ?query, "requesting chart");
        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let body = response.text().await.context(ReqwestSnafu)?;

        if !status.is_success() {
            // The error body is usually a chart envelope with a readable description.
            let message = match serde_json::from_str::<ChartEnvelope>(&body) {
                Ok(ChartEnvelope {
                    chart: ChartBody {
                        error: Some(err), ..
                    },
                }) => format!("{}: {}", err.code, err.description),
                Ok(_) => format!("HTTP {status}"),
                Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
                Err(_) => format!("HTTP {status}: {}", body.trim()),
            };
            return ApiSnafu { message }.fail();
        }

        let envelope: ChartEnvelope = serde_json::from_str(&body).context(DecodeSnafu)?;
        envelope.into_result()?.into_frame(&params.timeframe)
    }
}
