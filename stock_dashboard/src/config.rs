//! Dashboard configuration: TOML file, environment overrides, validation.
//!
//! Every field has a default, so running without a file is the common case.
//!
//! ```toml
//! [provider]
//! base_url = "https://query1.finance.yahoo.com"
//! timeout_secs = 30
//!
//! [display]
//! timezone = "US/Eastern"
//! naive_timezone = "UTC"
//! table_rows = 10
//! default_currency = "USD"
//!
//! [indicators]
//! window = 20
//! ema_seed = "simple_mean"
//! ```
//!
//! Entrypoints: [`load_config_str`], [`load_config_path`], and [`DashboardConfig::load`]
//! which also applies `STOCK_DASHBOARD_*` environment overrides.

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use market_data_ingestor::providers::yahoo_chart::{
    YahooChartConfig,
    provider::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT},
};
use serde::{Deserialize, Serialize};
use shared_utils::env::{InvalidEnvVarError, optional_env_var, parse_env_var};
use thiserror::Error;

use crate::{
    indicators::{DEFAULT_WINDOW, EmaSeed, IndicatorEngine},
    normalize::NormalizerOptions,
    refresh::PipelineOptions,
    tz::{self, DstPolicy, TzError},
};

pub const ENV_BASE_URL: &str = "STOCK_DASHBOARD_BASE_URL";
pub const ENV_USER_AGENT: &str = "STOCK_DASHBOARD_USER_AGENT";
pub const ENV_TIMEOUT_SECS: &str = "STOCK_DASHBOARD_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Env(#[from] InvalidEnvVarError),

    #[error(transparent)]
    Tz(#[from] TzError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DashboardConfig {
    pub provider: ProviderSection,
    pub display: DisplaySection,
    pub indicators: IndicatorSection,
}

/// Market data endpoint settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderSection {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DisplaySection {
    /// IANA zone every timestamp is shown in.
    pub timezone: String,
    /// Zone assumed for timestamps that arrive without one.
    pub naive_timezone: String,
    pub dst_policy: DstPolicy,
    /// Rows in each of the two tail tables.
    pub table_rows: usize,
    /// Used when the provider does not report a currency.
    pub default_currency: String,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            timezone: "US/Eastern".to_string(),
            naive_timezone: "UTC".to_string(),
            dst_policy: DstPolicy::default(),
            table_rows: 10,
            default_currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct IndicatorSection {
    pub window: usize,
    pub ema_seed: EmaSeed,
}

impl Default for IndicatorSection {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW.get(),
            ema_seed: EmaSeed::default(),
        }
    }
}

impl DashboardConfig {
    /// Reads `path` when given (defaults otherwise), applies environment overrides,
    /// then validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => read_path(path)?,
            None => DashboardConfig::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces provider settings with any non-blank `STOCK_DASHBOARD_*` variables.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = optional_env_var(ENV_BASE_URL) {
            tracing::debug!(base_url = %url, "base URL overridden from environment");
            self.provider.base_url = url;
        }
        if let Some(agent) = optional_env_var(ENV_USER_AGENT) {
            self.provider.user_agent = agent;
        }
        if let Some(secs) = parse_env_var::<u64>(ENV_TIMEOUT_SECS)? {
            self.provider.timeout_secs = secs;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url must not be empty".into()));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be at least 1".into()));
        }
        if self.display.table_rows == 0 {
            return Err(ConfigError::Invalid("display.table_rows must be at least 1".into()));
        }
        if self.display.default_currency.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "display.default_currency must not be empty".into(),
            ));
        }
        self.pipeline_options().map(|_| ())
    }

    pub fn provider_config(&self) -> YahooChartConfig {
        YahooChartConfig {
            base_url: self.provider.base_url.clone(),
            user_agent: self.provider.user_agent.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
        }
    }

    /// Resolves zone names and the indicator window into pipeline settings.
    pub fn pipeline_options(&self) -> Result<PipelineOptions, ConfigError> {
        let window = NonZeroUsize::new(self.indicators.window)
            .ok_or_else(|| ConfigError::Invalid("indicators.window must be at least 1".into()))?;
        Ok(PipelineOptions {
            normalizer: NormalizerOptions {
                reference: tz::parse_zone(&self.display.timezone)?,
                naive_baseline: tz::parse_zone(&self.display.naive_timezone)?,
                dst_policy: self.display.dst_policy,
            },
            engine: IndicatorEngine::new(window, self.indicators.ema_seed),
            table_rows: self.display.table_rows,
            default_currency: self.display.default_currency.trim().to_ascii_uppercase(),
        })
    }
}

fn read_path(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&s)?)
}

/// Parses and validates a config from a TOML string. No environment overrides.
pub fn load_config_str(s: &str) -> Result<DashboardConfig, ConfigError> {
    let config: DashboardConfig = toml::from_str(s)?;
    config.validate()?;
    Ok(config)
}

/// Parses and validates a config file. No environment overrides.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<DashboardConfig, ConfigError> {
    let config = read_path(path.as_ref())?;
    config.validate()?;
    Ok(config)
}
