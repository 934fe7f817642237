//! Yahoo Finance `v8/finance/chart` provider.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{YahooChartConfig, YahooChartProvider};
