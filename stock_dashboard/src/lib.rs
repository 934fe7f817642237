//! Stock dashboard pipeline: fetch, normalize, metrics, moving averages, render.
//!
//! The pipeline stages ([`normalize`], [`metrics`], [`indicators`]) are pure
//! functions over a [`series::Series`]. [`refresh::Dashboard`] wires them to a
//! [`market_data_ingestor::providers::DataProvider`] and [`report`] turns the
//! result into text or JSON.

pub mod chart;
pub mod cli;
pub mod config;
pub mod indicators;
pub mod metrics;
pub mod normalize;
pub mod refresh;
pub mod report;
pub mod request;
pub mod series;
pub mod tz;
