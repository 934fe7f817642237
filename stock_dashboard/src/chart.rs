//! Plotly-compatible figure description.
//!
//! The figure is plain data: serialize it with `serde_json` and hand it to
//! `Plotly.newPlot(div, fig.data, fig.layout)` or any other consumer.

use serde::Serialize;

use crate::{
    indicators::IndicatorSeries,
    request::{ChartType, DashboardRequest},
    series::{self, Series},
};

pub const FIGURE_HEIGHT: u32 = 600;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(LineTrace),
    Candlestick(CandlestickTrace),
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Scatter(t) => &t.name,
            Trace::Candlestick(t) => &t.name,
        }
    }
}

/// A `scatter` trace drawn as a line. Gaps are `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTrace {
    pub name: String,
    pub mode: &'static str,
    pub x: Vec<String>,
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlestickTrace {
    pub name: String,
    pub x: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

fn line(name: impl Into<String>, x: &[String], y: Vec<Option<f64>>) -> Trace {
    Trace::Scatter(LineTrace {
        name: name.into(),
        mode: "lines",
        x: x.to_vec(),
        y,
    })
}

/// Price trace plus one line per indicator, all on the same time axis.
pub fn build_figure(
    request: &DashboardRequest,
    series: &Series,
    indicators: &[IndicatorSeries],
    currency: &str,
) -> Figure {
    let x: Vec<String> = series
        .bars
        .iter()
        .map(|b| series::format_timestamp(&b.timestamp))
        .collect();

    let mut data = Vec::with_capacity(1 + indicators.len());
    data.push(match request.chart_type {
        ChartType::Line => line(
            series::CLOSE,
            &x,
            series.bars.iter().map(|b| Some(b.close)).collect(),
        ),
        ChartType::Candlestick => Trace::Candlestick(CandlestickTrace {
            name: request.ticker().to_string(),
            x: x.clone(),
            open: series.bars.iter().map(|b| b.open).collect(),
            high: series.bars.iter().map(|b| b.high).collect(),
            low: series.bars.iter().map(|b| b.low).collect(),
            close: series.closes(),
        }),
    });
    for ind in indicators {
        data.push(line(ind.display_name(), &x, ind.values.clone()));
    }

    Figure {
        data,
        layout: Layout {
            title: Title {
                text: format!("{} {} Chart", request.ticker(), request.period.label()),
            },
            xaxis: Axis {
                title: Title {
                    text: "Date".to_string(),
                },
                rangeslider: Some(RangeSlider { visible: false }),
            },
            yaxis: Axis {
                title: Title {
                    text: format!("Price ({currency})"),
                },
                rangeslider: None,
            },
            height: FIGURE_HEIGHT,
        },
    }
}
